use std::error::Error;

use clap::Parser;
use rusqlite::Connection;

use budget_buddy::{DEFAULT_DEMO_EMAIL, initialize_db, purge_demo};

/// Delete a demo user's transactions and categories.
///
/// The user itself is kept so that it can be seeded again.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    /// The email of the demo user.
    #[arg(long, default_value = DEFAULT_DEMO_EMAIL)]
    email: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut connection = Connection::open(&args.db_path)?;
    initialize_db(&connection)?;

    let summary = purge_demo(&args.email, &mut connection)?;
    println!("{}", serde_json::to_string(&summary)?);

    Ok(())
}
