use std::error::Error;

use clap::Parser;
use rusqlite::Connection;

use budget_buddy::{
    DEFAULT_DEMO_DISPLAY_NAME, DEFAULT_DEMO_EMAIL, PasswordHash, SeedOptions, initialize_db,
    seed_month,
};

/// Seed one month of demo data for a user.
///
/// The user and the demo categories are created if they do not exist yet.
/// Seeding the same month for the same email always produces the same
/// transactions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    /// The month to fill, as YYYY-MM.
    #[arg(long)]
    month: String,

    /// The email of the demo user.
    #[arg(long, default_value = DEFAULT_DEMO_EMAIL)]
    email: String,

    /// Set or overwrite the demo user's password.
    #[arg(long)]
    password: Option<String>,

    /// The display name of a newly created demo user.
    #[arg(long, default_value = DEFAULT_DEMO_DISPLAY_NAME)]
    display: String,

    /// Delete the user's transactions in the month before inserting.
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut connection = Connection::open(&args.db_path)?;
    initialize_db(&connection)?;

    let summary = seed_month(
        SeedOptions {
            month: &args.month,
            email: &args.email,
            password: args.password.as_deref(),
            display_name: &args.display,
            clear: args.clear,
            password_cost: PasswordHash::DEFAULT_COST,
        },
        &mut connection,
    )?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
