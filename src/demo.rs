//! Demo data: a month of realistic transactions for one user, and removal of
//! that user's data again.
//!
//! Both operations run inside a single SQLite transaction, so a failure
//! part way through leaves the database untouched.

use std::collections::HashMap;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};
use time::{Date, Weekday};

use crate::{
    Error, PasswordHash,
    category::{CategoryId, CategoryName, create_category, get_all_categories},
    money::Amount,
    period::{format_date, resolve_month},
    transaction::{NewTransaction, TransactionType, create_transaction},
    user::{UserID, create_user, find_user_by_email, update_credentials},
    validation,
};

pub const DEFAULT_DEMO_EMAIL: &str = "demo@bb.local";
pub const DEFAULT_DEMO_PASSWORD: &str = "password";
pub const DEFAULT_DEMO_DISPLAY_NAME: &str = "Demo User";

/// The categories every demo user gets, with their colours.
pub const DEMO_CATEGORIES: [(&str, &str); 15] = [
    ("Rent", "#EF4444"),
    ("Utilities", "#3B82F6"),
    ("Groceries", "#10B981"),
    ("Dining", "#F59E0B"),
    ("Transport", "#64748B"),
    ("Shopping", "#8B5CF6"),
    ("Healthcare", "#DC2626"),
    ("Entertainment", "#22C55E"),
    ("Travel", "#06B6D4"),
    ("Subscriptions", "#0EA5E9"),
    ("Salary", "#22C55E"),
    ("Freelance", "#84CC16"),
    ("Car Repair", "#7C3AED"),
    ("Gifts", "#F472B6"),
    ("Misc", "#94A3B8"),
];

const INCOME_CATEGORIES: [&str; 2] = ["Salary", "Freelance"];

const PAYEES: [&str; 20] = [
    "Market",
    "Supermart",
    "Corner Shop",
    "Bistro",
    "Cafe",
    "Restaurant",
    "Rideshare",
    "Fuel Station",
    "Pharmacy",
    "Cinema",
    "Streaming",
    "Gym",
    "Bookstore",
    "Electronics",
    "Hardware",
    "Online Shop",
    "Bakery",
    "Deli",
    "Hotel",
    "Airline",
];

const RENT_DAY: u8 = 3;
const UTILITIES_DAY: u8 = 10;
const SUBSCRIPTIONS_DAY: u8 = 5;

/// What to seed and for whom.
#[derive(Debug, Clone, Copy)]
pub struct SeedOptions<'a> {
    /// The month to fill, as `YYYY-MM`.
    pub month: &'a str,
    /// The email of the demo user.
    pub email: &'a str,
    /// Sets the password of a new user, or replaces the password of an
    /// existing one. New users get [DEFAULT_DEMO_PASSWORD] when this is `None`.
    pub password: Option<&'a str>,
    /// The display name given to a newly created user.
    pub display_name: &'a str,
    /// Delete the user's transactions in the month before inserting.
    pub clear: bool,
    /// The bcrypt cost for hashing the password.
    pub password_cost: u32,
}

/// The result of [seed_month], printed as JSON by the `seed_month` binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    /// Always `true`; failures are reported as errors.
    pub ok: bool,
    /// The seeded month, as `YYYY-MM`.
    pub month: String,
    /// The email of the demo user.
    pub user: String,
    /// The ID of the demo user.
    pub user_id: i64,
    /// How many transactions were inserted.
    pub inserted: usize,
    /// The first and last day of the month.
    pub range: [String; 2],
}

/// The number of rows [purge_demo] deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PurgeCounts {
    /// Deleted transactions.
    pub transactions: usize,
    /// Deleted categories.
    pub categories: usize,
}

/// The result of [purge_demo], printed as JSON by the `purge_demo` binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    /// Always `true`; failures are reported as errors.
    pub ok: bool,
    /// The email that was looked up.
    pub email: String,
    /// The ID of the user, if one has the email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// What was deleted, if the user exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purged: Option<PurgeCounts>,
    /// Set when there was no user to purge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Fill one month with pseudo-random demo transactions for the user with
/// `options.email`, creating the user and the [DEMO_CATEGORIES] as needed.
///
/// The transactions only depend on the month and the email, so seeding the
/// same month twice with `clear` produces the same data.
///
/// # Errors
///
/// Returns [Error::InvalidPeriod] for a bad month, [Error::Validation] for a
/// bad email, or an error if hashing or any query fails.
pub fn seed_month(options: SeedOptions, connection: &mut Connection) -> Result<SeedSummary, Error> {
    let date_range = resolve_month(Some(options.month))?;
    if !validation::email(options.email) {
        return Err(Error::Validation("Invalid email".to_owned()));
    }

    let transaction = connection.transaction()?;

    let user_id = ensure_user(&options, &transaction)?;
    let category_ids = ensure_demo_categories(user_id, &transaction)?;

    if options.clear {
        let deleted = transaction.execute(
            "DELETE FROM \"transaction\" WHERE user_id = ?1 AND txn_date >= ?2 AND txn_date < ?3",
            (user_id.as_i64(), date_range.from, date_range.to),
        )?;
        tracing::info!("cleared {deleted} transactions in {}", options.month);
    }

    let mut rng = StdRng::seed_from_u64(seed_for(options.month, options.email));
    let mut inserted = 0;
    for date in date_range.days() {
        for new_transaction in demo_transactions_for_day(date, &category_ids, &mut rng)? {
            create_transaction(user_id, &new_transaction, &transaction)?;
            inserted += 1;
        }
    }

    transaction.commit()?;

    let last_day = date_range.to.previous_day().unwrap_or(date_range.from);

    Ok(SeedSummary {
        ok: true,
        month: options.month.to_owned(),
        user: options.email.to_owned(),
        user_id: user_id.as_i64(),
        inserted,
        range: [format_date(date_range.from), format_date(last_day)],
    })
}

/// Delete all transactions and then all categories of the user with `email`.
///
/// A missing user is not an error: the summary says there was nothing to
/// purge.
///
/// # Errors
///
/// Returns an error if any query fails.
pub fn purge_demo(email: &str, connection: &mut Connection) -> Result<PurgeSummary, Error> {
    let transaction = connection.transaction()?;

    let Some(user) = find_user_by_email(email, &transaction)? else {
        return Ok(PurgeSummary {
            ok: true,
            email: email.to_owned(),
            user_id: None,
            purged: None,
            message: Some("user not found; nothing to purge"),
        });
    };

    let transactions = transaction.execute(
        "DELETE FROM \"transaction\" WHERE user_id = ?1",
        [user.id.as_i64()],
    )?;
    let categories =
        transaction.execute("DELETE FROM category WHERE user_id = ?1", [user.id.as_i64()])?;

    transaction.commit()?;

    Ok(PurgeSummary {
        ok: true,
        email: email.to_owned(),
        user_id: Some(user.id.as_i64()),
        purged: Some(PurgeCounts {
            transactions,
            categories,
        }),
        message: None,
    })
}

fn ensure_user(options: &SeedOptions, connection: &Connection) -> Result<UserID, Error> {
    match find_user_by_email(options.email, connection)? {
        Some(user) => {
            if let Some(password) = options.password {
                let password_hash = PasswordHash::from_raw_password(password, options.password_cost)?;
                update_credentials(
                    user.id,
                    &password_hash,
                    user.display_name.as_deref(),
                    connection,
                )?;
            }

            Ok(user.id)
        }
        None => {
            let password = options.password.unwrap_or(DEFAULT_DEMO_PASSWORD);
            let password_hash = PasswordHash::from_raw_password(password, options.password_cost)?;
            let user = create_user(
                options.email,
                password_hash,
                Some(options.display_name),
                connection,
            )?;

            Ok(user.id)
        }
    }
}

fn ensure_demo_categories(
    user_id: UserID,
    connection: &Connection,
) -> Result<HashMap<&'static str, CategoryId>, Error> {
    let existing: HashMap<String, CategoryId> = get_all_categories(user_id, connection)?
        .into_iter()
        .map(|category| (category.name.as_ref().to_owned(), category.id))
        .collect();

    let mut category_ids = HashMap::new();
    for (name, color_hex) in DEMO_CATEGORIES {
        let id = match existing.get(name) {
            Some(id) => *id,
            None => {
                create_category(
                    user_id,
                    CategoryName::new_unchecked(name),
                    Some(color_hex.to_owned()),
                    connection,
                )?
                .id
            }
        };
        category_ids.insert(name, id);
    }

    Ok(category_ids)
}

fn seed_for(month: &str, email: &str) -> u64 {
    let digest = Sha256::digest(format!("{month}|{email}"));
    let mut bytes = [0; 8];
    bytes.copy_from_slice(&digest[..8]);

    u64::from_le_bytes(bytes)
}

/// A random amount between `min` and `max` whole currency units.
fn random_amount(rng: &mut StdRng, min: i64, max: i64) -> Amount {
    Amount::from_cents(rng.gen_range(min * 100..=max * 100))
}

/// The typical cost range of an everyday expense in `category`.
fn everyday_range(category: &str) -> (i64, i64) {
    match category {
        "Groceries" => (20, 120),
        "Dining" => (10, 80),
        "Transport" => (5, 40),
        "Shopping" => (15, 200),
        "Healthcare" => (10, 180),
        "Entertainment" => (8, 60),
        "Travel" => (50, 400),
        "Car Repair" => (80, 600),
        "Gifts" => (10, 150),
        _ => (5, 120),
    }
}

fn demo_transactions_for_day(
    date: Date,
    category_ids: &HashMap<&'static str, CategoryId>,
    rng: &mut StdRng,
) -> Result<Vec<NewTransaction>, Error> {
    let category = |name: &str| {
        category_ids
            .get(name)
            .copied()
            .ok_or_else(|| Error::Internal(format!("demo category {name} is missing")))
    };
    let entry = |category_id, transaction_type, amount, payee: &str, note: &str| NewTransaction {
        category_id: Some(category_id),
        transaction_type,
        amount,
        currency: "USD".to_owned(),
        txn_date: date,
        payee: Some(payee.to_owned()),
        note: Some(note.to_owned()),
    };

    let mut entries = Vec::new();
    let day = date.day();

    if day == 1 || day == 15 {
        let amount = random_amount(rng, 3800, 4300);
        entries.push(entry(category("Salary")?, TransactionType::Income, amount, "Employer", "Salary"));
    }

    if rng.gen_range(1..=60) == 1 {
        let amount = random_amount(rng, 400, 1800);
        entries.push(entry(
            category("Freelance")?,
            TransactionType::Income,
            amount,
            "Client",
            "Freelance payment",
        ));
    }

    if day == RENT_DAY {
        let amount = random_amount(rng, 1400, 1700);
        entries.push(entry(category("Rent")?, TransactionType::Expense, amount, "Landlord", "Monthly rent"));
    }

    if day.abs_diff(UTILITIES_DAY) <= 2 {
        let amount = random_amount(rng, 90, 220);
        entries.push(entry(
            category("Utilities")?,
            TransactionType::Expense,
            amount,
            "Utility Co",
            "Utilities",
        ));
    }

    if day == SUBSCRIPTIONS_DAY {
        let amount = random_amount(rng, 15, 45);
        entries.push(entry(
            category("Subscriptions")?,
            TransactionType::Expense,
            amount,
            "Various subs",
            "Subscriptions",
        ));
    }

    let everyday_categories: Vec<&str> = DEMO_CATEGORIES
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| !INCOME_CATEGORIES.contains(name))
        .collect();

    for _ in 0..rng.gen_range(1..=5) {
        let Some(&name) = everyday_categories.choose(rng) else {
            break;
        };
        let (min, max) = everyday_range(name);
        let amount = random_amount(rng, min, max);
        let payee = PAYEES.choose(rng).copied().unwrap_or("Market");
        entries.push(entry(category(name)?, TransactionType::Expense, amount, payee, name));
    }

    let is_weekend = matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday);
    if is_weekend && rng.gen_range(1..=3) == 1 {
        let amount = random_amount(rng, 15, 120);
        entries.push(entry(
            category("Entertainment")?,
            TransactionType::Expense,
            amount,
            "Cinema/Bar",
            "Weekend fun",
        ));
    }

    Ok(entries)
}
