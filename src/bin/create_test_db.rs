use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, Time};

use pocketbook::{
    CategoryName, PASSWORD_HASH_COST, PasswordHash, Transaction, create_category,
    create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the JSON API server of pocketbook.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user test@test.com with the password 'test'...");

    let password_hash = PasswordHash::hash_unchecked("test", PASSWORD_HASH_COST)?;
    let user = create_user("test@test.com".parse()?, password_hash, &conn)?;

    println!("Creating categories and transactions...");

    let groceries = create_category(user.id, CategoryName::new("Groceries")?, &conn)?;
    let rent = create_category(user.id, CategoryName::new("Rent")?, &conn)?;
    let wages = create_category(user.id, CategoryName::new("Wages")?, &conn)?;

    let today = OffsetDateTime::now_utc().date();
    for week in 0..52 {
        let date = PrimitiveDateTime::new(today - Duration::weeks(week), Time::MIDNIGHT);

        create_transaction(
            user.id,
            Transaction::build(Decimal::new(-8_550, 2), date, "Supermarket")
                .category_id(Some(groceries.id)),
            &conn,
        )?;
        create_transaction(
            user.id,
            Transaction::build(Decimal::from(-450), date, "Rent").category_id(Some(rent.id)),
            &conn,
        )?;
        create_transaction(
            user.id,
            Transaction::build(Decimal::from(1_200), date, "Pay").category_id(Some(wages.id)),
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
