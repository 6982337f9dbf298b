//! Aggregation queries over the transaction table.
//!
//! Rows are fetched with SQL and summed in Rust with [Decimal] arithmetic.
//! An empty transaction set gives empty lists and zero totals.

use std::collections::{BTreeMap, HashMap};

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Month};

use crate::{
    Error,
    amount::{is_expense, is_income, read_amount},
    auth::UserID,
    database_id::CategoryId,
    summary::{CategorySpending, MonthlyTotals, RecentTransaction, Totals},
    timestamp::{end_of_day, format_timestamp, read_timestamp, start_of_day},
};

/// The user's latest `limit` transactions, newest first.
///
/// Transactions with the same date are ordered by newest ID first.
pub fn recent_transactions(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<RecentTransaction>, Error> {
    connection
        .prepare(
            "SELECT t.description, t.amount, t.date, c.name
             FROM \"transaction\" t
             LEFT JOIN category c ON c.id = t.category_id
             WHERE t.user_id = ?1
             ORDER BY t.date DESC, t.id DESC
             LIMIT ?2",
        )?
        .query_map((user_id.as_i64(), limit), |row| {
            Ok(RecentTransaction {
                description: row.get(0)?,
                amount: read_amount(row, 1)?,
                date: read_timestamp(row, 2)?,
                category_name: row.get(3)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// Income and expense per month of `year` for the user, sorted by month.
///
/// Months without transactions are left out rather than filled with zeros.
///
/// # Errors
///
/// Returns [Error::InvalidYear] if `year` or the year after it cannot be
/// represented as a date.
pub fn monthly_summary(
    user_id: UserID,
    year: i32,
    connection: &Connection,
) -> Result<Vec<MonthlyTotals>, Error> {
    let first_day = |year: i32| Date::from_calendar_date(year, Month::January, 1).ok();
    let (Some(year_start), Some(next_year_start)) =
        (first_day(year), year.checked_add(1).and_then(first_day))
    else {
        return Err(Error::InvalidYear(year));
    };
    let year_start = format_timestamp(start_of_day(year_start));
    let next_year_start = format_timestamp(start_of_day(next_year_start));

    let mut months: BTreeMap<u8, MonthlyTotals> = BTreeMap::new();

    let mut statement = connection.prepare(
        "SELECT amount, date FROM \"transaction\"
         WHERE user_id = ?1 AND date >= ?2 AND date < ?3",
    )?;
    let rows = statement.query_map(
        (user_id.as_i64(), &year_start, &next_year_start),
        |row| Ok((read_amount(row, 0)?, read_timestamp(row, 1)?)),
    )?;

    for row in rows {
        let (amount, date) = row?;
        let month = u8::from(date.month());
        let totals = months.entry(month).or_insert_with(|| MonthlyTotals {
            month,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        });

        if is_income(&amount) {
            totals.income += amount;
        } else if is_expense(&amount) {
            totals.expense += amount.abs();
        }
    }

    Ok(months.into_values().collect())
}

/// Income, expense and net over every transaction dated from `start`
/// 00:00:00 to `end` 23:59:59, both inclusive.
///
/// This covers all users' transactions.
///
/// # Errors
///
/// Returns an [Error::InvalidDateRange] if `start` is after `end`.
pub fn totals(start: Date, end: Date, connection: &Connection) -> Result<Totals, Error> {
    if start > end {
        return Err(Error::InvalidDateRange { start, end });
    }

    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;

    let mut statement =
        connection.prepare("SELECT amount FROM \"transaction\" WHERE date BETWEEN ?1 AND ?2")?;
    let amounts = statement.query_map(
        (
            format_timestamp(start_of_day(start)),
            format_timestamp(end_of_day(end)),
        ),
        |row| read_amount(row, 0),
    )?;

    for amount in amounts {
        let amount = amount?;

        if is_income(&amount) {
            income += amount;
        } else if is_expense(&amount) {
            expense += amount;
        }
    }

    Ok(Totals {
        income,
        expense,
        net: income + expense,
    })
}

/// The user's `limit` categories with the largest total expense.
///
/// Uncategorised expenses are grouped together with no name. Groups with the
/// same total are ordered by name, with the uncategorised group last.
pub fn top_spending_categories(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<CategorySpending>, Error> {
    let mut groups: HashMap<Option<CategoryId>, CategorySpending> = HashMap::new();

    let mut statement = connection.prepare(
        "SELECT t.category_id, c.name, t.amount
         FROM \"transaction\" t
         LEFT JOIN category c ON c.id = t.category_id
         WHERE t.user_id = ?1",
    )?;
    let rows = statement.query_map((user_id.as_i64(),), |row| {
        Ok((
            row.get::<_, Option<CategoryId>>(0)?,
            row.get::<_, Option<String>>(1)?,
            read_amount(row, 2)?,
        ))
    })?;

    for row in rows {
        let (category_id, category_name, amount) = row?;

        if !is_expense(&amount) {
            continue;
        }

        groups
            .entry(category_id)
            .or_insert_with(|| CategorySpending {
                category_name,
                total: Decimal::ZERO,
            })
            .total += amount;
    }

    let mut ranked: Vec<CategorySpending> = groups.into_values().collect();
    ranked.sort_by(|a, b| {
        a.total.cmp(&b.total).then_with(|| {
            match (&a.category_name, &b.category_name) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        })
    });
    ranked.truncate(limit as usize);

    Ok(ranked)
}

/// The years in which the user has at least one transaction, newest first.
pub fn distinct_transaction_years(user_id: UserID, connection: &Connection) -> Result<Vec<i32>, Error> {
    connection
        .prepare(
            "SELECT DISTINCT CAST(substr(date, 1, 4) AS INTEGER) AS year
             FROM \"transaction\"
             WHERE user_id = ?1
             ORDER BY year DESC",
        )?
        .query_map((user_id.as_i64(),), |row| row.get(0))?
        .map(|maybe_year| maybe_year.map_err(Error::from))
        .collect()
}
