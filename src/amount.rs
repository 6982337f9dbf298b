//! Exact decimal money amounts stored as SQLite TEXT.
//!
//! Amounts never pass through `f64`. They are written as the string form of
//! [Decimal] and summed in Rust, so aggregates do not drift.

use rusqlite::{Row, types::Type};
use rust_decimal::Decimal;

/// Convert `amount` to the string stored in the database.
pub fn amount_to_sql(amount: &Decimal) -> String {
    amount.normalize().to_string()
}

/// Read an amount written by [amount_to_sql] from column `index`.
pub fn read_amount(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    text.parse::<Decimal>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

/// Whether `amount` counts as income.
pub fn is_income(amount: &Decimal) -> bool {
    amount.is_sign_positive() && !amount.is_zero()
}

/// Whether `amount` counts as an expense.
pub fn is_expense(amount: &Decimal) -> bool {
    amount.is_sign_negative() && !amount.is_zero()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{amount_to_sql, is_expense, is_income};

    #[test]
    fn sign_classifies_amounts() {
        assert!(is_income(&Decimal::new(1, 2)));
        assert!(!is_expense(&Decimal::new(1, 2)));
        assert!(is_expense(&Decimal::new(-4599, 2)));
        assert!(!is_income(&Decimal::new(-4599, 2)));
    }

    #[test]
    fn zero_is_neither_income_nor_expense() {
        let mut negative_zero = Decimal::ZERO;
        negative_zero.set_sign_negative(true);

        assert!(!is_income(&Decimal::ZERO));
        assert!(!is_expense(&Decimal::ZERO));
        assert!(!is_income(&negative_zero));
        assert!(!is_expense(&negative_zero));
    }

    #[test]
    fn sql_text_drops_trailing_zeros() {
        assert_eq!(amount_to_sql(&Decimal::new(-5000, 2)), "-50");
        assert_eq!(amount_to_sql(&Decimal::new(1250, 2)), "12.5");
    }
}
