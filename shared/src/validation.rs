//! Validation utilities for the store operations backend

use rust_decimal::Decimal;

use crate::totals::{max_money, round_money};

// ============================================================================
// Ledger Validations
// ============================================================================

/// Validate an externally assigned product code (barcode, SKU)
pub fn validate_product_code(code: &str) -> Result<(), &'static str> {
    let code = code.trim();
    if code.is_empty() {
        return Err("Product code is required");
    }
    if code.len() > 64 {
        return Err("Product code must be at most 64 characters");
    }
    if code.chars().any(char::is_whitespace) {
        return Err("Product code cannot contain whitespace");
    }
    Ok(())
}

/// Validate a quantity that must be strictly positive
pub fn validate_positive_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than 0");
    }
    Ok(())
}

/// Validate a non-negative monetary amount (price, discount, tax)
pub fn validate_money(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    if amount.scale() > 4 {
        return Err("Amount has too many decimal places");
    }
    if amount > max_money() || round_money(amount) > max_money() {
        return Err("Amount exceeds 9999999999.99");
    }
    Ok(())
}

/// Find the first product code that appears more than once
pub fn find_duplicate_code<'a, I>(codes: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    codes.into_iter().find(|code| !seen.insert(code.trim()))
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_product_code_valid() {
        assert!(validate_product_code("7501031311309").is_ok());
        assert!(validate_product_code("SKU-42").is_ok());
    }

    #[test]
    fn test_validate_product_code_invalid() {
        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code("AB 12").is_err());
        assert!(validate_product_code(&"9".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_positive_quantity() {
        assert!(validate_positive_quantity(1).is_ok());
        assert!(validate_positive_quantity(0).is_err());
        assert!(validate_positive_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_money() {
        assert!(validate_money(Decimal::ZERO).is_ok());
        assert!(validate_money(Decimal::from_str("10.005").unwrap()).is_ok());
        assert!(validate_money(Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(validate_money(Decimal::from_str("1.00001").unwrap()).is_err());
    }

    #[test]
    fn test_validate_money_upper_bound() {
        assert!(validate_money(Decimal::from_str("9999999999.99").unwrap()).is_ok());
        assert!(validate_money(Decimal::from_str("9999999999.995").unwrap()).is_err());
        assert!(validate_money(Decimal::from_str("10000000000").unwrap()).is_err());
        assert!(validate_money(Decimal::from_str("7900000000000000000000000000").unwrap()).is_err());
    }

    #[test]
    fn test_find_duplicate_code() {
        assert_eq!(find_duplicate_code(["A", "B", "A "]), Some("A "));
        assert_eq!(find_duplicate_code(["A", "B"]), None);
    }

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("clerk@store.com").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("clerk").is_err());
        assert!(validate_email("a@b").is_err());
    }
}
