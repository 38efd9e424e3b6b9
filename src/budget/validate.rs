use crate::error::{BudgetError, Result};

pub const AMOUNT_REQUIRED: &str = "Amount is required";
pub const AMOUNT_NOT_A_NUMBER: &str = "Enter a valid number";
pub const AMOUNT_NOT_POSITIVE: &str = "Amount must be greater than 0";
pub const AMOUNT_TOO_LARGE: &str = "Amount is too large";

/// Largest amount a single entry may carry. Keeps every total finite.
pub const MAX_AMOUNT: f64 = 1e12;

/// Parse user input into an amount, rejecting empty, non-numeric, non-positive
/// and oversized values.
pub fn parse_amount(input: &str) -> Result<f64> {
    let input = input.trim();
    if input.is_empty() {
        return Err(BudgetError::Validation(AMOUNT_REQUIRED.into()));
    }
    let parsed: f64 = input
        .parse()
        .map_err(|_| BudgetError::Validation(AMOUNT_NOT_A_NUMBER.into()))?;
    validate_amount(parsed)
}

/// Check an already-parsed amount.
pub fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() {
        return Err(BudgetError::Validation(AMOUNT_NOT_A_NUMBER.into()));
    }
    if amount <= 0.0 {
        return Err(BudgetError::Validation(AMOUNT_NOT_POSITIVE.into()));
    }
    if amount > MAX_AMOUNT {
        return Err(BudgetError::Validation(AMOUNT_TOO_LARGE.into()));
    }
    Ok(amount)
}
