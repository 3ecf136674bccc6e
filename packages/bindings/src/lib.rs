use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use mortgage_calc_core::mortgage::{affordability, comparison, loan, schedule, summary};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Payment & schedule
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_payment(input_json: String) -> NapiResult<String> {
    let input: loan::LoanParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan::calculate_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: loan::LoanParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = schedule::build_amortization_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Outstanding balance after `payments_made` payments, as a decimal string.
#[napi]
pub fn remaining_balance(input_json: String, payments_made: u32) -> NapiResult<String> {
    let input: loan::LoanParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let balance: Decimal = loan::remaining_balance(&input, payments_made).map_err(to_napi_error)?;
    Ok(balance.to_string())
}

// ---------------------------------------------------------------------------
// Affordability
// ---------------------------------------------------------------------------

#[napi]
pub fn max_affordable_loan(input_json: String) -> NapiResult<String> {
    let input: affordability::AffordabilityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = affordability::max_affordable_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Purchase summary & comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn mortgage_summary(input_json: String) -> NapiResult<String> {
    let input: summary::MortgageSummaryInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = summary::calculate_mortgage_summary(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_loans(input_json: String) -> NapiResult<String> {
    let input: comparison::LoanComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::compare_loans(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
