//! Maximum affordable loan and home price from income and debt-to-income
//! constraints.
//!
//! Two solving methods are offered. `Decoupled` discounts the whole housing
//! budget as if it were all principal and interest, then backs out price,
//! tax and insurance from the resulting loan; the total monthly cost can
//! exceed the budget. `Coupled` treats tax and insurance as the price-linked
//! costs they are and solves
//!
//! ```text
//! budget = price × (1 − down_ratio) × k + price × (tax_rate + insurance_rate) / 12
//! ```
//!
//! where `k` is the level payment per unit of loan, so the total monthly
//! cost equals the budget exactly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::MortgageCalcError;
use crate::mortgage::loan::{validate_rate_and_term, PAYMENTS_PER_YEAR};
use crate::time_value;
use crate::types::{round_currency, with_metadata, ComputationOutput, Money, Rate, MAX_AMOUNT};
use crate::MortgageCalcResult;

/// Housing-cost share of gross income commonly used as the front-end limit.
const DEFAULT_FRONT_END_RATIO: Rate = dec!(0.28);

fn default_front_end_ratio() -> Rate {
    DEFAULT_FRONT_END_RATIO
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How property tax and insurance enter the loan-size solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AffordabilityMethod {
    /// Discount the full budget, then derive tax and insurance from the price
    Decoupled,
    /// Solve price, tax and insurance jointly so the total equals the budget
    #[default]
    Coupled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityInput {
    pub gross_annual_income: Money,
    /// Existing monthly debt service (cards, car loans, etc.)
    pub monthly_debt_payments: Money,
    /// Back-end debt-to-income ceiling (e.g. 0.36)
    pub max_dti_ratio: Rate,
    pub annual_rate: Rate,
    pub term_years: u32,
    /// Annual property tax as a fraction of home price
    pub property_tax_rate: Rate,
    /// Annual homeowners insurance as a fraction of home price
    pub annual_insurance_rate: Rate,
    pub down_payment_ratio: Rate,
    #[serde(default)]
    pub method: AffordabilityMethod,
    /// Front-end housing ratio used for the desired-payment guideline
    #[serde(default = "default_front_end_ratio")]
    pub front_end_ratio: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityResult {
    pub method: AffordabilityMethod,
    /// income / 12 × max DTI − existing debt
    pub housing_budget: Money,
    /// income / 12 × front-end ratio
    pub desired_monthly_payment: Money,
    pub max_loan_amount: Money,
    pub max_home_price: Money,
    pub down_payment_amount: Money,
    pub monthly_pi: Money,
    pub monthly_tax: Money,
    pub monthly_insurance: Money,
    pub total_monthly_payment: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Largest loan and home price the borrower's income supports.
pub fn max_affordable_loan(
    input: &AffordabilityInput,
) -> MortgageCalcResult<ComputationOutput<AffordabilityResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let monthly_income = input.gross_annual_income / Decimal::from(PAYMENTS_PER_YEAR);
    let housing_budget = (monthly_income * input.max_dti_ratio - input.monthly_debt_payments).max(Decimal::ZERO);
    if housing_budget.is_zero() {
        return Err(MortgageCalcError::invalid(
            "monthly_debt_payments",
            format!(
                "Existing debt of {} leaves no housing budget under a {} DTI limit",
                input.monthly_debt_payments, input.max_dti_ratio
            ),
        ));
    }

    let r = input.annual_rate / Decimal::from(PAYMENTS_PER_YEAR);
    let n = input.term_years * PAYMENTS_PER_YEAR;
    let escrow_rate = (input.property_tax_rate + input.annual_insurance_rate) / Decimal::from(PAYMENTS_PER_YEAR);

    tracing::debug!(
        budget = %housing_budget,
        method = ?input.method,
        "solving maximum affordable loan"
    );

    let (max_loan_amount, max_home_price) = match input.method {
        AffordabilityMethod::Decoupled => {
            let loan = time_value::pv(r, n, -housing_budget, Decimal::ZERO)?;
            let price = loan
                .checked_div(Decimal::ONE - input.down_payment_ratio)
                .ok_or_else(|| price_out_of_range(loan))?;
            (loan, price)
        }
        AffordabilityMethod::Coupled => {
            let per_unit = time_value::payment_per_unit(r, n)?;
            let denom = (Decimal::ONE - input.down_payment_ratio) * per_unit + escrow_rate;
            if denom.is_zero() {
                return Err(MortgageCalcError::DivisionByZero {
                    context: "affordability cost per unit of home price".into(),
                });
            }
            let price = housing_budget
                .checked_div(denom)
                .ok_or_else(|| price_out_of_range(housing_budget))?;
            (price * (Decimal::ONE - input.down_payment_ratio), price)
        }
    };

    let down_payment_amount = max_home_price * input.down_payment_ratio;
    let monthly_pi = time_value::pmt(r, n, -max_loan_amount, Decimal::ZERO)?;
    let monthly_tax = max_home_price * input.property_tax_rate / Decimal::from(PAYMENTS_PER_YEAR);
    let monthly_insurance = max_home_price * input.annual_insurance_rate / Decimal::from(PAYMENTS_PER_YEAR);
    let total_monthly_payment = monthly_pi + monthly_tax + monthly_insurance;
    let desired_monthly_payment = monthly_income * input.front_end_ratio;

    if round_currency(total_monthly_payment) > round_currency(housing_budget) {
        warnings.push(format!(
            "Total monthly payment {} exceeds the DTI housing budget {}; tax and insurance were not deducted before sizing the loan",
            round_currency(total_monthly_payment),
            round_currency(housing_budget)
        ));
    }
    if total_monthly_payment > desired_monthly_payment {
        warnings.push(format!(
            "Total monthly payment {} is above the {}% front-end guideline of {}",
            round_currency(total_monthly_payment),
            (input.front_end_ratio * dec!(100)).normalize(),
            round_currency(desired_monthly_payment)
        ));
    }
    if input.down_payment_ratio < dec!(0.20) {
        warnings.push("Down payment below 20%; lenders will usually require PMI".into());
    }

    let output = AffordabilityResult {
        method: input.method,
        housing_budget,
        desired_monthly_payment,
        max_loan_amount,
        max_home_price,
        down_payment_amount,
        monthly_pi,
        monthly_tax,
        monthly_insurance,
        total_monthly_payment,
    };

    let methodology = match input.method {
        AffordabilityMethod::Decoupled => "DTI Affordability (PV of full budget)",
        AffordabilityMethod::Coupled => "DTI Affordability (price-linked tax and insurance)",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn price_out_of_range(amount: Money) -> MortgageCalcError {
    MortgageCalcError::invalid(
        "down_payment_ratio",
        format!("Home price supported by {amount} is too large to represent at this down payment ratio"),
    )
}

fn validate_input(input: &AffordabilityInput) -> MortgageCalcResult<()> {
    if input.gross_annual_income <= Decimal::ZERO {
        return Err(MortgageCalcError::invalid(
            "gross_annual_income",
            "Gross annual income must be positive",
        ));
    }
    if input.gross_annual_income > MAX_AMOUNT {
        return Err(MortgageCalcError::invalid(
            "gross_annual_income",
            format!("Gross annual income cannot exceed {MAX_AMOUNT}"),
        ));
    }
    if input.monthly_debt_payments < Decimal::ZERO {
        return Err(MortgageCalcError::invalid(
            "monthly_debt_payments",
            "Monthly debt payments cannot be negative",
        ));
    }
    if input.max_dti_ratio <= Decimal::ZERO || input.max_dti_ratio > Decimal::ONE {
        return Err(MortgageCalcError::invalid(
            "max_dti_ratio",
            "DTI ratio must be in (0, 1] (enter 0.36 for 36%)",
        ));
    }
    validate_rate_and_term("annual_rate", input.annual_rate, "term_years", input.term_years)?;
    for (field, value) in [
        ("property_tax_rate", input.property_tax_rate),
        ("annual_insurance_rate", input.annual_insurance_rate),
    ] {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(MortgageCalcError::invalid(field, "Must be between 0 and 1 (enter 0.01 for 1%)"));
        }
    }
    if input.down_payment_ratio < Decimal::ZERO || input.down_payment_ratio >= Decimal::ONE {
        return Err(MortgageCalcError::invalid(
            "down_payment_ratio",
            "Down payment ratio must be in [0, 1)",
        ));
    }
    if input.front_end_ratio <= Decimal::ZERO || input.front_end_ratio > Decimal::ONE {
        return Err(MortgageCalcError::invalid("front_end_ratio", "Front-end ratio must be in (0, 1]"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.01);

    fn assert_close(actual: Decimal, expected: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(diff <= TOL, "{msg}: expected ~{expected}, got {actual} (diff = {diff})");
    }

    fn workbook_input(method: AffordabilityMethod) -> AffordabilityInput {
        AffordabilityInput {
            gross_annual_income: dec!(85000),
            monthly_debt_payments: dec!(500),
            max_dti_ratio: dec!(0.36),
            annual_rate: dec!(0.0575),
            term_years: 30,
            property_tax_rate: dec!(0.01),
            annual_insurance_rate: dec!(0.004),
            down_payment_ratio: dec!(0.20),
            method,
            front_end_ratio: dec!(0.28),
        }
    }

    #[test]
    fn test_decoupled_reproduces_workbook() {
        let out = max_affordable_loan(&workbook_input(AffordabilityMethod::Decoupled)).unwrap();
        let r = &out.result;
        assert_close(r.housing_budget, dec!(2050), "budget");
        assert_close(r.max_loan_amount, dec!(351284.33), "loan");
        assert_close(r.max_home_price, dec!(439105.41), "price");
        assert_close(r.down_payment_amount, dec!(87821.08), "down payment");
        assert_close(r.monthly_pi, dec!(2050), "P&I");
        assert_close(r.monthly_tax, dec!(365.92), "tax");
        assert_close(r.monthly_insurance, dec!(146.37), "insurance");
        assert_close(r.total_monthly_payment, dec!(2562.29), "total");
        assert!(out.warnings.iter().any(|w| w.contains("exceeds the DTI housing budget")));
    }

    #[test]
    fn test_coupled_total_equals_budget() {
        let out = max_affordable_loan(&workbook_input(AffordabilityMethod::Coupled)).unwrap();
        let r = &out.result;
        assert_close(r.max_home_price, dec!(351313.17), "price");
        assert_close(r.max_loan_amount, dec!(281050.54), "loan");
        assert_close(r.monthly_pi, dec!(1640.13), "P&I");
        assert_close(r.monthly_tax, dec!(292.76), "tax");
        assert_close(r.total_monthly_payment, r.housing_budget, "total vs budget");
        assert!(!out.warnings.iter().any(|w| w.contains("exceeds the DTI housing budget")));
    }

    #[test]
    fn test_debt_reduces_capacity_below_full_budget_pv() {
        let unconstrained = time_value::pv(dec!(0.0575) / dec!(12), 360, dec!(-2550), Decimal::ZERO).unwrap();
        for method in [AffordabilityMethod::Decoupled, AffordabilityMethod::Coupled] {
            let r = max_affordable_loan(&workbook_input(method)).unwrap().result;
            assert!(r.max_loan_amount > Decimal::ZERO);
            assert!(r.max_loan_amount < unconstrained, "{method:?}");
        }
    }

    #[test]
    fn test_zero_escrow_methods_agree() {
        let mut input = workbook_input(AffordabilityMethod::Decoupled);
        input.property_tax_rate = Decimal::ZERO;
        input.annual_insurance_rate = Decimal::ZERO;
        let decoupled = max_affordable_loan(&input).unwrap().result;
        input.method = AffordabilityMethod::Coupled;
        let coupled = max_affordable_loan(&input).unwrap().result;
        assert_close(decoupled.max_loan_amount, coupled.max_loan_amount, "loan");
        assert_close(decoupled.max_home_price, coupled.max_home_price, "price");
    }

    #[test]
    fn test_zero_rate_affordability() {
        let mut input = workbook_input(AffordabilityMethod::Decoupled);
        input.annual_rate = Decimal::ZERO;
        let r = max_affordable_loan(&input).unwrap().result;
        assert_close(r.max_loan_amount, dec!(2050) * dec!(360), "loan");
    }

    #[test]
    fn test_debt_exhausting_budget_is_rejected() {
        let mut input = workbook_input(AffordabilityMethod::Coupled);
        input.monthly_debt_payments = dec!(2550);
        let err = max_affordable_loan(&input).unwrap_err();
        assert_eq!(err.field(), Some("monthly_debt_payments"));

        input.monthly_debt_payments = dec!(4000);
        assert!(max_affordable_loan(&input).is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        let mut input = workbook_input(AffordabilityMethod::Coupled);
        input.down_payment_ratio = dec!(1);
        assert_eq!(max_affordable_loan(&input).unwrap_err().field(), Some("down_payment_ratio"));

        let mut input = workbook_input(AffordabilityMethod::Coupled);
        input.max_dti_ratio = dec!(36);
        assert_eq!(max_affordable_loan(&input).unwrap_err().field(), Some("max_dti_ratio"));

        let mut input = workbook_input(AffordabilityMethod::Coupled);
        input.gross_annual_income = Decimal::ZERO;
        assert_eq!(max_affordable_loan(&input).unwrap_err().field(), Some("gross_annual_income"));

        let mut input = workbook_input(AffordabilityMethod::Coupled);
        input.annual_rate = dec!(1.2);
        assert_eq!(max_affordable_loan(&input).unwrap_err().field(), Some("annual_rate"));
    }

    #[test]
    fn test_extreme_inputs_are_errors_not_panics() {
        let mut input = workbook_input(AffordabilityMethod::Decoupled);
        input.down_payment_ratio = dec!(0.9999999999999999999999999999);
        assert_eq!(max_affordable_loan(&input).unwrap_err().field(), Some("down_payment_ratio"));

        let mut input = workbook_input(AffordabilityMethod::Coupled);
        input.gross_annual_income = Decimal::MAX;
        assert_eq!(max_affordable_loan(&input).unwrap_err().field(), Some("gross_annual_income"));

        let mut input = workbook_input(AffordabilityMethod::Coupled);
        input.property_tax_rate = dec!(10);
        assert_eq!(max_affordable_loan(&input).unwrap_err().field(), Some("property_tax_rate"));
    }

    #[test]
    fn test_method_defaults_to_coupled() {
        let json = r#"{
            "gross_annual_income": "85000",
            "monthly_debt_payments": "500",
            "max_dti_ratio": "0.36",
            "annual_rate": "0.0575",
            "term_years": 30,
            "property_tax_rate": "0.01",
            "annual_insurance_rate": "0.004",
            "down_payment_ratio": "0.2"
        }"#;
        let input: AffordabilityInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.method, AffordabilityMethod::Coupled);
        assert_eq!(input.front_end_ratio, dec!(0.28));
    }
}
