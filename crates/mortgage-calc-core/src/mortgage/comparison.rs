//! Side-by-side comparison of the current loan against alternative
//! rate / term options on the same loan amount.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::MortgageCalcError;
use crate::mortgage::loan::{validate_rate_and_term, PaymentType, PAYMENTS_PER_YEAR};
use crate::mortgage::summary::{compute_summary, MortgageSummaryInput};
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageCalcResult;

const CURRENT_LABEL: &str = "Current";

/// Alternatives offered when the caller supplies none: 15 years at 6% and 30 years at 5.5%.
pub fn default_options() -> Vec<LoanOption> {
    vec![
        LoanOption {
            label: "15-year at 6.00%".into(),
            annual_rate: dec!(0.06),
            term_years: 15,
        },
        LoanOption {
            label: "30-year at 5.50%".into(),
            annual_rate: dec!(0.055),
            term_years: 30,
        },
    ]
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An alternative fully amortising loan on the same amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOption {
    pub label: String,
    pub annual_rate: Rate,
    pub term_years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanComparisonInput {
    /// The loan being considered; its escrow, PMI and closing costs apply to every option
    pub current: MortgageSummaryInput,
    #[serde(default = "default_options")]
    pub options: Vec<LoanOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanComparisonRow {
    pub label: String,
    pub annual_rate: Rate,
    pub term_years: u32,
    pub monthly_pi: Money,
    pub total_monthly_payment: Money,
    pub total_interest: Money,
    /// Interest + loan amount + closing costs
    pub total_cost: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanComparisonOutput {
    pub loan_amount: Money,
    pub rows: Vec<LoanComparisonRow>,
    /// Label of the row with the lowest total cost
    pub lowest_total_cost: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare the current loan with each alternative option.
pub fn compare_loans(
    input: &LoanComparisonInput,
) -> MortgageCalcResult<ComputationOutput<LoanComparisonOutput>> {
    let start = Instant::now();

    for (i, opt) in input.options.iter().enumerate() {
        validate_rate_and_term(
            &format!("options[{i}].annual_rate"),
            opt.annual_rate,
            &format!("options[{i}].term_years"),
            opt.term_years,
        )?;
    }

    let (summary, warnings) = compute_summary(&input.current)?;
    let loan_amount = summary.loan_amount;
    let escrow_and_pmi = summary.monthly_property_tax + summary.monthly_insurance + summary.monthly_pmi;

    // Every row is costed in closed form
    let current_params = input.current.loan_parameters();
    let current_months = Decimal::from(current_params.num_payments());
    let current_interest = match current_params.payment_type {
        PaymentType::Standard => summary.monthly_pi * current_months - loan_amount,
        // Interest on the full principal for every month of the term
        PaymentType::InterestOnly | PaymentType::Balloon => {
            loan_amount * input.current.annual_rate * current_months / Decimal::from(PAYMENTS_PER_YEAR)
        }
    };

    let mut rows = Vec::with_capacity(input.options.len() + 1);
    rows.push(LoanComparisonRow {
        label: CURRENT_LABEL.into(),
        annual_rate: input.current.annual_rate,
        term_years: input.current.term_years,
        monthly_pi: summary.monthly_pi,
        total_monthly_payment: summary.total_monthly_payment,
        total_interest: current_interest,
        total_cost: current_interest + loan_amount + summary.total_closing_costs,
    });

    for opt in &input.options {
        let months = opt.term_years * PAYMENTS_PER_YEAR;
        let monthly_pi = time_value::pmt(
            opt.annual_rate / Decimal::from(PAYMENTS_PER_YEAR),
            months,
            -loan_amount,
            Decimal::ZERO,
        )?;
        let total_interest = monthly_pi * Decimal::from(months) - loan_amount;
        rows.push(LoanComparisonRow {
            label: opt.label.clone(),
            annual_rate: opt.annual_rate,
            term_years: opt.term_years,
            monthly_pi,
            total_monthly_payment: monthly_pi + escrow_and_pmi,
            total_interest,
            total_cost: total_interest + loan_amount + summary.total_closing_costs,
        });
    }

    let lowest_total_cost = rows
        .iter()
        .min_by(|a, b| a.total_cost.cmp(&b.total_cost))
        .map(|r| r.label.clone())
        .ok_or_else(|| MortgageCalcError::invalid("options", "No loans to compare"))?;

    let output = LoanComparisonOutput {
        loan_amount,
        rows,
        lowest_total_cost,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata("Loan Comparison", input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn current() -> MortgageSummaryInput {
        MortgageSummaryInput {
            purchase_price: dec!(300000),
            down_payment: dec!(60000),
            annual_rate: dec!(0.0575),
            term_years: 30,
            payment_type: PaymentType::Standard,
            balloon_fraction: dec!(0.7),
            annual_property_tax: dec!(3000),
            annual_insurance: dec!(1200),
            pmi_rate: dec!(0.005),
            pmi_threshold: dec!(0.20),
            origination_fee_rate: dec!(0.01),
            other_closing_costs: dec!(2500),
            start_date: None,
        }
    }

    #[test]
    fn test_default_workbook_options() {
        let input = LoanComparisonInput {
            current: current(),
            options: default_options(),
        };
        let out = compare_loans(&input).unwrap().result;
        assert_eq!(out.rows.len(), 3);
        assert_eq!(out.rows[0].label, "Current");

        let cur = &out.rows[0];
        assert!((cur.total_interest - dec!(264206.95)).abs() < dec!(0.01), "got {}", cur.total_interest);
        assert_eq!(cur.total_cost, cur.total_interest + dec!(240000) + dec!(4900));

        let fifteen = &out.rows[1];
        assert!((fifteen.monthly_pi - dec!(2025.26)).abs() < dec!(0.01));
        assert!((fifteen.total_monthly_payment - dec!(2375.26)).abs() < dec!(0.01));
        assert!((fifteen.total_interest - dec!(124546.15)).abs() < dec!(0.01));

        let thirty = &out.rows[2];
        assert!((thirty.monthly_pi - dec!(1362.69)).abs() < dec!(0.01));

        assert_eq!(out.lowest_total_cost, "15-year at 6.00%");
    }

    #[test]
    fn test_option_matching_current_terms_costs_the_same() {
        let input = LoanComparisonInput {
            current: current(),
            options: vec![LoanOption {
                label: "same".into(),
                annual_rate: dec!(0.0575),
                term_years: 30,
            }],
        };
        let out = compare_loans(&input).unwrap().result;
        assert_eq!(out.rows[0].monthly_pi, out.rows[1].monthly_pi);
        assert_eq!(out.rows[0].total_interest, out.rows[1].total_interest);
        assert_eq!(out.rows[0].total_cost, out.rows[1].total_cost);
        assert_eq!(out.lowest_total_cost, "Current");
    }

    #[test]
    fn test_interest_only_current_uses_simple_interest() {
        let mut cur = current();
        cur.payment_type = PaymentType::InterestOnly;
        let input = LoanComparisonInput {
            current: cur,
            options: vec![],
        };
        let out = compare_loans(&input).unwrap().result;
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].total_interest, dec!(414000));
        assert_eq!(out.lowest_total_cost, "Current");
    }

    #[test]
    fn test_invalid_option_names_index() {
        let input = LoanComparisonInput {
            current: current(),
            options: vec![LoanOption {
                label: "bad".into(),
                annual_rate: dec!(6),
                term_years: 15,
            }],
        };
        let err = compare_loans(&input).unwrap_err();
        assert_eq!(err.field(), Some("options[0].annual_rate"));
    }

    #[test]
    fn test_options_default_when_omitted() {
        let json = serde_json::json!({
            "current": {
                "purchase_price": "300000",
                "down_payment": "60000",
                "annual_rate": "0.0575",
                "term_years": 30,
                "annual_property_tax": "3000",
                "annual_insurance": "1200"
            }
        });
        let input: LoanComparisonInput = serde_json::from_value(json).unwrap();
        assert_eq!(input.options.len(), 2);
        assert_eq!(input.current.other_closing_costs, dec!(2500));
    }
}
