//! Purchase-level payment summary: loan sizing from price and down
//! payment, then principal & interest plus escrow, PMI and closing costs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::MortgageCalcError;
use crate::mortgage::loan::{LoanParameters, PaymentType, DEFAULT_BALLOON_FRACTION, PAYMENTS_PER_YEAR};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, MAX_AMOUNT};
use crate::MortgageCalcResult;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_balloon_fraction() -> Rate {
    DEFAULT_BALLOON_FRACTION
}

fn default_pmi_rate() -> Rate {
    dec!(0.005)
}

fn default_pmi_threshold() -> Rate {
    dec!(0.20)
}

fn default_origination_fee_rate() -> Rate {
    dec!(0.01)
}

fn default_other_closing_costs() -> Money {
    dec!(2500)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageSummaryInput {
    pub purchase_price: Money,
    pub down_payment: Money,
    pub annual_rate: Rate,
    pub term_years: u32,
    #[serde(default)]
    pub payment_type: PaymentType,
    #[serde(default = "default_balloon_fraction")]
    pub balloon_fraction: Rate,
    pub annual_property_tax: Money,
    pub annual_insurance: Money,
    /// Annual PMI premium as a fraction of the loan
    #[serde(default = "default_pmi_rate")]
    pub pmi_rate: Rate,
    /// PMI applies while the down payment ratio is below this
    #[serde(default = "default_pmi_threshold")]
    pub pmi_threshold: Rate,
    /// Origination fee as a fraction of the loan
    #[serde(default = "default_origination_fee_rate")]
    pub origination_fee_rate: Rate,
    #[serde(default = "default_other_closing_costs")]
    pub other_closing_costs: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageSummaryOutput {
    pub loan_amount: Money,
    pub down_payment_ratio: Rate,
    /// Annual property tax / purchase price
    pub property_tax_rate: Rate,
    pub monthly_pi: Money,
    pub monthly_property_tax: Money,
    pub monthly_insurance: Money,
    pub pmi_required: bool,
    pub monthly_pmi: Money,
    pub total_monthly_payment: Money,
    /// Lump sum due at maturity (Balloon loans only)
    pub balloon_payment: Money,
    pub total_closing_costs: Money,
}

impl MortgageSummaryInput {
    /// The financed loan (price minus down payment) on this purchase.
    pub fn loan_parameters(&self) -> LoanParameters {
        let mut params = LoanParameters::new(
            self.purchase_price - self.down_payment,
            self.annual_rate,
            self.term_years,
            self.payment_type,
        )
        .with_balloon_fraction(self.balloon_fraction);
        params.start_date = self.start_date;
        params
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Monthly cost breakdown and closing costs for a purchase.
pub fn calculate_mortgage_summary(
    input: &MortgageSummaryInput,
) -> MortgageCalcResult<ComputationOutput<MortgageSummaryOutput>> {
    let start = Instant::now();
    let (output, warnings) = compute_summary(input)?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata("Mortgage Payment Summary", input, warnings, elapsed, output))
}

pub(crate) fn compute_summary(
    input: &MortgageSummaryInput,
) -> MortgageCalcResult<(MortgageSummaryOutput, Vec<String>)> {
    let mut warnings: Vec<String> = Vec::new();
    validate_input(input)?;

    let params = input.loan_parameters();
    let loan_amount = params.principal;
    let monthly_pi = params.monthly_payment()?;

    let months = Decimal::from(PAYMENTS_PER_YEAR);
    let down_payment_ratio = input.down_payment / input.purchase_price;
    let property_tax_rate = input.annual_property_tax / input.purchase_price;
    let monthly_property_tax = input.annual_property_tax / months;
    let monthly_insurance = input.annual_insurance / months;

    let pmi_required = down_payment_ratio < input.pmi_threshold;
    let monthly_pmi = if pmi_required {
        loan_amount * input.pmi_rate / months
    } else {
        Decimal::ZERO
    };

    let total_monthly_payment = monthly_pi + monthly_property_tax + monthly_insurance + monthly_pmi;
    let total_closing_costs = loan_amount * input.origination_fee_rate + input.other_closing_costs;

    if pmi_required {
        warnings.push(format!(
            "Down payment of {}% is below the {}% threshold; PMI added",
            (down_payment_ratio * dec!(100)).round_dp(2).normalize(),
            (input.pmi_threshold * dec!(100)).normalize()
        ));
    }
    if input.payment_type == PaymentType::InterestOnly {
        warnings.push("Interest-only payment does not reduce principal".into());
    }

    tracing::debug!(loan = %loan_amount, pmi_required, "computed mortgage summary");

    Ok((
        MortgageSummaryOutput {
            loan_amount,
            down_payment_ratio,
            property_tax_rate,
            monthly_pi,
            monthly_property_tax,
            monthly_insurance,
            pmi_required,
            monthly_pmi,
            total_monthly_payment,
            balloon_payment: params.balloon_amount(),
            total_closing_costs,
        },
        warnings,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &MortgageSummaryInput) -> MortgageCalcResult<()> {
    if input.purchase_price <= Decimal::ZERO {
        return Err(MortgageCalcError::invalid("purchase_price", "Purchase price must be positive"));
    }
    if input.purchase_price > MAX_AMOUNT {
        return Err(MortgageCalcError::invalid(
            "purchase_price",
            format!("Purchase price cannot exceed {MAX_AMOUNT}"),
        ));
    }
    if input.down_payment < Decimal::ZERO {
        return Err(MortgageCalcError::invalid("down_payment", "Down payment cannot be negative"));
    }
    if input.down_payment >= input.purchase_price {
        return Err(MortgageCalcError::invalid(
            "down_payment",
            "Down payment must be less than the purchase price",
        ));
    }
    for (field, value) in [
        ("annual_property_tax", input.annual_property_tax),
        ("annual_insurance", input.annual_insurance),
        ("other_closing_costs", input.other_closing_costs),
    ] {
        if value < Decimal::ZERO {
            return Err(MortgageCalcError::invalid(field, "Must not be negative"));
        }
        if value > MAX_AMOUNT {
            return Err(MortgageCalcError::invalid(field, format!("Cannot exceed {MAX_AMOUNT}")));
        }
    }
    for (field, value) in [
        ("pmi_rate", input.pmi_rate),
        ("pmi_threshold", input.pmi_threshold),
        ("origination_fee_rate", input.origination_fee_rate),
    ] {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(MortgageCalcError::invalid(field, "Must be between 0 and 1 (enter 0.005 for 0.5%)"));
        }
    }
    input.loan_parameters().validate()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn workbook_input() -> MortgageSummaryInput {
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
    fn test_workbook_defaults() {
        let out = calculate_mortgage_summary(&workbook_input()).unwrap();
        let s = &out.result;
        assert_eq!(s.loan_amount, dec!(240000));
        assert_eq!(s.down_payment_ratio, dec!(0.2));
        assert_eq!(s.property_tax_rate, dec!(0.01));
        assert!((s.monthly_pi - dec!(1400.57)).abs() < dec!(0.01));
        assert_eq!(s.monthly_property_tax, dec!(250));
        assert_eq!(s.monthly_insurance, dec!(100));
        assert!(!s.pmi_required);
        assert_eq!(s.monthly_pmi, Decimal::ZERO);
        assert!((s.total_monthly_payment - dec!(1750.57)).abs() < dec!(0.01));
        assert_eq!(s.balloon_payment, Decimal::ZERO);
        assert_eq!(s.total_closing_costs, dec!(4900));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_pmi_below_threshold() {
        let mut input = workbook_input();
        input.down_payment = dec!(30000);
        let out = calculate_mortgage_summary(&input).unwrap();
        let s = &out.result;
        assert_eq!(s.loan_amount, dec!(270000));
        assert!(s.pmi_required);
        assert_eq!(s.monthly_pmi, dec!(112.5));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_balloon_summary() {
        let mut input = workbook_input();
        input.payment_type = PaymentType::Balloon;
        let s = calculate_mortgage_summary(&input).unwrap().result;
        assert_eq!(s.balloon_payment, dec!(168000));
        assert!((s.monthly_pi - dec!(1225.17)).abs() < dec!(0.01));
    }

    #[test]
    fn test_interest_only_summary() {
        let mut input = workbook_input();
        input.payment_type = PaymentType::InterestOnly;
        let out = calculate_mortgage_summary(&input).unwrap();
        assert_eq!(out.result.monthly_pi, dec!(1150));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_invalid_down_payment() {
        let mut input = workbook_input();
        input.down_payment = dec!(300000);
        assert_eq!(calculate_mortgage_summary(&input).unwrap_err().field(), Some("down_payment"));
        input.down_payment = dec!(-1);
        assert_eq!(calculate_mortgage_summary(&input).unwrap_err().field(), Some("down_payment"));
    }

    #[test]
    fn test_rate_entered_as_percentage_is_rejected() {
        let mut input = workbook_input();
        input.annual_rate = dec!(5.75);
        assert_eq!(calculate_mortgage_summary(&input).unwrap_err().field(), Some("annual_rate"));
    }

    #[test]
    fn test_out_of_range_amounts_are_rejected() {
        let mut input = workbook_input();
        input.annual_property_tax = Decimal::MAX;
        assert_eq!(calculate_mortgage_summary(&input).unwrap_err().field(), Some("annual_property_tax"));

        let mut input = workbook_input();
        input.pmi_rate = dec!(1.5);
        assert_eq!(calculate_mortgage_summary(&input).unwrap_err().field(), Some("pmi_rate"));

        let mut input = workbook_input();
        input.purchase_price = Decimal::MAX;
        input.down_payment = Decimal::MAX - dec!(1000);
        assert_eq!(calculate_mortgage_summary(&input).unwrap_err().field(), Some("purchase_price"));
    }

    #[test]
    fn test_loan_parameters_carry_start_date() {
        let mut input = workbook_input();
        input.start_date = NaiveDate::from_ymd_opt(2025, 6, 1);
        let params = input.loan_parameters();
        assert_eq!(params.principal, dec!(240000));
        assert_eq!(params.start_date, input.start_date);
    }
}
