use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::MortgageCalcError;
use crate::mortgage::schedule::RoundingMode;
use crate::time_value;
use crate::types::{round_currency, with_metadata, ComputationOutput, Money, Rate, MAX_AMOUNT};
use crate::MortgageCalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Payments per year; all loans are monthly-pay.
pub const PAYMENTS_PER_YEAR: u32 = 12;

/// Share of the original principal left outstanding at maturity on a
/// balloon loan unless the caller says otherwise.
pub const DEFAULT_BALLOON_FRACTION: Rate = dec!(0.7);

fn default_balloon_fraction() -> Rate {
    DEFAULT_BALLOON_FRACTION
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Repayment profile of a loan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    /// Level payment that fully amortises the principal over the term
    #[default]
    Standard,
    /// Interest is paid every month; principal is never reduced
    InterestOnly,
    /// Level payment sized to leave `balloon_fraction` of principal due at maturity
    Balloon,
}

/// Validated description of a single loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanParameters {
    /// Amount borrowed
    pub principal: Money,
    /// Nominal annual rate (e.g. 0.0575 = 5.75%), compounded monthly
    pub annual_rate: Rate,
    /// Loan term in whole years
    pub term_years: u32,
    #[serde(default)]
    pub payment_type: PaymentType,
    /// Fraction of principal due at term end (Balloon only)
    #[serde(default = "default_balloon_fraction")]
    pub balloon_fraction: Rate,
    /// Loan start date; the first payment falls one month later
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub rounding: RoundingMode,
}

/// Payment sizing for a single loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutput {
    /// Unrounded level payment
    pub monthly_payment: Money,
    /// Level payment rounded to cents, as billed
    pub monthly_payment_rounded: Money,
    pub num_payments: u32,
    pub balloon_payment: Money,
    /// Level payments over the term plus any balloon
    pub total_of_payments: Money,
}

impl LoanParameters {
    pub fn new(principal: Money, annual_rate: Rate, term_years: u32, payment_type: PaymentType) -> Self {
        LoanParameters {
            principal,
            annual_rate,
            term_years,
            payment_type,
            balloon_fraction: DEFAULT_BALLOON_FRACTION,
            start_date: None,
            rounding: RoundingMode::default(),
        }
    }

    pub fn with_balloon_fraction(mut self, balloon_fraction: Rate) -> Self {
        self.balloon_fraction = balloon_fraction;
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    /// Reject out-of-domain values before any computation starts.
    pub fn validate(&self) -> MortgageCalcResult<()> {
        validate_loan_terms(
            self.principal,
            self.annual_rate,
            self.term_years,
            self.payment_type,
            self.balloon_fraction,
        )
    }

    pub fn monthly_rate(&self) -> Rate {
        self.annual_rate / Decimal::from(PAYMENTS_PER_YEAR)
    }

    /// Total number of monthly payments (term_years × 12).
    pub fn num_payments(&self) -> u32 {
        self.term_years.saturating_mul(PAYMENTS_PER_YEAR)
    }

    /// Amount due at maturity on top of the last regular payment.
    pub fn balloon_amount(&self) -> Money {
        match self.payment_type {
            PaymentType::Balloon => self.balloon_fraction * self.principal,
            PaymentType::Standard | PaymentType::InterestOnly => Decimal::ZERO,
        }
    }

    /// Unrounded level monthly payment for this loan.
    pub fn monthly_payment(&self) -> MortgageCalcResult<Money> {
        monthly_payment(
            self.principal,
            self.annual_rate,
            self.term_years,
            self.payment_type,
            self.balloon_fraction,
        )
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Monthly payment for a loan of the given type.
///
/// - Standard: `r·L / (1 − (1+r)^−n)`, or `L/n` at a zero rate.
/// - InterestOnly: `L·r`.
/// - Balloon: the annuity payment whose balance after `n` payments is
///   `balloon_fraction × L`.
///
/// The result is not rounded; callers decide on currency precision.
pub fn monthly_payment(
    principal: Money,
    annual_rate: Rate,
    term_years: u32,
    payment_type: PaymentType,
    balloon_fraction: Rate,
) -> MortgageCalcResult<Money> {
    validate_loan_terms(principal, annual_rate, term_years, payment_type, balloon_fraction)?;

    let r = annual_rate / Decimal::from(PAYMENTS_PER_YEAR);
    let n = term_years * PAYMENTS_PER_YEAR;

    match payment_type {
        PaymentType::Standard => time_value::pmt(r, n, -principal, Decimal::ZERO),
        PaymentType::InterestOnly => Ok(principal * annual_rate / Decimal::from(PAYMENTS_PER_YEAR)),
        PaymentType::Balloon => time_value::pmt(r, n, -principal, balloon_fraction * principal),
    }
}

/// Size the monthly payment for a loan and report term totals.
pub fn calculate_payment(params: &LoanParameters) -> MortgageCalcResult<ComputationOutput<PaymentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let payment = params.monthly_payment()?;
    let num_payments = params.num_payments();
    let balloon_payment = params.balloon_amount();

    if params.payment_type == PaymentType::InterestOnly {
        warnings.push(format!(
            "Interest-only: principal of {} is still owed after payment {num_payments}",
            round_currency(params.principal)
        ));
    }

    let output = PaymentOutput {
        monthly_payment: payment,
        monthly_payment_rounded: round_currency(payment),
        num_payments,
        balloon_payment,
        total_of_payments: payment * Decimal::from(num_payments) + balloon_payment,
    };

    let methodology = match params.payment_type {
        PaymentType::Standard => "Level Annuity Payment",
        PaymentType::InterestOnly => "Interest-Only Payment",
        PaymentType::Balloon => "Balloon Annuity Payment",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, params, warnings, elapsed, output))
}

/// Outstanding balance after `payments_made` level payments, in closed form.
pub fn remaining_balance(params: &LoanParameters, payments_made: u32) -> MortgageCalcResult<Money> {
    params.validate()?;
    if payments_made > params.num_payments() {
        return Err(MortgageCalcError::invalid(
            "payments_made",
            format!(
                "{payments_made} exceeds the {} payments in the loan term",
                params.num_payments()
            ),
        ));
    }

    match params.payment_type {
        PaymentType::InterestOnly => Ok(params.principal),
        PaymentType::Standard | PaymentType::Balloon => {
            let payment = params.monthly_payment()?;
            time_value::fv(params.monthly_rate(), payments_made, payment, -params.principal)
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Longest term accepted; keeps the compound factor inside decimal range.
const MAX_TERM_YEARS: u32 = 100;

pub(crate) fn validate_loan_terms(
    principal: Money,
    annual_rate: Rate,
    term_years: u32,
    payment_type: PaymentType,
    balloon_fraction: Rate,
) -> MortgageCalcResult<()> {
    if principal <= Decimal::ZERO {
        return Err(MortgageCalcError::invalid("principal", "Principal must be positive"));
    }
    if principal > MAX_AMOUNT {
        return Err(MortgageCalcError::invalid(
            "principal",
            format!("Principal cannot exceed {MAX_AMOUNT}"),
        ));
    }
    validate_rate_and_term("annual_rate", annual_rate, "term_years", term_years)?;
    if payment_type == PaymentType::Balloon
        && (balloon_fraction < Decimal::ZERO || balloon_fraction > Decimal::ONE)
    {
        return Err(MortgageCalcError::invalid(
            "balloon_fraction",
            "Balloon fraction must be between 0 and 1",
        ));
    }
    Ok(())
}

pub(crate) fn validate_rate_and_term(
    rate_field: &str,
    annual_rate: Rate,
    term_field: &str,
    term_years: u32,
) -> MortgageCalcResult<()> {
    if annual_rate < Decimal::ZERO {
        return Err(MortgageCalcError::invalid(rate_field, "Interest rate cannot be negative"));
    }
    if annual_rate >= Decimal::ONE {
        return Err(MortgageCalcError::invalid(
            rate_field,
            "Interest rate must be below 100% (enter 0.0575 for 5.75%)",
        ));
    }
    if term_years == 0 {
        return Err(MortgageCalcError::invalid(term_field, "Loan term must be at least 1 year"));
    }
    if term_years > MAX_TERM_YEARS {
        return Err(MortgageCalcError::invalid(
            term_field,
            format!("Loan term cannot exceed {MAX_TERM_YEARS} years"),
        ));
    }
    let monthly_rate = annual_rate / Decimal::from(PAYMENTS_PER_YEAR);
    if time_value::compound_factor(monthly_rate, term_years * PAYMENTS_PER_YEAR).is_err() {
        return Err(MortgageCalcError::invalid(
            term_field,
            format!("Interest compounded over {term_years} years at {annual_rate} is too large to represent"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
