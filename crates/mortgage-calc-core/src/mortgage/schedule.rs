//! Monthly amortisation schedules.
//!
//! [`generate_schedule`] returns a lazy iterator over exactly
//! `term_years × 12` periods; [`build_amortization_schedule`] collects it and
//! adds loan-level totals inside the usual output envelope.
//!
//! Rounding is controlled by [`RoundingMode`]. Whatever the mode, the final
//! period is reconciled: its principal portion is exactly the balance above
//! the terminal target (zero, or the balloon amount) and its payment is that
//! principal plus the period's interest. Any residual left by rounding is
//! therefore absorbed by the last payment and the loan ends on its target.
//! In `PerPeriod` mode that target is itself rounded to cents.
//!
//! A principal portion never takes the balance past its target. When a
//! rounded-up payment on a very small loan gets there early, that period
//! pays off the remainder and later periods pay only interest on the target.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;
use std::time::Instant;

use crate::error::MortgageCalcError;
use crate::mortgage::loan::{LoanParameters, PaymentType, PAYMENTS_PER_YEAR};
use crate::types::{round_currency, with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Precision applied while the schedule is generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundingMode {
    /// Payment and each period's interest are rounded to cents, so every
    /// amount in the schedule is a whole number of cents
    #[default]
    PerPeriod,
    /// Full decimal precision throughout
    FullPrecision,
}

/// One monthly payment in the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    /// 1-based payment number
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub beginning_balance: Money,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
    /// Lump sum due with this payment; non-zero only on a balloon loan's last period
    pub balloon_due: Money,
}

/// Lazy, finite sequence of schedule periods. Not restartable: call
/// [`generate_schedule`] again for a fresh pass.
#[derive(Debug, Clone)]
pub struct ScheduleIter {
    payment_type: PaymentType,
    rounding: RoundingMode,
    annual_rate: Rate,
    level_payment: Money,
    final_balance: Money,
    balloon_due: Money,
    start_date: Option<NaiveDate>,
    total: u32,
    next_index: u32,
    balance: Money,
    cumulative_interest: Money,
}

/// Collected schedule with loan-level totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationScheduleOutput {
    pub periods: Vec<SchedulePeriod>,
    /// Level monthly payment (before final-period reconciliation)
    pub monthly_payment: Money,
    /// Last payment minus the level payment
    pub final_payment_adjustment: Money,
    /// Every payment including any balloon
    pub total_payments: Money,
    pub total_interest: Money,
    /// Principal repaid through payments and balloon
    pub total_principal: Money,
    pub balloon_payment: Money,
    /// Principal still owed after the final payment (interest-only loans)
    pub principal_outstanding_at_maturity: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Iterator
// ---------------------------------------------------------------------------

impl ScheduleIter {
    fn round(&self, amount: Money) -> Money {
        match self.rounding {
            RoundingMode::PerPeriod => round_currency(amount),
            RoundingMode::FullPrecision => amount,
        }
    }

    /// Level payment used for every period but (possibly) the last.
    pub fn level_payment(&self) -> Money {
        self.level_payment
    }
}

impl Iterator for ScheduleIter {
    type Item = SchedulePeriod;

    fn next(&mut self) -> Option<SchedulePeriod> {
        if self.next_index > self.total {
            return None;
        }
        let index = self.next_index;
        let is_final = index == self.total;
        self.next_index += 1;

        let beginning_balance = self.balance;
        let interest_portion =
            self.round(beginning_balance * self.annual_rate / Decimal::from(PAYMENTS_PER_YEAR));

        let (principal_portion, payment_amount) = match self.payment_type {
            PaymentType::InterestOnly => (Decimal::ZERO, self.level_payment),
            PaymentType::Standard | PaymentType::Balloon => {
                let remaining = beginning_balance - self.final_balance;
                let scheduled = self.level_payment - interest_portion;
                if is_final || scheduled >= remaining {
                    // Settles the loan; later periods carry nothing but interest on the target
                    (remaining, remaining + interest_portion)
                } else if scheduled < Decimal::ZERO {
                    (Decimal::ZERO, interest_portion)
                } else {
                    (scheduled, self.level_payment)
                }
            }
        };

        let ending_balance = beginning_balance - principal_portion;
        self.balance = ending_balance;
        self.cumulative_interest += interest_portion;

        let payment_date = self
            .start_date
            .and_then(|d| d.checked_add_months(Months::new(index)));

        Some(SchedulePeriod {
            index,
            payment_date,
            beginning_balance,
            payment_amount,
            principal_portion,
            interest_portion,
            ending_balance,
            cumulative_interest: self.cumulative_interest,
            balloon_due: if is_final { self.balloon_due } else { Decimal::ZERO },
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total + 1).saturating_sub(self.next_index) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ScheduleIter {}

impl FusedIterator for ScheduleIter {}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate the loan and return a lazy iterator over its monthly schedule.
///
/// Fails before producing any period if the parameters are out of domain or
/// the payment dates would overflow the calendar.
pub fn generate_schedule(params: &LoanParameters) -> MortgageCalcResult<ScheduleIter> {
    params.validate()?;

    let total = params.num_payments();
    if let Some(start) = params.start_date {
        if start.checked_add_months(Months::new(total)).is_none() {
            return Err(MortgageCalcError::DateError(format!(
                "{total} monthly payments from {start} run past the supported calendar"
            )));
        }
    }

    let unrounded = params.monthly_payment()?;
    let level_payment = match params.rounding {
        RoundingMode::PerPeriod => round_currency(unrounded),
        RoundingMode::FullPrecision => unrounded,
    };

    let balloon_due = match params.rounding {
        RoundingMode::PerPeriod => round_currency(params.balloon_amount()),
        RoundingMode::FullPrecision => params.balloon_amount(),
    };
    let final_balance = match params.payment_type {
        PaymentType::Standard => Decimal::ZERO,
        PaymentType::InterestOnly => params.principal,
        PaymentType::Balloon => balloon_due,
    };

    tracing::debug!(
        principal = %params.principal,
        annual_rate = %params.annual_rate,
        periods = total,
        payment_type = ?params.payment_type,
        "generating amortisation schedule"
    );

    Ok(ScheduleIter {
        payment_type: params.payment_type,
        rounding: params.rounding,
        annual_rate: params.annual_rate,
        level_payment,
        final_balance,
        balloon_due,
        start_date: params.start_date,
        total,
        next_index: 1,
        balance: params.principal,
        cumulative_interest: Decimal::ZERO,
    })
}

/// Build the full amortisation schedule with totals.
pub fn build_amortization_schedule(
    params: &LoanParameters,
) -> MortgageCalcResult<ComputationOutput<AmortizationScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let iter = generate_schedule(params)?;
    let monthly_payment = iter.level_payment();
    let periods: Vec<SchedulePeriod> = iter.collect();

    let mut total_payments = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;
    let mut balloon_payment = Decimal::ZERO;
    for p in &periods {
        total_payments += p.payment_amount + p.balloon_due;
        total_principal += p.principal_portion + p.balloon_due;
        balloon_payment += p.balloon_due;
    }

    // validate() guarantees at least twelve periods
    let (total_interest, final_payment_adjustment, principal_outstanding_at_maturity, payoff_date) =
        match periods.last() {
            Some(last) => (
                last.cumulative_interest,
                last.payment_amount - monthly_payment,
                last.ending_balance - last.balloon_due,
                last.payment_date,
            ),
            None => (Decimal::ZERO, Decimal::ZERO, params.principal, None),
        };

    if params.payment_type == PaymentType::InterestOnly {
        warnings.push(format!(
            "Interest-only loan: principal of {} remains outstanding after the final payment",
            round_currency(principal_outstanding_at_maturity)
        ));
    }
    if params.payment_type == PaymentType::Balloon {
        warnings.push(format!(
            "Balloon payment of {} is due with payment {}",
            round_currency(balloon_payment),
            periods.len()
        ));
    }

    let methodology = match params.rounding {
        RoundingMode::PerPeriod => "Amortization Schedule (cent rounding per period)",
        RoundingMode::FullPrecision => "Amortization Schedule (full precision)",
    };

    let output = AmortizationScheduleOutput {
        periods,
        monthly_payment,
        final_payment_adjustment,
        total_payments,
        total_interest,
        total_principal,
        balloon_payment,
        principal_outstanding_at_maturity,
        payoff_date,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        &serde_json::json!({
            "principal": params.principal.to_string(),
            "annual_rate": params.annual_rate.to_string(),
            "term_years": params.term_years,
            "payment_type": params.payment_type,
            "balloon_fraction": params.balloon_fraction.to_string(),
            "rounding": params.rounding,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
