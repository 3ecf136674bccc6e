//! Annuity primitives following the spreadsheet sign convention: money
//! received is positive, money paid out is negative. `pmt(r, n, -loan, 0)`
//! is therefore the positive level payment on a loan.
//!
//! All arithmetic is checked. An intermediate that leaves the decimal range
//! is reported as an `InvalidParameter` on the argument that drove it, never
//! as a panic.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::MortgageCalcError;
use crate::types::{Money, Rate};
use crate::MortgageCalcResult;

fn checked(value: Option<Decimal>, field: &str) -> MortgageCalcResult<Decimal> {
    value.ok_or_else(|| MortgageCalcError::invalid(field, "Value is outside the representable decimal range"))
}

/// (1 + rate)^nper
pub(crate) fn compound_factor(rate: Rate, nper: u32) -> MortgageCalcResult<Decimal> {
    (Decimal::ONE + rate).checked_powi(i64::from(nper)).ok_or_else(|| {
        MortgageCalcError::invalid("nper", format!("Compound factor overflows for {nper} periods at rate {rate}"))
    })
}

/// Present value of `nper` payments of `pmt` plus a terminal `fv`.
pub fn pv(rate: Rate, nper: u32, pmt: Money, fv: Money) -> MortgageCalcResult<Money> {
    if rate.is_zero() {
        let paid = checked(pmt.checked_mul(Decimal::from(nper)), "pmt")?;
        return Ok(-checked(paid.checked_add(fv), "fv")?);
    }

    let discount = checked(Decimal::ONE.checked_div(compound_factor(rate, nper)?), "nper")?;
    let annuity = (Decimal::ONE - discount) / rate;
    let payments = checked(pmt.checked_mul(annuity), "pmt")?;
    let terminal = checked(fv.checked_mul(discount), "fv")?;
    Ok(-checked(payments.checked_add(terminal), "fv")?)
}

/// Value after `nper` periods of a balance `present_value` paying `pmt` each period.
pub fn fv(rate: Rate, nper: u32, pmt: Money, present_value: Money) -> MortgageCalcResult<Money> {
    if rate.is_zero() {
        let paid = checked(pmt.checked_mul(Decimal::from(nper)), "pmt")?;
        return Ok(-checked(present_value.checked_add(paid), "present_value")?);
    }

    let growth = compound_factor(rate, nper)? - Decimal::ONE;
    let grown = checked(present_value.checked_mul(growth + Decimal::ONE), "present_value")?;
    let accrued = checked(pmt.checked_mul(growth).and_then(|v| v.checked_div(rate)), "pmt")?;
    Ok(-checked(grown.checked_add(accrued), "present_value")?)
}

/// Level payment that takes `present_value` to `future_value` over `nper` periods.
///
/// Computed as `-(pv·r + (pv + fv)·r / ((1+r)^n − 1))`, which never forms
/// `pv·(1+r)^n` and so stays in range for long terms.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> MortgageCalcResult<Money> {
    if nper == 0 {
        return Err(MortgageCalcError::invalid("nper", "Number of periods must be > 0"));
    }

    let total = checked(present_value.checked_add(future_value), "future_value")?;
    if rate.is_zero() {
        return Ok(-total / Decimal::from(nper));
    }

    let growth = compound_factor(rate, nper)? - Decimal::ONE;
    if growth.is_zero() {
        return Err(MortgageCalcError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    let interest = checked(present_value.checked_mul(rate), "present_value")?;
    let sinking = checked(total.checked_mul(rate).and_then(|v| v.checked_div(growth)), "future_value")?;
    Ok(-checked(interest.checked_add(sinking), "present_value")?)
}

/// Level payment per unit of principal: r / (1 - (1+r)^-n), or 1/n at r = 0.
pub fn payment_per_unit(rate: Rate, nper: u32) -> MortgageCalcResult<Decimal> {
    pmt(rate, nper, -Decimal::ONE, Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pv_of_level_annuity() {
        let result = pv(dec!(0.08), 10, dec!(-100), dec!(0)).unwrap();
        // 100 × (1 − 1.08^−10) / 0.08 ≈ 671.01
        assert!((result - dec!(671.01)).abs() < dec!(0.01), "got {result}");
    }

    #[test]
    fn test_pmt_matches_mortgage_reference() {
        let monthly = dec!(0.0575) / dec!(12);
        let result = pmt(monthly, 360, dec!(-240000), dec!(0)).unwrap();
        assert!((result - dec!(1400.57)).abs() < dec!(0.01), "got {result}");
    }

    #[test]
    fn test_pmt_zero_rate_is_straight_line() {
        let result = pmt(Decimal::ZERO, 12, dec!(-1200), dec!(0)).unwrap();
        assert_eq!(result, dec!(100));
    }

    #[test]
    fn test_pmt_with_future_value_target() {
        // Paying down only 40% of the loan needs a smaller payment than full amortisation
        let monthly = dec!(0.06) / dec!(12);
        let full = pmt(monthly, 120, dec!(-100000), dec!(0)).unwrap();
        let partial = pmt(monthly, 120, dec!(-100000), dec!(60000)).unwrap();
        assert!(partial < full);
        assert!(partial > dec!(100000) * monthly);
    }

    #[test]
    fn test_pmt_zero_periods_error() {
        assert!(pmt(dec!(0.01), 0, dec!(-100), dec!(0)).is_err());
    }

    #[test]
    fn test_pv_inverts_pmt() {
        let monthly = dec!(0.05) / dec!(12);
        let payment = pmt(monthly, 180, dec!(-150000), dec!(0)).unwrap();
        let back = pv(monthly, 180, -payment, dec!(0)).unwrap();
        assert!((back - dec!(150000)).abs() < dec!(0.0001), "got {back}");
    }

    #[test]
    fn test_fv_of_level_payment_is_zero_at_maturity() {
        let monthly = dec!(0.04) / dec!(12);
        let payment = pmt(monthly, 60, dec!(-20000), dec!(0)).unwrap();
        let balance = fv(monthly, 60, payment, dec!(-20000)).unwrap();
        assert!(balance.abs() < dec!(0.0001), "got {balance}");
    }

    #[test]
    fn test_payment_per_unit_zero_rate() {
        assert_eq!(payment_per_unit(Decimal::ZERO, 4).unwrap(), dec!(0.25));
    }

    #[test]
    fn test_out_of_range_values_are_errors() {
        let huge = Decimal::MAX / dec!(2);
        let err = pmt(dec!(0.01), 12, -huge, -huge).unwrap_err();
        assert_eq!(err.field(), Some("future_value"));

        let err = fv(dec!(0.5), 12, Decimal::ZERO, -huge).unwrap_err();
        assert_eq!(err.field(), Some("present_value"));

        let err = pv(Decimal::ZERO, 360, huge, Decimal::ZERO).unwrap_err();
        assert_eq!(err.field(), Some("pmt"));
    }

    #[test]
    fn test_compound_overflow_is_an_error() {
        let err = pmt(dec!(0.5), 1200, dec!(-1000), Decimal::ZERO).unwrap_err();
        assert_eq!(err.field(), Some("nper"));
    }
}
