use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use mortgage_calc_core::mortgage::comparison::{self, LoanComparisonInput, LoanOption};
use mortgage_calc_core::mortgage::summary::{self, MortgageSummaryInput};

use crate::commands::loan::PaymentTypeArg;
use crate::input;

/// Purchase terms shared by `summary` and `compare`.
#[derive(Args)]
pub struct PurchaseFlags {
    #[arg(long)]
    pub price: Option<Decimal>,

    #[arg(long)]
    pub down_payment: Option<Decimal>,

    #[arg(long, default_value = "0.0575")]
    pub rate: Decimal,

    #[arg(long, default_value_t = 30)]
    pub term: u32,

    #[arg(long, value_enum, default_value_t = PaymentTypeArg::Standard)]
    pub payment_type: PaymentTypeArg,

    #[arg(long, default_value = "0.7")]
    pub balloon_fraction: Decimal,

    #[arg(long, default_value = "3000")]
    pub annual_tax: Decimal,

    #[arg(long, default_value = "1200")]
    pub annual_insurance: Decimal,

    /// Annual PMI premium as a fraction of the loan
    #[arg(long, default_value = "0.005")]
    pub pmi_rate: Decimal,

    /// Down payment ratio below which PMI applies
    #[arg(long, default_value = "0.20")]
    pub pmi_threshold: Decimal,

    /// Origination fee as a fraction of the loan
    #[arg(long, default_value = "0.01")]
    pub origination_fee_rate: Decimal,

    #[arg(long, default_value = "2500")]
    pub other_closing_costs: Decimal,

    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

impl PurchaseFlags {
    fn to_input(&self) -> Result<MortgageSummaryInput, Box<dyn std::error::Error>> {
        Ok(MortgageSummaryInput {
            purchase_price: self
                .price
                .ok_or("--price is required (or provide --input / stdin)")?,
            down_payment: self
                .down_payment
                .ok_or("--down-payment is required (or provide --input / stdin)")?,
            annual_rate: self.rate,
            term_years: self.term,
            payment_type: self.payment_type.into(),
            balloon_fraction: self.balloon_fraction,
            annual_property_tax: self.annual_tax,
            annual_insurance: self.annual_insurance,
            pmi_rate: self.pmi_rate,
            pmi_threshold: self.pmi_threshold,
            origination_fee_rate: self.origination_fee_rate,
            other_closing_costs: self.other_closing_costs,
            start_date: self.start_date,
        })
    }
}

#[derive(Args)]
pub struct SummaryArgs {
    /// Path to a JSON or YAML file with the purchase terms
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub purchase: PurchaseFlags,
}

#[derive(Args)]
pub struct CompareArgs {
    /// Path to a JSON or YAML file with `current` terms and `options`
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub purchase: PurchaseFlags,

    /// Alternative annual rates, comma separated; paired with --alt-terms
    #[arg(long, value_delimiter = ',')]
    pub alt_rates: Vec<Decimal>,

    /// Alternative terms in years, comma separated
    #[arg(long, value_delimiter = ',')]
    pub alt_terms: Vec<u32>,
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let summary_input = match input::read_input::<MortgageSummaryInput>(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => args.purchase.to_input()?,
    };
    let result = summary::calculate_mortgage_summary(&summary_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cmp_input = match input::read_input::<LoanComparisonInput>(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => LoanComparisonInput {
            current: args.purchase.to_input()?,
            options: alternative_options(&args.alt_rates, &args.alt_terms)?,
        },
    };
    let result = comparison::compare_loans(&cmp_input)?;
    Ok(serde_json::to_value(result)?)
}

fn alternative_options(rates: &[Decimal], terms: &[u32]) -> Result<Vec<LoanOption>, Box<dyn std::error::Error>> {
    if rates.is_empty() && terms.is_empty() {
        return Ok(comparison::default_options());
    }
    if rates.len() != terms.len() {
        return Err(format!(
            "--alt-rates has {} values but --alt-terms has {}",
            rates.len(),
            terms.len()
        )
        .into());
    }
    Ok(rates
        .iter()
        .zip(terms)
        .map(|(&rate, &term)| LoanOption {
            label: option_label(rate, term),
            annual_rate: rate,
            term_years: term,
        })
        .collect())
}

fn option_label(rate: Decimal, term: u32) -> String {
    format!("{}-year at {:.2}%", term, rate * dec!(100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_label_matches_default_labels() {
        assert_eq!(option_label(dec!(0.06), 15), "15-year at 6.00%");
        assert_eq!(option_label(dec!(0.055), 30), "30-year at 5.50%");
    }

    #[test]
    fn test_alternative_options_default_when_empty() {
        let opts = alternative_options(&[], &[]).unwrap();
        assert_eq!(opts.len(), 2);
        assert_eq!(opts[0].term_years, 15);
    }

    #[test]
    fn test_alternative_options_length_mismatch() {
        assert!(alternative_options(&[dec!(0.05)], &[]).is_err());
    }
}
