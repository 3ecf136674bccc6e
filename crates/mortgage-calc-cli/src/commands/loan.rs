use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use mortgage_calc_core::mortgage::loan::{self, LoanParameters, PaymentType};
use mortgage_calc_core::mortgage::schedule::{self, RoundingMode};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PaymentTypeArg {
    Standard,
    InterestOnly,
    Balloon,
}

impl From<PaymentTypeArg> for PaymentType {
    fn from(arg: PaymentTypeArg) -> Self {
        match arg {
            PaymentTypeArg::Standard => PaymentType::Standard,
            PaymentTypeArg::InterestOnly => PaymentType::InterestOnly,
            PaymentTypeArg::Balloon => PaymentType::Balloon,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoundingArg {
    /// Round payment and interest to cents every period
    PerPeriod,
    /// Keep full decimal precision
    FullPrecision,
}

impl From<RoundingArg> for RoundingMode {
    fn from(arg: RoundingArg) -> Self {
        match arg {
            RoundingArg::PerPeriod => RoundingMode::PerPeriod,
            RoundingArg::FullPrecision => RoundingMode::FullPrecision,
        }
    }
}

#[derive(Args)]
pub struct LoanArgs {
    /// Path to a JSON or YAML file with the loan parameters
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a decimal (0.0575 = 5.75%)
    #[arg(long, default_value = "0.0575")]
    pub rate: Decimal,

    /// Loan term in years
    #[arg(long, default_value_t = 30)]
    pub term: u32,

    #[arg(long, value_enum, default_value_t = PaymentTypeArg::Standard)]
    pub payment_type: PaymentTypeArg,

    /// Share of principal left due at maturity on a balloon loan
    #[arg(long, default_value = "0.7")]
    pub balloon_fraction: Decimal,

    /// Loan start date (YYYY-MM-DD); payments fall on the same day in following months
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = RoundingArg::PerPeriod)]
    pub rounding: RoundingArg,
}

fn loan_parameters(args: &LoanArgs) -> Result<LoanParameters, Box<dyn std::error::Error>> {
    if let Some(params) = input::read_input::<LoanParameters>(args.input.as_deref())? {
        return Ok(params);
    }
    let principal = args
        .principal
        .ok_or("--principal is required (or provide --input / stdin)")?;
    let mut params = LoanParameters::new(principal, args.rate, args.term, args.payment_type.into())
        .with_balloon_fraction(args.balloon_fraction)
        .with_rounding(args.rounding.into());
    if let Some(date) = args.start_date {
        params = params.with_start_date(date);
    }
    Ok(params)
}

pub fn run_payment(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = loan_parameters(&args)?;
    let result = loan::calculate_payment(&params)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = loan_parameters(&args)?;
    let result = schedule::build_amortization_schedule(&params)?;
    Ok(serde_json::to_value(result)?)
}
