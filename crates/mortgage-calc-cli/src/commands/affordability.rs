use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use mortgage_calc_core::mortgage::affordability::{self, AffordabilityInput, AffordabilityMethod};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    /// Discount the whole budget as principal and interest
    Decoupled,
    /// Solve price, tax and insurance together against the budget
    Coupled,
}

impl From<MethodArg> for AffordabilityMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Decoupled => AffordabilityMethod::Decoupled,
            MethodArg::Coupled => AffordabilityMethod::Coupled,
        }
    }
}

#[derive(Args)]
pub struct AffordabilityArgs {
    /// Path to a JSON or YAML file with the affordability inputs
    #[arg(long)]
    pub input: Option<String>,

    /// Gross annual household income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Existing monthly debt payments
    #[arg(long, default_value = "0")]
    pub monthly_debt: Decimal,

    /// Maximum back-end debt-to-income ratio
    #[arg(long, default_value = "0.36")]
    pub max_dti: Decimal,

    #[arg(long, default_value = "0.0575")]
    pub rate: Decimal,

    #[arg(long, default_value_t = 30)]
    pub term: u32,

    /// Annual property tax as a fraction of price
    #[arg(long, default_value = "0.01")]
    pub tax_rate: Decimal,

    /// Annual insurance as a fraction of price
    #[arg(long, default_value = "0.004")]
    pub insurance_rate: Decimal,

    #[arg(long, default_value = "0.2")]
    pub down_payment_ratio: Decimal,

    #[arg(long, value_enum, default_value_t = MethodArg::Coupled)]
    pub method: MethodArg,

    /// Front-end housing ratio for the desired payment guideline
    #[arg(long, default_value = "0.28")]
    pub front_end_ratio: Decimal,
}

pub fn run_affordability(args: AffordabilityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let aff_input = match input::read_input::<AffordabilityInput>(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => AffordabilityInput {
            gross_annual_income: args
                .income
                .ok_or("--income is required (or provide --input / stdin)")?,
            monthly_debt_payments: args.monthly_debt,
            max_dti_ratio: args.max_dti,
            annual_rate: args.rate,
            term_years: args.term,
            property_tax_rate: args.tax_rate,
            annual_insurance_rate: args.insurance_rate,
            down_payment_ratio: args.down_payment_ratio,
            method: args.method.into(),
            front_end_ratio: args.front_end_ratio,
        },
    };
    let result = affordability::max_affordable_loan(&aff_input)?;
    Ok(serde_json::to_value(result)?)
}
