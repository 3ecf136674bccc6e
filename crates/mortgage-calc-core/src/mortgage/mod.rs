//! Residential mortgage calculations: payment sizing, amortisation
//! schedules, affordability, and the calculator summary / comparison views.

pub mod loan;
pub mod schedule;

#[cfg(feature = "affordability")]
pub mod affordability;

#[cfg(feature = "summary")]
pub mod summary;

#[cfg(feature = "comparison")]
pub mod comparison;

pub use loan::{calculate_payment, monthly_payment, remaining_balance, LoanParameters, PaymentType};
pub use schedule::{build_amortization_schedule, generate_schedule, RoundingMode, SchedulePeriod};
