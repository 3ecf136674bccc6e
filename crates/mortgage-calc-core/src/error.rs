use thiserror::Error;

#[derive(Debug, Error)]
pub enum MortgageCalcError {
    #[error("Invalid parameter: {field} — {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),
}

impl MortgageCalcError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        MortgageCalcError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending input field, when the error is an input error.
    pub fn field(&self) -> Option<&str> {
        match self {
            MortgageCalcError::InvalidParameter { field, .. } => Some(field),
            _ => None,
        }
    }
}
