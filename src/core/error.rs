use thiserror::Error;

use super::types::{Category, Side};

pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Failures raised while classifying or projecting accounts.
///
/// Per-account failures are recoverable at aggregation time: the offending
/// account is excluded and reported, the rest of the portfolio is still
/// projected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("account '{account_id}' has invalid balance {balance}")]
    InvalidBalance { account_id: String, balance: f64 },

    #[error("unknown account category '{0}'")]
    UnknownCategory(String),

    #[error("category {category} is on the {category_side} side but the source reports a {source_side}")]
    SideMismatch {
        category: Category,
        category_side: Side,
        source_side: Side,
    },

    #[error("invalid rate {rate} for {context}")]
    InvalidRate { context: String, rate: f64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("growth rate configuration error: {0}")]
    Config(String),
}
