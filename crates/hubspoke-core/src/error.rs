use thiserror::Error;

use crate::Category;

#[derive(Error, Debug)]
pub enum Error {
    #[error("too many services in '{category}': {count} (max {max})")]
    TooManyServices {
        category: Category,
        count: usize,
        max: usize,
    },

    #[error("service identifier in '{category}' too long: {length} characters (max {max})")]
    IdentifierTooLong {
        category: Category,
        length: usize,
        max: usize,
    },

    #[error("malformed request: {0}")]
    MalformedRequest(#[from] serde_json::Error),

    #[error("topology invariant {rule_id} violated: {message}")]
    InvariantViolated { rule_id: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
