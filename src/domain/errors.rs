use thiserror::Error;

use super::status::OrderStatus;

/// Business-rule failures. Everything except `Storage` is detected before
/// any write and reported to the caller with a specific message.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product \"{name}\" is unavailable")]
    ProductUnavailable { name: String },

    #[error("Insufficient stock for \"{name}\": only {available} left")]
    InsufficientStock { name: String, available: i32 },

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
