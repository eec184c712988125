//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Element not found in the template.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Invalid element operation (for example dragging an element that is being edited).
    #[error("Invalid operation on element: {0}")]
    InvalidOperation(String),

    /// A required input was empty or malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// HTML import produced no elements.
    #[error("No elements found in the provided HTML")]
    NothingFound,

    /// The AI design response could not be recovered into elements.
    #[error("Invalid AI design response: {0}")]
    InvalidDesign(String),

    /// Template serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
