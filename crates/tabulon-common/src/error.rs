//! Error types shared across the tabulon crates

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while parsing or evaluating cell contents.
///
/// The display form is the bare message; the UI layer renders it inline in
/// place of the offending cell's value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Formula text could not be parsed, or an operation in it is invalid
    #[error("{0}")]
    Formula(String),

    /// A sheet title, cell name or function name could not be resolved
    #[error("{0}")]
    Name(String),

    /// A cell or range reference is unusable (circular, inverted bounds, ...)
    #[error("{0}")]
    Ref(String),

    /// A value could not be cast to the requested type
    #[error("{0}")]
    Casting(String),

    /// Division by zero
    #[error("division by zero")]
    Div0,
}

impl Error {
    pub fn formula<S: Into<String>>(msg: S) -> Self {
        Error::Formula(msg.into())
    }

    pub fn name<S: Into<String>>(msg: S) -> Self {
        Error::Name(msg.into())
    }

    pub fn reference<S: Into<String>>(msg: S) -> Self {
        Error::Ref(msg.into())
    }

    pub fn casting<S: Into<String>>(msg: S) -> Self {
        Error::Casting(msg.into())
    }

    /// The error every cycle in the reference graph collapses to.
    pub fn circular() -> Self {
        Error::Ref("circular reference".into())
    }
}
