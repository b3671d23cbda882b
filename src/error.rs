//! Error types for startup and transport failures.
//!
//! Request-time failures are not `Error`s. A handler that fails produces a
//! [`Fault`](crate::Fault), which is routed to catchers; an unmatched
//! request is a 404 [`Disposition`](crate::Disposition).

use thiserror::Error;

/// The error type returned by arrowroute's fallible startup operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("invalid base path {0:?}: expected a literal path such as \"/api\"")]
    BasePath(String),

    #[error("invalid socket address {0:?}")]
    Addr(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// A template that does not follow the pattern grammar.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{reason}: pattern = {template:?}")]
pub struct PatternError {
    template: Box<str>,
    reason: &'static str,
}

impl PatternError {
    pub(crate) fn new(template: &str, reason: &'static str) -> Self {
        Self {
            template: template.into(),
            reason,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }
}
