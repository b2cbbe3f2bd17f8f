use crate::Structural;
use std::{
    fmt::{self, Debug, Display},
    sync::Arc,
    time::Duration,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong in a call.
///
/// Resolution errors (`UnresolvedPlaceholder`, `UnsafeIdentifier`,
/// `EmptyStructuralExpansion`) are caller bugs and are never retried.
/// `Driver` errors are passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Placeholder `${0}` has no matching param or param_sql descriptor")]
    UnresolvedPlaceholder(String),

    #[error("Identifier `{0}` is not a plain identifier (ASCII letters, digits and underscores, not only digits)")]
    UnsafeIdentifier(String),

    #[error("Placeholder `{0}` needs at least one field or field_sql descriptor")]
    EmptyStructuralExpansion(Structural),

    #[error("The query returned no rows")]
    NotFound,

    #[error("The call did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Cannot decode the result: {0:#}")]
    Decode(anyhow::Error),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl Error {
    /// True for errors that come from pairing a template with the wrong descriptors.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedPlaceholder(..)
                | Error::UnsafeIdentifier(..)
                | Error::EmptyStructuralExpansion(..)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Driver(value.into())
    }
}

/// Failure reported by a driver, shared between every caller waiting on it.
#[derive(Clone)]
pub struct DriverError(Arc<anyhow::Error>);

impl DriverError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl From<anyhow::Error> for DriverError {
    fn from(value: anyhow::Error) -> Self {
        Self(Arc::new(value))
    }
}

impl Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "{:#}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Debug for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}
