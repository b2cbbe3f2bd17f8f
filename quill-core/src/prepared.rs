use std::fmt::{Debug, Display};

/// Backend prepared statement handle.
///
/// Handles live in the [`StatementCache`](crate::StatementCache) and are
/// shared by every execution of the same SQL on the same connection, so
/// arguments are never bound on the handle itself: they are handed to
/// [`Connection::run`](crate::Connection::run) together with it.
pub trait Prepared: Send + Sync + Display + Debug + 'static {
    /// Number of positional parameters the backend expects, if it reports it.
    fn parameters(&self) -> Option<usize> {
        None
    }
}
