use crate::{Driver, QueryResult, Value};
use futures::Stream;
use std::{
    fmt::{self, Display},
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Process unique identity of a connection, part of every statement cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Mints a new identity, never returned before by this process.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to one backend connection.
///
/// Handles are cheap to clone and every clone refers to the same underlying
/// connection and reports the same [`ConnectionId`]. Prepared statements are
/// only valid on the connection that prepared them.
pub trait Connection: Clone + Send + Sync + 'static {
    type Driver: Driver<Connection = Self>;

    fn driver(&self) -> &Self::Driver;

    fn id(&self) -> ConnectionId;

    /// Prepares a single statement.
    fn prepare(
        &self,
        sql: String,
    ) -> impl Future<Output = anyhow::Result<<Self::Driver as Driver>::Prepared>> + Send;

    /// Runs a prepared statement with its positional arguments and streams the results.
    fn run(
        &self,
        prepared: Arc<<Self::Driver as Driver>::Prepared>,
        arguments: Vec<Value>,
    ) -> impl Stream<Item = anyhow::Result<QueryResult>> + Send;

    /// Closes the connection, statements prepared on it become unusable.
    fn close(self) -> impl Future<Output = anyhow::Result<()>> + Send {
        async { Ok(()) }
    }
}
