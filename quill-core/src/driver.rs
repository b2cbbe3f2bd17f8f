use crate::{Connection, Dialect, Prepared};
use std::{borrow::Cow, future::Future};

/// Entry point of a backend implementation.
pub trait Driver: Send + Sync + Sized + 'static {
    type Connection: Connection<Driver = Self>;
    type Prepared: Prepared;
    type Dialect: Dialect;

    /// Scheme expected at the start of connection URLs.
    const NAME: &'static str;

    fn dialect(&self) -> Self::Dialect;

    /// Opens a connection to the given URL.
    fn connect(
        &self,
        url: Cow<'static, str>,
    ) -> impl Future<Output = anyhow::Result<Self::Connection>> + Send;
}
