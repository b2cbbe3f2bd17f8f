use crate::{SqliteConnection, SqlitePrepared};
use quill_core::{Driver, GenericDialect};
use std::borrow::Cow;

#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteDriver {}

impl SqliteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;
    type Prepared = SqlitePrepared;
    type Dialect = GenericDialect;

    const NAME: &'static str = "sqlite";

    fn dialect(&self) -> GenericDialect {
        GenericDialect
    }

    /// Accepts `sqlite://<path>[?<options>]`, options are the ones of sqlite
    /// URI filenames (`mode=ro`, `mode=rwc`, `cache=shared`, ...).
    /// `sqlite://:memory:` opens a private in memory database.
    async fn connect(&self, url: Cow<'static, str>) -> anyhow::Result<SqliteConnection> {
        SqliteConnection::open(*self, url).await
    }
}
