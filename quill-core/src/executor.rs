use crate::{
    AsValue, Config, Connection, Descriptor, Dialect, Driver, Error, Field, Prepared, QueryResult,
    ResolvedQuery, Result, RowLabeled, RowsAffected, StatementCache, WhereOp, resolve_template,
};
use futures::{
    Stream, TryFutureExt, TryStreamExt,
    future::{self, Future},
};
use std::{pin::pin, sync::Arc, time::Duration};

/// Prepared statement handle type of a connection.
pub type PreparedOf<C> = <<C as Connection>::Driver as Driver>::Prepared;

/// Runs templates on one connection.
///
/// Every call goes through the same steps: tokenize, resolve against the
/// descriptors, look up (or prepare) the statement in the shared cache, run it
/// with the resolved arguments. The result shape is picked by the method:
///
/// | method | zero rows | rows |
/// |---|---|---|
/// | `value` / `row` | [`Error::NotFound`] | first one |
/// | `value_optional` / `row_optional` | `None` | first one |
/// | `value_list` / `row_list` | empty | all of them |
///
/// ```rust,ignore
/// let age: i32 = executor
///     .value("SELECT age FROM users WHERE id = $id", [param("id", 7)])
///     .await?;
/// ```
pub struct Executor<C: Connection> {
    connection: C,
    cache: Arc<StatementCache<PreparedOf<C>>>,
    dialect: <C::Driver as Driver>::Dialect,
    timeout: Option<Duration>,
}

impl<C: Connection> Executor<C> {
    /// Executor with its own cache and the default configuration.
    pub fn new(connection: C) -> Self {
        let config = Config::default();
        let cache = Arc::new(StatementCache::with_config(&config));
        Self::with_cache(connection, cache, &config)
    }

    /// Executor sharing `cache` with other executors, usually one per pooled connection.
    pub fn with_cache(
        connection: C,
        cache: Arc<StatementCache<PreparedOf<C>>>,
        config: &Config,
    ) -> Self {
        let dialect = connection.driver().dialect();
        Self {
            connection,
            cache,
            dialect,
            timeout: config.query_timeout,
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn cache(&self) -> &Arc<StatementCache<PreparedOf<C>>> {
        &self.cache
    }

    pub fn dialect(&self) -> &<C::Driver as Driver>::Dialect {
        &self.dialect
    }

    /// Resolves a template without running it.
    pub fn resolve<I>(&self, template: &str, descriptors: I) -> Result<ResolvedQuery>
    where
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        resolve_template(&self.dialect, template, &collect(descriptors))
    }

    async fn prepared(&self, sql: &str) -> Result<Arc<PreparedOf<C>>> {
        let connection = self.connection.clone();
        Ok(self
            .cache
            .get_or_prepare(self.connection.id(), sql, move |sql| async move {
                connection.prepare(sql).await
            })
            .await?)
    }

    /// Resolves and runs a template, streaming every result the backend produces.
    pub fn run<'s>(
        &'s self,
        template: &'s str,
        descriptors: &'s [Descriptor],
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        async move {
            let query = resolve_template(&self.dialect, template, descriptors)?;
            log::debug!("Running on connection {}:\n{}", self.connection.id(), query);
            let prepared = self.prepared(&query.sql).await?;
            if let Some(expected) = prepared.parameters()
                && expected != query.arguments.len()
            {
                let error = Error::from(anyhow::Error::msg(format!(
                    "The statement expects {} parameters but {} arguments were resolved:\n{}",
                    expected,
                    query.arguments.len(),
                    query
                )));
                log::error!("{:#}", error);
                return Err(error);
            }
            Ok(self
                .connection
                .run(prepared, query.arguments)
                .map_err(Error::from))
        }
        .try_flatten_stream()
    }

    fn rows<'s>(
        &'s self,
        template: &'s str,
        descriptors: &'s [Descriptor],
    ) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
        self.run(template, descriptors).try_filter_map(|v| {
            future::ready(Ok(match v {
                QueryResult::Row(row) => Some(row),
                QueryResult::Affected(..) => None,
            }))
        })
    }

    async fn timed<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match self.timeout {
            Some(duration) => tokio::time::timeout(duration, call)
                .await
                .map_err(|_| Error::Timeout(duration))?,
            None => call.await,
        }
    }

    async fn first_row(&self, template: &str, descriptors: &[Descriptor]) -> Result<Option<RowLabeled>> {
        let mut rows = pin!(self.rows(template, descriptors));
        rows.try_next().await
    }

    /// Runs a statement that returns no rows.
    pub async fn execute<I>(&self, template: &str, descriptors: I) -> Result<RowsAffected>
    where
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        let descriptors = collect(descriptors);
        self.timed(
            self.run(template, &descriptors)
                .try_fold(RowsAffected::default(), |mut total, v| {
                    if let QueryResult::Affected(v) = v {
                        total.extend([v]);
                    }
                    future::ready(Ok(total))
                }),
        )
        .await
    }

    /// First column of the first row, [`Error::NotFound`] if there are no rows.
    pub async fn value<T, I>(&self, template: &str, descriptors: I) -> Result<T>
    where
        T: AsValue,
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        let row = self.row(template, descriptors).await?;
        first_column(row)
    }

    /// First column of the first row, `None` if there are no rows or the value is NULL.
    pub async fn value_optional<T, I>(&self, template: &str, descriptors: I) -> Result<Option<T>>
    where
        T: AsValue,
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        let Some(row) = self.row_optional(template, descriptors).await? else {
            return Ok(None);
        };
        first_column::<Option<T>>(row)
    }

    /// First column of every row.
    pub async fn value_list<T, I>(&self, template: &str, descriptors: I) -> Result<Vec<T>>
    where
        T: AsValue,
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        self.row_list(template, descriptors)
            .await?
            .into_iter()
            .map(first_column)
            .collect()
    }

    /// First row, [`Error::NotFound`] if there are no rows.
    pub async fn row<I>(&self, template: &str, descriptors: I) -> Result<RowLabeled>
    where
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        self.row_optional(template, descriptors)
            .await?
            .ok_or(Error::NotFound)
    }

    /// First row, `None` if there are no rows.
    pub async fn row_optional<I>(&self, template: &str, descriptors: I) -> Result<Option<RowLabeled>>
    where
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        let descriptors = collect(descriptors);
        self.timed(self.first_row(template, &descriptors)).await
    }

    /// Every row, in the order the backend returns them.
    pub async fn row_list<I>(&self, template: &str, descriptors: I) -> Result<Vec<RowLabeled>>
    where
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        let descriptors = collect(descriptors);
        self.timed(self.rows(template, &descriptors).try_collect())
            .await
    }

    /// `INSERT INTO <table> ({fields}) VALUES ({values})`
    pub async fn insert(
        &self,
        table: &str,
        fields: impl IntoIterator<Item = Field>,
    ) -> Result<RowsAffected> {
        let mut template = String::from("INSERT INTO ");
        self.write_table_name(&mut template, table)?;
        template.push_str(" ({fields}) VALUES ({values})");
        self.execute(&template, fields).await
    }

    /// `UPDATE <table> SET {fields=values} WHERE {where}`
    pub async fn update(
        &self,
        table: &str,
        fields: impl IntoIterator<Item = Field>,
        conditions: impl IntoIterator<Item = WhereOp>,
    ) -> Result<RowsAffected> {
        let mut template = String::from("UPDATE ");
        self.write_table_name(&mut template, table)?;
        template.push_str(" SET {fields=values} WHERE {where}");
        let descriptors = fields
            .into_iter()
            .map(Descriptor::from)
            .chain(conditions.into_iter().map(Descriptor::from));
        self.execute(&template, descriptors).await
    }

    /// `DELETE FROM <table> WHERE {where}`, without conditions every row is deleted.
    pub async fn delete(
        &self,
        table: &str,
        conditions: impl IntoIterator<Item = WhereOp>,
    ) -> Result<RowsAffected> {
        let mut template = String::from("DELETE FROM ");
        self.write_table_name(&mut template, table)?;
        template.push_str(" WHERE {where}");
        self.execute(&template, conditions).await
    }

    fn write_table_name(&self, out: &mut String, table: &str) -> Result<()> {
        self.dialect.write_table_name(out, table).inspect_err(|e| {
            log::warn!("{:#}", e);
        })
    }

    /// Forgets the cached statements of this connection and closes it.
    pub async fn close(self) -> Result<()> {
        self.cache.evict_connection(self.connection.id());
        self.connection.close().await.map_err(|e| {
            log::error!("{:#}", e);
            Error::from(e)
        })
    }
}

fn collect<I>(descriptors: I) -> Vec<Descriptor>
where
    I: IntoIterator,
    I::Item: Into<Descriptor>,
{
    descriptors.into_iter().map(Into::into).collect()
}

fn first_column<T: AsValue>(row: RowLabeled) -> Result<T> {
    let Some(value) = row.values.into_vec().into_iter().next() else {
        return Err(Error::Decode(anyhow::Error::msg(
            "The row has no columns to read a value from",
        )));
    };
    T::try_from_value(value).map_err(Error::Decode)
}
