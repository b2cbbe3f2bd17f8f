use crate::{
    CBox, SqliteDriver, SqlitePrepared,
    bind::bind_arguments,
    error_message_from_ptr,
    extract::{extract_name, extract_value},
};
use anyhow::{Context, Error, Result};
use async_stream::try_stream;
use libsqlite3_sys::{
    SQLITE_BUSY, SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_FULLMUTEX,
    SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_bind_parameter_count,
    sqlite3_clear_bindings, sqlite3_column_count, sqlite3_errmsg,
    sqlite3_finalize, sqlite3_last_insert_rowid, sqlite3_open_v2, sqlite3_prepare_v2,
    sqlite3_reset, sqlite3_step, sqlite3_stmt, sqlite3_stmt_readonly, sqlite3_total_changes64,
};
use quill_core::{
    Connection, ConnectionId, Driver, QueryResult, RowLabeled, RowsAffected, Value,
    stream::Stream, truncate_long,
};
use std::{
    borrow::Cow,
    ffi::{CString, c_char, c_int},
    ptr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::{
    sync::mpsc::{self, Sender},
    task::spawn_blocking,
};

// Not exported by the bundled libsqlite3-sys bindings; the symbol is in the bundled sqlite3.c.
unsafe extern "C" {
    fn sqlite3_close_v2(db: *mut sqlite3) -> c_int;
}

/// Rows buffered between the blocking stepping task and the consumer.
const ROWS_BUFFER: usize = 64;

struct Inner {
    id: ConnectionId,
    handle: Mutex<CBox<*mut sqlite3>>,
}

impl Inner {
    fn lock(&self) -> Result<MutexGuard<'_, CBox<*mut sqlite3>>> {
        let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.is_null() {
            return Err(Error::msg(format!("Connection {} is closed", self.id)));
        }
        Ok(handle)
    }
}

/// Handle to a sqlite database, clones share the same connection.
///
/// Sqlite calls are blocking, they run on the blocking thread pool of tokio
/// and are serialized by a lock on the connection.
#[derive(Clone)]
pub struct SqliteConnection {
    driver: SqliteDriver,
    inner: Arc<Inner>,
}

impl SqliteConnection {
    pub(crate) async fn open(driver: SqliteDriver, url: Cow<'static, str>) -> Result<Self> {
        let prefix = format!("{}://", SqliteDriver::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`, found `{}`",
                prefix, url
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let filename = CString::new(format!("file:{}", location))
            .with_context(|| format!("Error while decoding connection URL: `{}`", url))?;
        let handle = spawn_blocking(move || unsafe {
            let mut connection = CBox::new(ptr::null_mut(), |p| {
                sqlite3_close_v2(p);
            });
            let rc = sqlite3_open_v2(
                filename.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_URI | SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_FULLMUTEX,
                ptr::null(),
            );
            if rc != SQLITE_OK {
                return Err(Error::msg(
                    error_message_from_ptr(&sqlite3_errmsg(*connection)).to_string(),
                ));
            }
            Ok(connection)
        })
        .await?
        .with_context(|| format!("Could not open the sqlite database `{}`", url))
        .inspect_err(|e| log::error!("{:#}", e))?;
        let id = ConnectionId::next();
        log::debug!("Opened sqlite connection {} to `{}`", id, url);
        Ok(Self {
            driver,
            inner: Arc::new(Inner {
                id,
                handle: Mutex::new(handle),
            }),
        })
    }
}

fn prepare_statement(connection: *mut sqlite3, sql: String) -> Result<SqlitePrepared> {
    let context = || format!("While preparing the query:\n{}", truncate_long!(sql));
    unsafe {
        let mut statement = CBox::new(ptr::null_mut(), |p| {
            sqlite3_finalize(p);
        });
        let mut tail = ptr::null();
        let rc = sqlite3_prepare_v2(
            connection,
            sql.as_ptr() as *const c_char,
            c_int::try_from(sql.len()).with_context(context)?,
            &mut *statement,
            &mut tail,
        );
        if rc != SQLITE_OK {
            return Err(
                Error::msg(error_message_from_ptr(&sqlite3_errmsg(connection)).to_string())
                    .context(context()),
            );
        }
        if statement.is_null() {
            return Err(Error::msg("The query does not contain any statement").context(context()));
        }
        let consumed = (tail as usize).saturating_sub(sql.as_ptr() as usize);
        let remaining = sql.get(consumed..).unwrap_or_default();
        if !remaining.trim_matches(|c: char| c.is_whitespace() || c == ';').is_empty() {
            return Err(
                Error::msg("Cannot prepare more than one statement at a time").context(context()),
            );
        }
        let parameters = sqlite3_bind_parameter_count(*statement) as usize;
        let inserts = ["INSERT", "REPLACE"].iter().any(|v| {
            sql.trim_start()
                .get(..v.len())
                .is_some_and(|p| p.eq_ignore_ascii_case(v))
        });
        Ok(SqlitePrepared {
            statement,
            parameters,
            inserts,
            sql,
        })
    }
}

/// Steps `statement` to completion, sending every row and finally the
/// modified rows count through `sender`.
///
/// Stops early when the receiving side is gone.
fn step_statement(
    connection: *mut sqlite3,
    statement: *mut sqlite3_stmt,
    inserts: bool,
    arguments: &[Value],
    sender: &Sender<Result<QueryResult>>,
) -> Result<()> {
    unsafe {
        sqlite3_reset(statement);
        sqlite3_clear_bindings(statement);
        bind_arguments(statement, arguments)?;
        let count = sqlite3_column_count(statement);
        let labels = (0..count)
            .map(|i| extract_name(statement, i))
            .collect::<Result<Arc<[_]>>>()?;
        let changes = sqlite3_total_changes64(connection);
        loop {
            match sqlite3_step(statement) {
                SQLITE_BUSY => {
                    continue;
                }
                SQLITE_DONE => {
                    break;
                }
                SQLITE_ROW => {
                    let row = RowLabeled::new(
                        labels.clone(),
                        (0..count)
                            .map(|i| extract_value(statement, i))
                            .collect::<Result<_>>()?,
                    );
                    if sender.blocking_send(Ok(row.into())).is_err() {
                        return Ok(());
                    }
                }
                _ => {
                    return Err(Error::msg(
                        error_message_from_ptr(&sqlite3_errmsg(connection)).to_string(),
                    ));
                }
            }
        }
        if sqlite3_stmt_readonly(statement) == 0 {
            let rows_affected = (sqlite3_total_changes64(connection) - changes).max(0) as u64;
            let _ = sender.blocking_send(Ok(RowsAffected {
                rows_affected,
                last_affected_id: (inserts && rows_affected > 0)
                    .then(|| sqlite3_last_insert_rowid(connection)),
            }
            .into()));
        }
        Ok(())
    }
}

impl Connection for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &SqliteDriver {
        &self.driver
    }

    fn id(&self) -> ConnectionId {
        self.inner.id
    }

    async fn prepare(&self, sql: String) -> Result<SqlitePrepared> {
        let inner = self.inner.clone();
        spawn_blocking(move || {
            let connection = inner.lock()?;
            prepare_statement(**connection, sql)
        })
        .await?
        .inspect_err(|e| log::error!("{:#}", e))
    }

    fn run(
        &self,
        prepared: Arc<SqlitePrepared>,
        arguments: Vec<Value>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send {
        let inner = self.inner.clone();
        try_stream! {
            let (sender, mut receiver) = mpsc::channel(ROWS_BUFFER);
            let task = spawn_blocking(move || {
                let result = inner.lock().and_then(|connection| {
                    let statement = *prepared.statement;
                    let result = step_statement(
                        **connection,
                        statement,
                        prepared.inserts,
                        &arguments,
                        &sender,
                    );
                    unsafe {
                        sqlite3_reset(statement);
                        sqlite3_clear_bindings(statement);
                    }
                    result.with_context(|| {
                        format!("While executing the query:\n{}", prepared)
                    })
                });
                if let Err(e) = result {
                    log::error!("{:#}", e);
                    let _ = sender.blocking_send(Err(e));
                }
            });
            while let Some(result) = receiver.recv().await {
                yield result?;
            }
            task.await?;
        }
    }

    async fn close(self) -> Result<()> {
        let inner = self.inner.clone();
        spawn_blocking(move || {
            let mut handle = inner.handle.lock().unwrap_or_else(PoisonError::into_inner);
            if handle.is_null() {
                return Ok(());
            }
            let connection = handle.take();
            // Statements still cached elsewhere keep the database alive until finalized
            let rc = unsafe { sqlite3_close_v2(connection) };
            if rc != SQLITE_OK {
                return Err(Error::msg(format!(
                    "Could not close the sqlite connection {} (code {})",
                    inner.id, rc
                )));
            }
            log::debug!("Closed sqlite connection {}", inner.id);
            Ok(())
        })
        .await?
    }
}
