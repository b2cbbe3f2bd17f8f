#![allow(dead_code)]

use anyhow::bail;
use futures::{FutureExt, Stream, TryFutureExt, stream};
use quill_core::{
    Connection, ConnectionId, Driver, GenericDialect, Prepared, QueryResult, RowLabeled,
    RowsAffected, Value,
};
use std::{
    borrow::Cow,
    fmt::{self, Display},
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// What a [`FakeConnection`] does, shared by every connection of a driver.
#[derive(Default)]
pub struct FakeState {
    pub prepares: AtomicUsize,
    /// Number of upcoming preparations that fail.
    pub failing_prepares: AtomicUsize,
    pub prepare_delay: Mutex<Option<Duration>>,
    pub run_delay: Mutex<Option<Duration>>,
    /// Returned by every run, in order.
    pub results: Mutex<Vec<QueryResult>>,
    /// SQL and arguments of every run.
    pub runs: Mutex<Vec<(String, Vec<Value>)>>,
}

impl FakeState {
    pub fn prepares(&self) -> usize {
        self.prepares.load(Ordering::SeqCst)
    }

    pub fn set_results(&self, results: impl IntoIterator<Item = QueryResult>) {
        *self.results.lock().unwrap() = results.into_iter().collect();
    }

    pub fn set_rows(&self, labels: &[&str], rows: impl IntoIterator<Item = Vec<Value>>) {
        let labels: Arc<[String]> = labels.iter().map(|v| v.to_string()).collect();
        self.set_results(
            rows.into_iter()
                .map(|v| RowLabeled::new(labels.clone(), v.into()).into()),
        );
    }

    pub fn last_run(&self) -> Option<(String, Vec<Value>)> {
        self.runs.lock().unwrap().last().cloned()
    }
}

#[derive(Default, Clone)]
pub struct FakeDriver {
    pub state: Arc<FakeState>,
}

#[derive(Debug)]
pub struct FakePrepared {
    pub sql: String,
}

impl Prepared for FakePrepared {
    fn parameters(&self) -> Option<usize> {
        Some(self.sql.matches('?').count())
    }
}

impl Display for FakePrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

#[derive(Clone)]
pub struct FakeConnection {
    driver: FakeDriver,
    id: ConnectionId,
}

impl FakeConnection {
    pub fn state(&self) -> &FakeState {
        &self.driver.state
    }
}

impl Driver for FakeDriver {
    type Connection = FakeConnection;
    type Prepared = FakePrepared;
    type Dialect = GenericDialect;

    const NAME: &'static str = "fake";

    fn dialect(&self) -> GenericDialect {
        GenericDialect
    }

    async fn connect(&self, _url: Cow<'static, str>) -> anyhow::Result<FakeConnection> {
        Ok(FakeConnection {
            driver: self.clone(),
            id: ConnectionId::next(),
        })
    }
}

impl FakeDriver {
    pub async fn connection(&self) -> FakeConnection {
        self.connect("fake://".into()).await.unwrap()
    }
}

impl Connection for FakeConnection {
    type Driver = FakeDriver;

    fn driver(&self) -> &FakeDriver {
        &self.driver
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn prepare(&self, sql: String) -> impl Future<Output = anyhow::Result<FakePrepared>> + Send {
        let state = self.driver.state.clone();
        async move {
            state.prepares.fetch_add(1, Ordering::SeqCst);
            let delay = *state.prepare_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let failing = state
                .failing_prepares
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
                .is_ok();
            if failing {
                bail!("Could not prepare the query:\n{}", sql);
            }
            Ok(FakePrepared { sql })
        }
    }

    fn run(
        &self,
        prepared: Arc<FakePrepared>,
        arguments: Vec<Value>,
    ) -> impl Stream<Item = anyhow::Result<QueryResult>> + Send {
        let state = self.driver.state.clone();
        async move {
            let delay = *state.run_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            state
                .runs
                .lock()
                .unwrap()
                .push((prepared.sql.clone(), arguments));
            let results = state.results.lock().unwrap().clone();
            Ok::<_, anyhow::Error>(stream::iter(results.into_iter().map(Ok)))
        }
        .boxed()
        .try_flatten_stream()
    }
}

pub fn affected(rows_affected: u64) -> QueryResult {
    RowsAffected {
        rows_affected,
        last_affected_id: None,
    }
    .into()
}
