use quill::{Connection, Error, Executor, descriptors, future::join_all, param};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn statement_cache<C: Connection>(executor: &Executor<C>) {
    let _lock = MUTEX.lock().await;
    let id = executor.connection().id();

    // Reuse
    let template = "SELECT $value * 2 AS doubled";
    let sql = executor
        .resolve(template, [param("value", 0)])
        .expect("Failed to resolve")
        .sql;
    for i in 0..3 {
        let doubled: i64 = executor
            .value(template, [param("value", i)])
            .await
            .expect("Failed to double a value");
        assert_eq!(doubled, i * 2);
    }
    assert!(executor.cache().contains(id, &sql));

    // Concurrent calls
    let results = join_all((0..32i64).map(|i| executor.value::<i64, _>(template, [param("value", i)])))
        .await;
    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.expect("Failed to double concurrently"), i as i64 * 2);
    }

    // Failures are not cached
    crate::silent_logs! {
        for _ in 0..2 {
            let result = executor
                .execute("SELEC 1 FROM nowhere", descriptors![])
                .await;
            assert!(
                matches!(result, Err(Error::Driver(..))),
                "Expected a driver error, got {:?}",
                result
            );
            assert!(!executor.cache().contains(id, "SELEC 1 FROM nowhere"));
        }
    }
}
