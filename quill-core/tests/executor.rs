mod common;

#[cfg(test)]
mod tests {
    use crate::common::{FakeConnection, FakeDriver, affected, init_logs};
    use futures::{StreamExt, future::join_all};
    use quill_core::{
        Config, Connection, Error, Executor, QueryResult, RowsAffected, StatementCache, Value,
        descriptors, field, field_sql, param, where_eq, where_gt, where_null,
    };
    use std::{pin::pin, sync::Arc, time::Duration};

    async fn executor() -> (FakeDriver, Executor<FakeConnection>) {
        init_logs();
        let driver = FakeDriver::default();
        let connection = driver.connection().await;
        (driver, Executor::new(connection))
    }

    #[tokio::test]
    async fn value_shapes() {
        let (driver, executor) = executor().await;
        driver.state.set_rows(
            &["x"],
            [vec![Value::Int64(Some(1))], vec![Value::Int64(Some(2))]],
        );
        let template = "SELECT x FROM t WHERE id = $id";
        let value: i32 = executor.value(template, [param("id", 7)]).await.unwrap();
        assert_eq!(value, 1);
        let value: Option<i32> = executor
            .value_optional(template, [param("id", 7)])
            .await
            .unwrap();
        assert_eq!(value, Some(1));
        let values: Vec<u8> = executor
            .value_list(template, [param("id", 7)])
            .await
            .unwrap();
        assert_eq!(values, [1, 2]);
        let (sql, arguments) = driver.state.last_run().unwrap();
        assert_eq!(sql, "SELECT x FROM t WHERE id = ?");
        assert_eq!(arguments, [Value::Int32(Some(7))]);
    }

    #[tokio::test]
    async fn not_found() {
        let (driver, executor) = executor().await;
        driver.state.set_results([]);
        let template = "SELECT x FROM t WHERE id = $id";
        let result = executor.value::<i32, _>(template, [param("id", 7)]).await;
        assert!(matches!(result, Err(Error::NotFound)));
        assert!(result.unwrap_err().is_not_found());
        let value = executor
            .value_optional::<i32, _>(template, [param("id", 7)])
            .await
            .unwrap();
        assert_eq!(value, None);
        let values = executor
            .value_list::<i32, _>(template, [param("id", 7)])
            .await
            .unwrap();
        assert!(values.is_empty());
        let result = executor.row(template, [param("id", 7)]).await;
        assert!(matches!(result, Err(Error::NotFound)));
        let row = executor.row_optional(template, [param("id", 7)]).await.unwrap();
        assert!(row.is_none());
        let rows = executor.row_list(template, [param("id", 7)]).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(driver.state.prepares(), 1);
    }

    #[tokio::test]
    async fn null_value() {
        let (driver, executor) = executor().await;
        driver.state.set_rows(&["x"], [vec![Value::Varchar(None)]]);
        let value = executor
            .value_optional::<String, _>("SELECT x FROM t", descriptors![])
            .await
            .unwrap();
        assert_eq!(value, None);
        let result = executor
            .value::<String, _>("SELECT x FROM t", descriptors![])
            .await;
        assert!(matches!(result, Err(Error::Decode(..))));
        let value = executor
            .value::<Option<String>, _>("SELECT x FROM t", descriptors![])
            .await
            .unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn row_shapes() {
        let (driver, executor) = executor().await;
        driver.state.set_rows(
            &["id", "name"],
            [
                vec![Value::Int64(Some(1)), Value::from("alice")],
                vec![Value::Int64(Some(2)), Value::from("bob")],
            ],
        );
        let row = executor
            .row("SELECT id, name FROM t WHERE {where}", [where_gt("id", 0)])
            .await
            .unwrap();
        assert_eq!(row.names(), ["id", "name"]);
        assert_eq!(row.get::<String>("name").unwrap(), "alice");
        let rows = executor
            .row_list("SELECT id, name FROM t WHERE {where}", [where_gt("id", 0)])
            .await
            .unwrap();
        assert_eq!(
            rows.iter()
                .map(|v| v.get::<i64>("id").unwrap())
                .collect::<Vec<_>>(),
            [1, 2]
        );
        let (sql, arguments) = driver.state.last_run().unwrap();
        assert_eq!(sql, "SELECT id, name FROM t WHERE `id` > ?");
        assert_eq!(arguments, [Value::Int32(Some(0))]);
    }

    #[tokio::test]
    async fn execute_sums_affected() {
        let (driver, executor) = executor().await;
        driver.state.set_results([affected(2), affected(3)]);
        let result = executor
            .execute("DELETE FROM t WHERE {where}", [where_null("deleted_at")])
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 5);
        let (sql, arguments) = driver.state.last_run().unwrap();
        assert_eq!(sql, "DELETE FROM t WHERE `deleted_at` IS NULL");
        assert!(arguments.is_empty());
    }

    #[tokio::test]
    async fn typed_builders() {
        let (driver, executor) = executor().await;
        driver.state.set_results([QueryResult::from(RowsAffected {
            rows_affected: 1,
            last_affected_id: Some(42),
        })]);
        let result = executor
            .insert(
                "app.users",
                [field("name", "alice"), field_sql("created_at", "NOW()")],
            )
            .await
            .unwrap();
        assert_eq!(result.last_affected_id, Some(42));
        assert_eq!(
            driver.state.last_run().unwrap(),
            (
                "INSERT INTO `app`.`users` (`name`, `created_at`) VALUES (?, NOW())".to_string(),
                vec![Value::from("alice")]
            )
        );
        executor
            .update(
                "users",
                [field("age", 31), field_sql("visits", "visits + 1")],
                [where_eq("id", 5)],
            )
            .await
            .unwrap();
        assert_eq!(
            driver.state.last_run().unwrap(),
            (
                "UPDATE `users` SET `age` = ?, `visits` = visits + 1 WHERE `id` = ?".to_string(),
                vec![Value::Int32(Some(31)), Value::Int32(Some(5))]
            )
        );
        executor.delete("users", [where_eq("id", 5)]).await.unwrap();
        assert_eq!(
            driver.state.last_run().unwrap().0,
            "DELETE FROM `users` WHERE `id` = ?"
        );
        executor.delete("users", []).await.unwrap();
        assert_eq!(
            driver.state.last_run().unwrap().0,
            "DELETE FROM `users` WHERE TRUE"
        );
    }

    #[tokio::test]
    async fn resolution_errors_skip_the_driver() {
        let (driver, executor) = executor().await;
        let result = executor
            .insert("users; DROP TABLE x", [field("a", 1)])
            .await;
        assert!(matches!(result, Err(Error::UnsafeIdentifier(ref v)) if v == "users; DROP TABLE x"));
        let result = executor
            .insert("users", [field("users; DROP TABLE x", 1)])
            .await;
        assert!(matches!(result, Err(Error::UnsafeIdentifier(..))));
        let result = executor.update("users", [], [where_eq("id", 1)]).await;
        assert!(matches!(result, Err(Error::EmptyStructuralExpansion(..))));
        let result = executor.row("SELECT $missing", descriptors![]).await;
        assert!(matches!(result, Err(Error::UnresolvedPlaceholder(..))));
        assert_eq!(driver.state.prepares(), 0);
        assert!(driver.state.runs.lock().unwrap().is_empty());
        assert!(executor.cache().is_empty());
    }

    #[tokio::test]
    async fn driver_errors_pass_through() {
        let (driver, executor) = executor().await;
        driver
            .state
            .failing_prepares
            .store(1, std::sync::atomic::Ordering::SeqCst);
        let result = executor.execute("SELEC 1", descriptors![]).await;
        let Err(Error::Driver(error)) = &result else {
            panic!("Expected a driver error, got {:?}", result);
        };
        assert!(error.to_string().contains("SELEC 1"));
        executor.execute("SELEC 1", descriptors![]).await.unwrap();
        assert_eq!(driver.state.prepares(), 2);
    }

    #[tokio::test]
    async fn parameters_mismatch() {
        let (driver, executor) = executor().await;
        let result = executor.execute("SELECT ?", descriptors![]).await;
        assert!(matches!(result, Err(Error::Driver(..))));
        assert!(driver.state.runs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn statements_are_reused() {
        let (driver, executor) = executor().await;
        driver.state.set_rows(&["x"], [vec![Value::Int64(Some(1))]]);
        for i in 0..5 {
            let _: i64 = executor
                .value("SELECT x FROM t WHERE id = $id", [param("id", i)])
                .await
                .unwrap();
        }
        let _: i64 = executor
            .value("SELECT x FROM t WHERE {where}", [where_eq("id", 1)])
            .await
            .unwrap();
        assert_eq!(driver.state.prepares(), 2);
        assert_eq!(driver.state.runs.lock().unwrap().len(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shared_cache_between_connections() {
        init_logs();
        let driver = FakeDriver::default();
        *driver.state.prepare_delay.lock().unwrap() = Some(Duration::from_millis(20));
        driver.state.set_rows(&["x"], [vec![Value::Int64(Some(1))]]);
        let config = Config::default();
        let cache = Arc::new(StatementCache::with_config(&config));
        let a = Executor::with_cache(driver.connection().await, cache.clone(), &config);
        let b = Executor::with_cache(driver.connection().await, cache.clone(), &config);
        let calls = (0..10).map(|i| {
            let executor = if i % 2 == 0 { &a } else { &b };
            executor.value::<i64, _>("SELECT x FROM t WHERE id = $id", [param("id", i)])
        });
        for result in join_all(calls).await {
            assert_eq!(result.unwrap(), 1);
        }
        assert_eq!(driver.state.prepares(), 2);
        assert_eq!(cache.len(), 2);
        a.close().await.unwrap();
        assert_eq!(cache.len(), 1);
        b.close().await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn timeout() {
        init_logs();
        let driver = FakeDriver::default();
        *driver.state.run_delay.lock().unwrap() = Some(Duration::from_millis(200));
        let config = Config::default().with_query_timeout(Duration::from_millis(20));
        let cache = Arc::new(StatementCache::with_config(&config));
        let executor = Executor::with_cache(driver.connection().await, cache, &config);
        let result = executor.execute("UPDATE t SET x = 1", descriptors![]).await;
        assert!(matches!(result, Err(Error::Timeout(v)) if v == Duration::from_millis(20)));
        assert!(
            executor
                .cache()
                .contains(executor.connection().id(), "UPDATE t SET x = 1")
        );
    }

    #[tokio::test]
    async fn run_stream() {
        let (driver, executor) = executor().await;
        driver
            .state
            .set_results([affected(1), affected(1), affected(1)]);
        let descriptors = descriptors![param("v", 1)];
        let stream = pin!(executor.run("UPDATE t SET v = $v", &descriptors));
        assert_eq!(stream.count().await, 3);
        let query = executor.resolve("UPDATE t SET v = $v", [param("v", 1)]).unwrap();
        assert_eq!(query.sql, "UPDATE t SET v = ?");
    }
}
