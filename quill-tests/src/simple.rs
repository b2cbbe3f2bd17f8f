use indoc::indoc;
use quill::{Connection, Error, Executor, descriptors, field, param};
use rust_decimal::Decimal;
use std::sync::LazyLock;
use time::{
    Date, PrimitiveDateTime, Time,
    macros::{date, datetime, time},
};
use tokio::sync::Mutex;
use uuid::Uuid;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn simple<C: Connection>(executor: &Executor<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    executor
        .execute("DROP TABLE IF EXISTS quill_simple", descriptors![])
        .await
        .expect("Failed to drop quill_simple");
    let result = executor
        .execute(
            indoc! {"
                CREATE TABLE quill_simple (
                    id INTEGER PRIMARY KEY,
                    flag BOOLEAN,
                    small INTEGER,
                    big INTEGER,
                    ratio REAL,
                    amount NUMERIC,
                    label TEXT,
                    payload BLOB,
                    day TEXT,
                    moment TEXT,
                    stamp TEXT,
                    code TEXT
                )
            "},
            descriptors![],
        )
        .await
        .expect("Failed to create quill_simple");
    assert_eq!(result.rows_affected, 0);

    // Simple 1
    let code = Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap();
    let result = executor
        .insert(
            "quill_simple",
            [
                field("id", 1),
                field("flag", true),
                field("small", -2i16),
                field("big", 9876543210i64),
                field("ratio", 0.5f64),
                field("amount", Decimal::new(1250, 2)),
                field("label", "Hello world!"),
                field("payload", vec![1u8, 2, 3]),
                field("day", date!(2025-01-31)),
                field("moment", time!(12:00:10)),
                field("stamp", datetime!(2025-07-15 10:30:00)),
                field("code", code),
            ],
        )
        .await
        .expect("Failed to insert simple 1");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(result.last_affected_id, Some(1));
    let row = executor
        .row("SELECT * FROM quill_simple WHERE id = $id", [param("id", 1)])
        .await
        .expect("Failed to query simple 1");
    assert_eq!(row.names().len(), 12);
    assert_eq!(row.get::<bool>("flag").unwrap(), true);
    assert_eq!(row.get::<i16>("small").unwrap(), -2);
    assert_eq!(row.get::<i64>("big").unwrap(), 9876543210);
    assert_eq!(row.get::<f64>("ratio").unwrap(), 0.5);
    assert_eq!(row.get::<Decimal>("amount").unwrap(), Decimal::new(1250, 2));
    assert_eq!(row.get::<String>("label").unwrap(), "Hello world!");
    assert_eq!(row.get::<Vec<u8>>("payload").unwrap(), vec![1, 2, 3]);
    assert_eq!(row.get::<Date>("day").unwrap(), date!(2025-01-31));
    assert_eq!(row.get::<Time>("moment").unwrap(), time!(12:00:10));
    assert_eq!(
        row.get::<PrimitiveDateTime>("stamp").unwrap(),
        datetime!(2025-07-15 10:30:00)
    );
    assert_eq!(row.get::<Uuid>("code").unwrap(), code);
    assert!(matches!(row.get::<i32>("missing"), Err(Error::Decode(..))));
    assert!(matches!(row.get::<i8>("big"), Err(Error::Decode(..))));

    // Simple 2
    executor
        .insert(
            "quill_simple",
            [
                field("id", 2),
                field("flag", None::<bool>),
                field("small", None::<i16>),
                field("label", None::<String>),
            ],
        )
        .await
        .expect("Failed to insert simple 2");
    let row = executor
        .row("SELECT * FROM quill_simple WHERE id = $id", [param("id", 2)])
        .await
        .expect("Failed to query simple 2");
    assert_eq!(row.get::<Option<bool>>("flag").unwrap(), None);
    assert_eq!(row.get::<Option<i16>>("small").unwrap(), None);
    assert_eq!(row.get::<Option<String>>("label").unwrap(), None);
    assert_eq!(row.get::<Option<Uuid>>("code").unwrap(), None);
    assert!(row.get::<String>("label").is_err());

    // Single values
    let label: String = executor
        .value("SELECT label FROM quill_simple WHERE id = $id", [param("id", 1)])
        .await
        .expect("Failed to read the label of simple 1");
    assert_eq!(label, "Hello world!");
    let label: Option<String> = executor
        .value_optional("SELECT label FROM quill_simple WHERE id = $id", [param("id", 2)])
        .await
        .expect("Failed to read the label of simple 2");
    assert_eq!(label, None);
    let label: Option<String> = executor
        .value_optional("SELECT label FROM quill_simple WHERE id = $id", [param("id", 3)])
        .await
        .expect("Failed to read the label of a missing row");
    assert_eq!(label, None);
    let result = executor
        .value::<String, _>("SELECT label FROM quill_simple WHERE id = $id", [param("id", 3)])
        .await;
    assert!(matches!(result, Err(Error::NotFound)));
    let ids: Vec<i64> = executor
        .value_list("SELECT id FROM quill_simple ORDER BY id DESC", descriptors![])
        .await
        .expect("Failed to list the ids");
    assert_eq!(ids, [2, 1]);

    // Cleanup
    executor
        .execute("DROP TABLE quill_simple", descriptors![])
        .await
        .expect("Failed to drop quill_simple");
}
