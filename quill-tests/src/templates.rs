use indoc::indoc;
use quill::{
    Connection, Error, Executor, Structural, descriptors, field, field_sql, param, param_sql,
    where_eq,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn templates<C: Connection>(executor: &Executor<C>) {
    let _lock = MUTEX.lock().await;

    // Setup
    executor
        .execute("DROP TABLE IF EXISTS quill_events", descriptors![])
        .await
        .expect("Failed to drop quill_events");
    executor
        .execute(
            indoc! {"
                CREATE TABLE quill_events (
                    id INTEGER PRIMARY KEY,
                    kind TEXT NOT NULL,
                    source TEXT NOT NULL,
                    weight INTEGER NOT NULL,
                    note TEXT
                )
            "},
            descriptors![],
        )
        .await
        .expect("Failed to create quill_events");

    // Fields and values far apart keep their order
    let template = indoc! {"
        INSERT INTO quill_events ({fields})
        VALUES ({values})
    "};
    for (id, kind, source, weight) in [
        (1, "click", "web", 3),
        (2, "view", "click", 1),
        (3, "view", "mobile", 7),
        (4, "purchase", "web", 10),
    ] {
        executor
            .execute(
                template,
                descriptors![
                    field("weight", weight),
                    field("id", id),
                    field("source", source),
                    field("kind", kind),
                    field_sql("note", "'imported'"),
                ],
            )
            .await
            .expect("Failed to insert an event");
    }
    let row = executor
        .row(
            "SELECT kind, source, weight, note FROM quill_events WHERE id = $id",
            [param("id", 4)],
        )
        .await
        .expect("Failed to read event 4");
    assert_eq!(row.get::<String>("kind").unwrap(), "purchase");
    assert_eq!(row.get::<String>("source").unwrap(), "web");
    assert_eq!(row.get::<i32>("weight").unwrap(), 10);
    assert_eq!(row.get::<String>("note").unwrap(), "imported");

    // A name used twice binds twice
    let ids: Vec<i32> = executor
        .value_list(
            "SELECT id FROM quill_events WHERE kind = $kind OR source = $kind ORDER BY id",
            [param("kind", "click")],
        )
        .await
        .expect("Failed to find the click events");
    assert_eq!(ids, [1, 2]);

    // Raw expressions
    let ids: Vec<i32> = executor
        .value_list(
            "SELECT id FROM quill_events WHERE weight > $min ORDER BY $order",
            [param("min", 2), param_sql("order", "weight DESC, id")],
        )
        .await
        .expect("Failed to sort the events");
    assert_eq!(ids, [4, 3, 1]);

    // Mixed structural and named placeholders
    let result = executor
        .execute(
            "UPDATE quill_events SET {fields=values} WHERE {where} AND weight < $limit",
            descriptors![
                param("limit", 5),
                field("note", "light"),
                field_sql("weight", "weight * 2"),
                where_eq("kind", "view"),
            ],
        )
        .await
        .expect("Failed to update the light views");
    assert_eq!(result.rows_affected, 1);
    let (note, weight): (String, i32) = {
        let row = executor
            .row(
                "SELECT note, weight FROM quill_events WHERE {where}",
                [where_eq("id", 2)],
            )
            .await
            .expect("Failed to read event 2");
        (row.get("note").unwrap(), row.get("weight").unwrap())
    };
    assert_eq!(note, "light");
    assert_eq!(weight, 2);

    // Text that looks like a placeholder passes through
    let text: String = executor
        .value("SELECT '$1 $$ {json}' AS greeting", descriptors![])
        .await
        .expect("Failed to select a literal");
    assert_eq!(text, "$1 $$ {json}");

    // Resolution errors never reach the database
    let cached = executor.cache().len();
    silent_resolution_errors(executor).await;
    assert_eq!(executor.cache().len(), cached);

    executor
        .execute("DROP TABLE quill_events", descriptors![])
        .await
        .expect("Failed to drop quill_events");
}

async fn silent_resolution_errors<C: Connection>(executor: &Executor<C>) {
    crate::silent_logs! {
        let result = executor
            .value::<i32, _>("SELECT id FROM quill_events WHERE kind = $kind", descriptors![])
            .await;
        assert!(
            matches!(result, Err(Error::UnresolvedPlaceholder(ref name)) if name == "kind"),
            "Expected an unresolved placeholder, got {:?}",
            result
        );
        let result = executor
            .execute(
                "INSERT INTO quill_events ({fields}) VALUES ({values})",
                [where_eq("id", 10)],
            )
            .await;
        assert!(matches!(
            result,
            Err(Error::EmptyStructuralExpansion(Structural::Fields))
        ));
        let result = executor
            .row_list(
                "SELECT * FROM quill_events WHERE {where}",
                [where_eq("id = 1 OR 1", 1)],
            )
            .await;
        assert!(matches!(result, Err(Error::UnsafeIdentifier(..))));
        let result = executor
            .execute(
                "UPDATE quill_events SET {fields=values}",
                [field("1", 1)],
            )
            .await;
        assert!(matches!(result, Err(Error::UnsafeIdentifier(ref name)) if name == "1"));
    }
}
