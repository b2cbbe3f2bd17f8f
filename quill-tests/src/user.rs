use indoc::indoc;
use quill::{
    Connection, Error, Executor, descriptors, field, field_sql, param, where_eq, where_gt,
    where_gte, where_lt, where_lte, where_ne, where_not_null, where_null,
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn users<C: Connection>(executor: &Executor<C>) {
    let _lock = MUTEX.lock().await;

    // Cleanup
    let result = executor
        .execute("DROP TABLE IF EXISTS quill_users", descriptors![])
        .await;
    assert!(
        result.is_ok(),
        "Failed to drop quill_users: {:?}",
        result.unwrap_err()
    );

    // Setup
    let result = executor
        .execute(
            indoc! {"
                CREATE TABLE quill_users (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT,
                    age INTEGER NOT NULL,
                    created_at TEXT
                )
            "},
            descriptors![],
        )
        .await;
    assert!(
        result.is_ok(),
        "Failed to create quill_users: {:?}",
        result.unwrap_err()
    );

    // Insert
    let users = [
        ("alice", Some("alice@example.com"), 31),
        ("bob", None, 17),
        ("charlie", Some("charlie@example.com"), 45),
        ("dana", None, 28),
    ];
    let mut ids = Vec::new();
    for (name, email, age) in users {
        let result = executor
            .insert(
                "quill_users",
                [
                    field("name", name),
                    field("email", email.map(String::from)),
                    field("age", age),
                    field_sql("created_at", "CURRENT_TIMESTAMP"),
                ],
            )
            .await
            .expect("Failed to insert a user");
        assert_eq!(result.rows_affected, 1);
        ids.push(
            result
                .last_affected_id
                .expect("The inserted id was not reported"),
        );
    }
    ids.dedup();
    assert_eq!(ids.len(), 4, "Every insert must report its own id");

    // Find
    let total: i64 = executor
        .value("SELECT COUNT(*) FROM quill_users WHERE {where}", descriptors![])
        .await
        .expect("Failed to count the users");
    assert_eq!(total, 4);
    let names: Vec<String> = executor
        .value_list(
            "SELECT name FROM quill_users WHERE {where} ORDER BY name",
            [where_gte("age", 28), where_lte("age", 40)],
        )
        .await
        .expect("Failed to list the users between 28 and 40");
    assert_eq!(names, ["alice", "dana"]);
    let names: Vec<String> = executor
        .value_list(
            "SELECT name FROM quill_users WHERE {where} ORDER BY name",
            [where_null("email")],
        )
        .await
        .expect("Failed to list the users without email");
    assert_eq!(names, ["bob", "dana"]);
    let rows = executor
        .row_list(
            "SELECT name, email, created_at FROM quill_users WHERE {where} ORDER BY age DESC",
            [where_not_null("email"), where_ne("name", "nobody")],
        )
        .await
        .expect("Failed to list the users with email");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get::<String>("name").unwrap(), "charlie");
    assert_eq!(
        rows[0].get::<Option<String>>("email").unwrap().as_deref(),
        Some("charlie@example.com")
    );
    assert!(
        rows.iter()
            .all(|row| row.get::<Option<String>>("created_at").unwrap().is_some()),
        "created_at must be computed by the database"
    );
    let row = executor
        .row(
            "SELECT name, age FROM quill_users WHERE {where}",
            [where_eq("name", "bob")],
        )
        .await
        .expect("Failed to find bob");
    assert_eq!(row.get_index::<String>(0).unwrap(), "bob");
    assert_eq!(row.get_index::<u8>(1).unwrap(), 17);

    // Missing
    let row = executor
        .row_optional(
            "SELECT * FROM quill_users WHERE {where}",
            [where_eq("name", "nobody")],
        )
        .await
        .expect("Failed to look for a missing user");
    assert!(row.is_none());
    let result = executor
        .row(
            "SELECT * FROM quill_users WHERE {where}",
            [where_eq("name", "nobody")],
        )
        .await;
    assert!(
        matches!(result, Err(Error::NotFound)),
        "Expected NotFound, got {:?}",
        result
    );
    let rows = executor
        .row_list(
            "SELECT * FROM quill_users WHERE {where}",
            [where_gt("age", 100)],
        )
        .await
        .expect("Failed to list the users older than 100");
    assert!(rows.is_empty());

    // Update
    let result = executor
        .update(
            "quill_users",
            [field("email", "bob@example.com"), field_sql("age", "age + 1")],
            [where_eq("name", "bob")],
        )
        .await
        .expect("Failed to update bob");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(result.last_affected_id, None);
    let (email, age): (String, i32) = {
        let row = executor
            .row(
                "SELECT email, age FROM quill_users WHERE name = $name",
                [param("name", "bob")],
            )
            .await
            .expect("Failed to read bob back");
        (row.get("email").unwrap(), row.get("age").unwrap())
    };
    assert_eq!(email, "bob@example.com");
    assert_eq!(age, 18);
    let result = executor
        .update(
            "quill_users",
            [field("email", None::<String>)],
            [where_gt("age", 30)],
        )
        .await
        .expect("Failed to clear the emails of the users older than 30");
    assert_eq!(result.rows_affected, 2);
    let result = executor
        .update("quill_users", [field("age", 0)], [where_eq("name", "nobody")])
        .await
        .expect("Failed to update nobody");
    assert_eq!(result.rows_affected, 0);

    // Delete
    let result = executor
        .delete("quill_users", [where_lt("age", 20)])
        .await
        .expect("Failed to delete the users younger than 20");
    assert_eq!(result.rows_affected, 1);
    let result = executor
        .delete("quill_users", [])
        .await
        .expect("Failed to delete every user");
    assert_eq!(result.rows_affected, 3);
    let total: i64 = executor
        .value("SELECT COUNT(*) FROM quill_users", descriptors![])
        .await
        .expect("Failed to count the users");
    assert_eq!(total, 0);

    // Unsafe names never reach the database
    crate::silent_logs! {
        let result = executor
            .delete("quill_users; DROP TABLE quill_users", [])
            .await;
        assert!(matches!(result, Err(Error::UnsafeIdentifier(..))));
        let result = executor
            .insert("quill_users", [field("name\"", "mallory")])
            .await;
        assert!(matches!(result, Err(Error::UnsafeIdentifier(..))));
    }

    executor
        .execute("DROP TABLE quill_users", descriptors![])
        .await
        .expect("Failed to drop quill_users");
}
