//! Repository tests against in-memory SQLite.
//!
//! Each module holds shared test functions taking `&DbPool`; a `sqlite_test!`
//! macro wires them to a fresh migrated database.

/// Declare a `#[tokio::test]` that runs `super::$name` against a fresh database.
macro_rules! sqlite_test {
    ($name:ident) => {
        #[tokio::test]
        async fn $name() {
            let db = crate::db::tests::harness::create_test_db().await;
            super::$name(&db).await;
        }
    };
}

mod identity_sync_configs;
