use vpms_database::rusqlite::params;
use vpms_database::*;

#[tokio::test]
async fn open_in_memory_and_health_check() {
    let db = Database::builder().path(IN_MEMORY).init().await.expect("open :memory:");

    db.health().await.expect("health check");
    assert_eq!(db.path(), IN_MEMORY);
    assert_eq!(db.schema_version().await.expect("version"), 2);
}

#[tokio::test]
async fn missing_path_fails_validation() {
    let err = Database::builder().init().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));
}

#[tokio::test]
async fn file_database_creates_parent_dirs_and_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("vpms.db");
    let path = path.to_string_lossy().into_owned();

    let db = Database::builder().path(&path).init().await.expect("first open");
    db.call(|conn| {
        conn.execute(
            "INSERT INTO parking_lots (name, prime_location_name, price_per_hour, address, pin_code,
                 maximum_number_of_spots, created_at, updated_at)
             VALUES ('Central Plaza', 'Downtown', 20.0, '1 Main St', '110001', 3, 'now', 'now')",
            [],
        )?;
        Ok::<_, DatabaseError>(())
    })
    .await
    .expect("insert");
    drop(db);

    let db = Database::builder().path(&path).init().await.expect("reopen");
    let count: i64 = db
        .call(|conn| {
            Ok::<_, DatabaseError>(conn.query_row("SELECT COUNT(*) FROM parking_lots", [], |r| {
                r.get(0)
            })?)
        })
        .await
        .expect("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn foreign_keys_cascade_from_lots_to_spots() {
    let db = Database::builder().path(IN_MEMORY).init().await.expect("open");

    let remaining: i64 = db
        .call(|conn| {
            conn.execute(
                "INSERT INTO parking_lots (name, prime_location_name, price_per_hour, address, pin_code,
                     maximum_number_of_spots, created_at, updated_at)
                 VALUES ('North', 'Airport', 10.0, 'Terminal 1', '560001', 1, 'now', 'now')",
                [],
            )?;
            let lot_id = conn.last_insert_rowid();
            conn.execute(
                "INSERT INTO parking_spots (spot_number, lot_id, created_at, updated_at)
                 VALUES (?1, ?2, 'now', 'now')",
                params![format!("{lot_id}-1"), lot_id],
            )?;
            conn.execute("DELETE FROM parking_lots WHERE id = ?1", [lot_id])?;
            Ok::<_, DatabaseError>(conn.query_row("SELECT COUNT(*) FROM parking_spots", [], |r| {
                r.get(0)
            })?)
        })
        .await
        .expect("cascade");

    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn unique_violation_is_detected() {
    let db = Database::builder().path(IN_MEMORY).init().await.expect("open");

    let err = db
        .call(|conn| {
            for _ in 0..2 {
                conn.execute(
                    "INSERT INTO users (id, full_name, email, password_hash, created_at, updated_at)
                     VALUES (?1, 'Asha Rao', 'asha@example.com', 'x', 'now', 'now')",
                    [format!("@asha{}", conn.last_insert_rowid())],
                )?;
            }
            Ok::<_, DatabaseError>(())
        })
        .await
        .unwrap_err();

    assert!(err.is_unique_violation());
}
