use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    dojo_db::health_check(&pool).await.unwrap();

    let tables = ["people", "attendance", "rank_history", "attendance_audit"];
    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// The QR same-day guard must exist as a partial unique index.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_qr_unique_index_present(pool: PgPool) {
    let row: (String,) = sqlx::query_as(
        "SELECT indexdef FROM pg_indexes WHERE indexname = $1",
    )
    .bind(dojo_db::UQ_ATTENDANCE_QR_STUDENT_DATE)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(row.0.contains("UNIQUE"), "index should be unique: {}", row.0);
    assert!(row.0.contains("qr_scan"), "index should be partial on qr_scan: {}", row.0);
}
