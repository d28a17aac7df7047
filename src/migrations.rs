use sqlx::{Pool, Postgres};

// Embed SQL migrations at compile time for deterministic startup
const MIG_0001: &str = include_str!("../migrations/0001_create_rbac.sql");
const MIG_0002: &str = include_str!("../migrations/0002_create_users.sql");

pub async fn run_all(db: &Pool<Postgres>) -> Result<(), sqlx::Error> {
    // Run sequentially; each migration may contain multiple statements and
    // is written to be rerun-safe (IF NOT EXISTS).
    for (i, sql) in [MIG_0001, MIG_0002].into_iter().enumerate() {
        let label = i + 1;
        match sqlx::query(sql).execute(db).await {
            Ok(_) => tracing::info!(migration = %label, "migration applied"),
            Err(e) => {
                tracing::warn!(migration = %label, error = %e, "migration may have been applied already");
            }
        }
    }
    Ok(())
}
