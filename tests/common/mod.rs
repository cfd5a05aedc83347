//! Shared setup for the SQLite-backed integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use steampipe_mcp_server::cli::PlatformCli;
use steampipe_mcp_server::config::PoolSettings;
use steampipe_mcp_server::db::{ConnectionManager, ConnectionResolver, QueryExecutor};
use steampipe_mcp_server::models::{ConnectionDescriptor, SourceType};
use tempfile::NamedTempFile;

/// A connected manager over a fresh database file.
///
/// The file is kept alive by the returned handle; the resolver points at the
/// same path so implicit reconnects land on it again.
pub async fn setup_sqlite() -> (NamedTempFile, Arc<ConnectionManager>, QueryExecutor) {
    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_string_lossy().into_owned();

    let cli = PlatformCli::new("false", Duration::from_secs(5));
    let resolver = ConnectionResolver::new(None, Some(path.clone()), cli, Vec::new());
    let manager = Arc::new(ConnectionManager::new(resolver, PoolSettings::default()));
    manager
        .connect(ConnectionDescriptor::new(path, SourceType::CliArg))
        .await
        .unwrap();

    let executor = QueryExecutor::new(manager.clone(), Duration::from_secs(10));
    (file, manager, executor)
}

/// Run each statement with write access.
pub async fn seed(executor: &QueryExecutor, statements: &[&str]) {
    for sql in statements {
        executor.execute(sql, &[], true).await.unwrap();
    }
}

/// The `aws_account` fixture used across tests.
pub async fn seed_accounts(executor: &QueryExecutor) {
    seed(
        executor,
        &[
            "CREATE TABLE aws_account (
                account_id TEXT NOT NULL,
                title TEXT,
                region_count INTEGER DEFAULT 0,
                organization_id TEXT
            )",
            "INSERT INTO aws_account VALUES ('123456789012', 'prod', 17, NULL)",
            "INSERT INTO aws_account VALUES ('210987654321', 'dev', 4, 'o-abc')",
        ],
    )
    .await;
}
