//! Query execution engine.
//!
//! Every statement runs on exactly one leased connection inside an explicit
//! transaction: read-only unless the caller asks for a writable one. On
//! failure the transaction is rolled back on a best-effort basis and the
//! original error is returned; a connection whose transaction cannot be closed
//! is detached from the pool and closed instead of being returned dirty.
//!
//! # Architecture
//!
//! The executor uses database-specific implementations organized in submodules:
//! - `postgres`: `BEGIN READ ONLY` / `BEGIN`
//! - `sqlite`: `BEGIN` on a connection the manager opened read-only (or writable)
//!
//! Each submodule provides identical functionality adapted to the database's type system.

use crate::db::params::{bind_postgres_param, bind_sqlite_param};
use crate::db::pool::{ConnectionManager, Lease, LeasedConnection};
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, QueryResult, Row};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs SQL against the manager's current pool.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    manager: Arc<ConnectionManager>,
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(manager: Arc<ConnectionManager>, timeout: Duration) -> Self {
        Self { manager, timeout }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute `sql` with positional `params` and return all rows in order.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[QueryParam],
        writable: bool,
    ) -> DbResult<Vec<Row>> {
        let Lease {
            connection,
            generation,
        } = self.manager.acquire(writable).await?;

        debug!(
            sql = %sql,
            params = params.len(),
            writable,
            timeout_secs = self.timeout.as_secs(),
            "Executing statement"
        );

        let result = match connection {
            LeasedConnection::Postgres(conn) => {
                postgres::run(conn, sql, params, writable, self.timeout).await
            }
            LeasedConnection::SQLite(conn) => sqlite::run(conn, sql, params, self.timeout).await,
        };

        match result {
            Ok(rows) => Ok(rows),
            Err(err) => {
                let err = self.manager.sanitize(err).await;
                self.manager.report_fault(generation, &err).await;
                Err(err)
            }
        }
    }

    /// Execute and package the rows with their column list and timing.
    pub async fn query(
        &self,
        sql: &str,
        params: &[QueryParam],
        writable: bool,
    ) -> DbResult<QueryResult> {
        let start = Instant::now();
        let rows = self.execute(sql, params, writable).await?;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(QueryResult::new(rows, elapsed_ms))
    }
}

fn timeout_error(limit: Duration) -> DbError {
    let bound = if limit.subsec_millis() == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{}ms", limit.as_millis())
    };
    DbError::connection_timeout(format!("statement did not finish within {}", bound))
}

/// Commit/rollback/discard helpers shared by the backend modules.
macro_rules! impl_transaction_close {
    ($db:ty) => {
        /// Commit on success; roll back on failure. Consumes the lease either way.
        async fn finish(
            mut conn: PoolConnection<$db>,
            outcome: DbResult<Vec<Row>>,
        ) -> DbResult<Vec<Row>> {
            match outcome {
                Ok(rows) => match (&mut *conn).execute("COMMIT").await {
                    Ok(_) => Ok(rows),
                    Err(e) => {
                        rollback(conn).await;
                        Err(DbError::from(e))
                    }
                },
                Err(err) => {
                    rollback(conn).await;
                    Err(err)
                }
            }
        }

        async fn rollback(mut conn: PoolConnection<$db>) {
            if let Err(e) = (&mut *conn).execute("ROLLBACK").await {
                warn!(error = %e, "Rollback failed, discarding connection");
                abandon(conn);
            }
        }

        /// Take the connection out of the pool and close it in the background.
        ///
        /// Used when the transaction state is unknown, e.g. a statement that
        /// may still be running after the client-side timeout fired. Closing
        /// ends the transaction without committing it.
        fn abandon(conn: PoolConnection<$db>) {
            let conn = conn.detach();
            tokio::spawn(async move {
                if let Err(e) = conn.close().await {
                    debug!(error = %e, "Error closing discarded connection");
                }
            });
        }

        /// Run `fetch` under the client-side timeout, then commit or roll back.
        async fn run_bounded(
            mut conn: PoolConnection<$db>,
            sql: &str,
            params: &[QueryParam],
            limit: Duration,
        ) -> DbResult<Vec<Row>> {
            match timeout(limit, fetch(&mut conn, sql, params)).await {
                Ok(outcome) => finish(conn, outcome).await,
                Err(_) => {
                    warn!(timeout = ?limit, "Statement timed out, discarding connection");
                    abandon(conn);
                    Err(timeout_error(limit))
                }
            }
        }
    };
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Statements always go through `sqlx::query`, i.e. the extended protocol on
// PostgreSQL, which accepts exactly one statement per call. A string such as
// `COMMIT; INSERT ...` is rejected instead of escaping the read-only
// transaction.

mod postgres {
    use super::*;
    use sqlx::pool::PoolConnection;
    use sqlx::postgres::PgRow;
    use sqlx::{Connection, Executor, PgConnection, Postgres};

    pub async fn run(
        mut conn: PoolConnection<Postgres>,
        sql: &str,
        params: &[QueryParam],
        writable: bool,
        limit: Duration,
    ) -> DbResult<Vec<Row>> {
        let begin = if writable { "BEGIN" } else { "BEGIN READ ONLY" };
        (&mut *conn).execute(begin).await?;
        run_bounded(conn, sql, params, limit).await
    }

    async fn fetch(conn: &mut PgConnection, sql: &str, params: &[QueryParam]) -> DbResult<Vec<Row>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_postgres_param(query, param);
        }
        let rows: Vec<PgRow> = query.fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(RowToJson::to_json_map).collect())
    }

    impl_transaction_close!(Postgres);
}

mod sqlite {
    use super::*;
    use sqlx::pool::PoolConnection;
    use sqlx::sqlite::SqliteRow;
    use sqlx::{Connection, Executor, Sqlite, SqliteConnection};

    /// Read-only access comes from the lease itself: the manager hands out
    /// connections opened read-only unless `writable` was requested.
    pub async fn run(
        mut conn: PoolConnection<Sqlite>,
        sql: &str,
        params: &[QueryParam],
        limit: Duration,
    ) -> DbResult<Vec<Row>> {
        (&mut *conn).execute("BEGIN").await?;
        run_bounded(conn, sql, params, limit).await
    }

    async fn fetch(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[QueryParam],
    ) -> DbResult<Vec<Row>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_sqlite_param(query, param);
        }
        let rows: Vec<SqliteRow> = query.fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(RowToJson::to_json_map).collect())
    }

    impl_transaction_close!(Sqlite);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_timeout_error_kind() {
        let err = timeout_error(Duration::from_secs(120));
        assert_eq!(err.kind(), ErrorKind::ConnectionTimeout);
        assert!(err.to_string().contains("120s"));

        let err = timeout_error(Duration::from_millis(100));
        assert!(err.to_string().contains("100ms"));
    }
}
