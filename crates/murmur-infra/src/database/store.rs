use sea_orm::DbConn;

/// PostgreSQL implementation of every repository port.
///
/// Each write runs in its own transaction on the shared pool; background jobs use the
/// same pool, so they never borrow a request's connection.
pub struct PostgresStore {
    pub(crate) db: DbConn,
}

impl PostgresStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DbConn {
        &self.db
    }
}
