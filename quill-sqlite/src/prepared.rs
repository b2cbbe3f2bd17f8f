use crate::CBox;
use libsqlite3_sys::sqlite3_stmt;
use quill_core::{Prepared, truncate_long};
use std::fmt::{self, Display};

/// A compiled sqlite statement.
///
/// The statement is only stepped while its connection lock is held, this is
/// what makes sharing it between executions sound.
#[derive(Debug)]
pub struct SqlitePrepared {
    pub(crate) statement: CBox<*mut sqlite3_stmt>,
    pub(crate) parameters: usize,
    /// Starts with `INSERT` or `REPLACE`, the last inserted rowid is reported.
    pub(crate) inserts: bool,
    pub(crate) sql: String,
}

impl SqlitePrepared {
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl Prepared for SqlitePrepared {
    fn parameters(&self) -> Option<usize> {
        Some(self.parameters)
    }
}

impl Display for SqlitePrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}
