//! Query logging sink.

use tracing::info;

/// Receives each successfully executed statement, rendered with its
/// bound values inline.
pub trait QueryLog {
    /// Records one statement.
    fn log_query(&self, sql: &str);
}

impl<F: Fn(&str)> QueryLog for F {
    fn log_query(&self, sql: &str) {
        self(sql);
    }
}

/// Emits each statement as an `info` event on the `oxide_stmt::query` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingQueryLog;

impl QueryLog for TracingQueryLog {
    fn log_query(&self, sql: &str) {
        info!(target: "oxide_stmt::query", sql = %sql, "query executed");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn test_closure_sink() {
        let seen = RefCell::new(Vec::new());
        let sink = |sql: &str| seen.borrow_mut().push(String::from(sql));
        sink.log_query("SELECT 1;");
        TracingQueryLog.log_query("SELECT 2;");
        assert_eq!(seen.into_inner(), vec![String::from("SELECT 1;")]);
    }
}
