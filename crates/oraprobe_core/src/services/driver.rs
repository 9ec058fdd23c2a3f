//! Database driver seam and the Oracle client implementation.
//!
//! The probe talks to the database only through [`DatabaseDriver`] and
//! [`DatabaseSession`], so the probe sequence can run against a scripted
//! driver in tests and against the Oracle client library in production.

use crate::error::ProbeError;
use crate::models::ConnectDescriptor;

/// Callback invoked once per result row with the row's single text column.
pub type RowSink<'a> = dyn FnMut(Option<String>) -> Result<(), ProbeError> + 'a;

/// A vendor driver able to open sessions.
pub trait DatabaseDriver {
    /// Check that the client library is loadable and return its version.
    ///
    /// Must fail fast when the library cannot be located.
    fn verify(&self) -> Result<String, ProbeError>;

    /// Open one session. Blocks until the server accepts, rejects, or the
    /// transport gives up.
    fn connect(
        &self,
        descriptor: &ConnectDescriptor,
        password: &str,
    ) -> Result<Box<dyn DatabaseSession>, ProbeError>;

    /// Driver name for logging.
    fn name(&self) -> &'static str;
}

/// One open database session.
///
/// Dropping a session without calling [`DatabaseSession::close`] must still
/// release it.
pub trait DatabaseSession {
    /// Server version banner.
    fn server_version(&self) -> Result<String, ProbeError>;

    /// Execute `sql` and hand each row to `on_row` as it is fetched.
    ///
    /// The cursor is released before the statement, and both are released
    /// before this returns, on success and on error. Returns the number of
    /// rows delivered.
    fn for_each_text_row(&mut self, sql: &str, on_row: &mut RowSink<'_>)
        -> Result<usize, ProbeError>;

    /// Close the session explicitly.
    fn close(self: Box<Self>) -> Result<(), ProbeError>;
}

// ============================================================================
// OracleDriver
// ============================================================================

/// Driver backed by the `oracle` crate (ODPI-C over the Oracle client library).
#[derive(Debug, Default, Clone, Copy)]
pub struct OracleDriver;

impl OracleDriver {
    pub fn new() -> Self {
        Self
    }
}

impl DatabaseDriver for OracleDriver {
    fn verify(&self) -> Result<String, ProbeError> {
        let version = oracle::Version::client()?;
        tracing::debug!(client_version = %version, "Oracle client library loaded");
        Ok(version.to_string())
    }

    fn connect(
        &self,
        descriptor: &ConnectDescriptor,
        password: &str,
    ) -> Result<Box<dyn DatabaseSession>, ProbeError> {
        let connect_string = descriptor.connect_string();
        tracing::debug!(
            host = %descriptor.host,
            port = descriptor.port,
            service = %descriptor.service,
            username = %descriptor.username,
            "Opening Oracle session"
        );

        let conn = oracle::Connection::connect(&descriptor.username, password, &connect_string)?;
        Ok(Box::new(OracleSession { conn }))
    }

    fn name(&self) -> &'static str {
        "OracleDriver"
    }
}

/// An open Oracle session.
pub struct OracleSession {
    conn: oracle::Connection,
}

impl DatabaseSession for OracleSession {
    fn server_version(&self) -> Result<String, ProbeError> {
        let (version, banner) = self.conn.server_version()?;
        tracing::debug!(server_version = %version, "Server version retrieved");
        Ok(banner)
    }

    fn for_each_text_row(
        &mut self,
        sql: &str,
        on_row: &mut RowSink<'_>,
    ) -> Result<usize, ProbeError> {
        let mut stmt = self.conn.statement(sql).build()?;
        let mut row_count = 0;

        // The result set borrows the statement; it is dropped at the end of
        // the loop, which closes the cursor before the statement.
        for row in stmt.query_as::<Option<String>>(&[])? {
            on_row(row?)?;
            row_count += 1;
        }
        tracing::trace!(row_count, "Cursor released");

        stmt.close()?;
        tracing::trace!("Statement released");
        Ok(row_count)
    }

    fn close(self: Box<Self>) -> Result<(), ProbeError> {
        self.conn.close()?;
        tracing::trace!("Session released");
        Ok(())
    }
}

impl std::fmt::Debug for OracleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleSession").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_driver_name() {
        assert_eq!(OracleDriver::new().name(), "OracleDriver");
    }

    /// With no listener on the port, the attempt must fail without hanging,
    /// either at driver verification (no client library) or at connect.
    #[test]
    fn test_oracle_driver_unreachable_server_fails() {
        let driver = OracleDriver::new();
        let descriptor = ConnectDescriptor::new("127.0.0.1", "FREEPDB1", "nobody").with_port(1);

        let result = driver.verify().and_then(|_| driver.connect(&descriptor, "wrong").map(|_| ()));
        let err = result.unwrap_err();
        assert!(
            matches!(err, ProbeError::Driver { .. } | ProbeError::Connection { .. }),
            "unexpected error category: {}",
            err.category()
        );
    }
}
