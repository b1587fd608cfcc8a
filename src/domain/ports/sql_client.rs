//! SQL Client Port
//!
//! Defines the interface for talking MySQL protocol to the proxy's admin and
//! client endpoints and to backends directly.

use crate::domain::entities::{Credentials, Endpoint};
use crate::domain::errors::HarnessError;
use crate::domain::value_objects::Rows;
use async_trait::async_trait;

/// MySQL-protocol client.
///
/// Every call opens its own session and closes it before returning,
/// whether the call succeeded or not.
#[async_trait]
pub trait SqlClient: Send + Sync {
    /// Run one statement. Rows are fetched only when `want_result` is set.
    async fn query(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        database: Option<&str>,
        statement: &str,
        want_result: bool,
    ) -> Result<Option<Rows>, HarnessError>;

    /// Run statements in order on a single session, stopping at the first
    /// failure. Statements already executed are not rolled back.
    async fn execute_batch(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        statements: &[String],
    ) -> Result<(), HarnessError>;

    /// Open a session and close it again.
    async fn ping(&self, endpoint: &Endpoint, credentials: &Credentials) -> Result<(), HarnessError>;
}
