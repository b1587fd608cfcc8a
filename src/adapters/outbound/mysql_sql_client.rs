//! MySQL SQL Client
//!
//! Implements SqlClient with mysql_async. ProxySQL speaks the MySQL
//! protocol on both its admin and client ports, so one adapter serves the
//! proxy and the backends alike.

use crate::domain::entities::{Credentials, Endpoint};
use crate::domain::errors::HarnessError;
use crate::domain::ports::SqlClient;
use crate::domain::value_objects::{Rows, SqlValue};
use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder, Row, Value};

/// A server session that must be released on every exit path.
#[async_trait]
trait Session: Send + Sized {
    async fn release(self) -> Result<(), String>;
}

#[async_trait]
impl Session for Conn {
    async fn release(self) -> Result<(), String> {
        self.disconnect().await.map_err(|e| e.to_string())
    }
}

/// Release a session, keeping the operation's own result.
async fn close_session<S: Session, T>(
    session: S,
    endpoint: &Endpoint,
    result: Result<T, HarnessError>,
) -> Result<T, HarnessError> {
    if let Err(e) = session.release().await {
        tracing::warn!("closing session to {}: {}", endpoint, e);
    }
    result
}

#[derive(Debug, Default, Clone)]
pub struct MysqlSqlClient;

impl MysqlSqlClient {
    pub fn new() -> Self {
        Self
    }

    async fn connect(
        endpoint: &Endpoint,
        credentials: &Credentials,
        database: Option<&str>,
    ) -> Result<Conn, HarnessError> {
        let opts = OptsBuilder::default()
            .ip_or_hostname(endpoint.host.clone())
            .tcp_port(endpoint.port)
            .user(Some(credentials.username.clone()))
            .pass(Some(credentials.password.clone()))
            .db_name(database.map(|d| d.to_string()));

        Conn::new(opts)
            .await
            .map_err(|e| HarnessError::Sql(format!("connecting to {}: {}", endpoint, e)))
    }

    async fn run_query(
        conn: &mut Conn,
        endpoint: &Endpoint,
        statement: &str,
        want_result: bool,
    ) -> Result<Option<Rows>, HarnessError> {
        let sql_err = |e: mysql_async::Error| HarnessError::Sql(format!("{} on {}: {}", statement, endpoint, e));

        if !want_result {
            conn.query_drop(statement).await.map_err(sql_err)?;
            return Ok(None);
        }

        let rows: Vec<Row> = conn.query(statement).await.map_err(sql_err)?;
        Ok(Some(rows.iter().map(convert_row).collect()))
    }

    async fn run_batch(
        conn: &mut Conn,
        endpoint: &Endpoint,
        statements: &[String],
    ) -> Result<(), HarnessError> {
        for statement in statements {
            conn.query_drop(statement.as_str()).await.map_err(|e| {
                HarnessError::Sql(format!("{} on {}: {}", statement, endpoint, e))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl SqlClient for MysqlSqlClient {
    async fn query(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        database: Option<&str>,
        statement: &str,
        want_result: bool,
    ) -> Result<Option<Rows>, HarnessError> {
        let mut conn = Self::connect(endpoint, credentials, database).await?;
        let result = Self::run_query(&mut conn, endpoint, statement, want_result).await;
        close_session(conn, endpoint, result).await
    }

    async fn execute_batch(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        statements: &[String],
    ) -> Result<(), HarnessError> {
        let mut conn = Self::connect(endpoint, credentials, None).await?;
        let result = Self::run_batch(&mut conn, endpoint, statements).await;
        close_session(conn, endpoint, result).await
    }

    async fn ping(&self, endpoint: &Endpoint, credentials: &Credentials) -> Result<(), HarnessError> {
        let mut conn = Self::connect(endpoint, credentials, None).await?;
        let result = conn
            .ping()
            .await
            .map_err(|e| HarnessError::Sql(format!("ping {}: {}", endpoint, e)));
        close_session(conn, endpoint, result).await
    }
}

fn convert_row(row: &Row) -> Vec<SqlValue> {
    (0..row.len())
        .map(|i| row.as_ref(i).map(convert_value).unwrap_or(SqlValue::Null))
        .collect()
}

fn convert_value(value: &Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Bytes(bytes) => SqlValue::Bytes(bytes.clone()),
        Value::Int(v) => SqlValue::Int(*v),
        Value::UInt(v) => SqlValue::UInt(*v),
        Value::Float(v) => SqlValue::Float(f64::from(*v)),
        Value::Double(v) => SqlValue::Float(*v),
        Value::Date(year, month, day, hour, minute, second, micros) => SqlValue::Bytes(
            format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
                year, month, day, hour, minute, second, micros
            )
            .into_bytes(),
        ),
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = u32::from(*hours) + days * 24;
            SqlValue::Bytes(
                format!(
                    "{}{:02}:{:02}:{:02}.{:06}",
                    if *negative { "-" } else { "" },
                    total_hours,
                    minutes,
                    seconds,
                    micros
                )
                .into_bytes(),
            )
        }
    }
}
