//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.

use serde::Serialize;
use std::fmt;

/// Role of a container in the test topology.
///
/// Produced only by [`NamingConvention::classify`](crate::domain::services::NamingConvention::classify),
/// so every call site agrees on what a container is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContainerRole {
    /// The SQL proxy (image name carries the proxy marker)
    Proxy,
    /// A MySQL backend whose name encodes its hostgroup
    Backend { hostgroup: u32 },
    /// Not a proxy, and the name does not follow `BACKEND<N>HOSTGROUP<M>`
    Unrecognized,
}

impl ContainerRole {
    pub fn hostgroup(&self) -> Option<u32> {
        match self {
            Self::Backend { hostgroup } => Some(*hostgroup),
            _ => None,
        }
    }
}

/// Status column of a `mysql_servers` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServerStatus {
    Online,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column value returned by a query.
///
/// The text protocol hands most values back as bytes, so the accessors
/// parse textual numbers as well as native integers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of the value, if it has one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            Self::Bytes(b) => std::str::from_utf8(b).ok()?.trim().parse().ok(),
            Self::Float(_) | Self::Null => None,
        }
    }

    /// Text view of the value (numbers are formatted).
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Int(v) => Some(v.to_string()),
            Self::UInt(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Bytes(v.as_bytes().to_vec())
    }
}

/// Result rows in server order.
pub type Rows = Vec<Vec<SqlValue>>;
