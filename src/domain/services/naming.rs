//! Naming Convention
//!
//! The compose environment carries no topology file. Roles, hostgroups and
//! addresses are all encoded in names, and this module is the only place
//! that decodes them:
//!
//! - a container whose compose service name (the second `_`-separated
//!   segment of the container name) matches `BACKEND<N>HOSTGROUP<M>` is a
//!   backend in hostgroup `M`, whatever its image is called;
//! - otherwise a container whose image contains the proxy marker is the
//!   proxy;
//! - any other container is unrecognized.
//! - the proxy's link environment publishes each backend as
//!   `<NAME>_PORT=tcp://<ip>:<port>` and `<NAME>_PORT_<port>_TCP_ADDR=<ip>`,
//!   with `<NAME>` the uppercased container name.
//!
//! Pure logic, no I/O.

use crate::domain::entities::ContainerRecord;
use crate::domain::errors::HarnessError;
use crate::domain::value_objects::ContainerRole;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const BACKEND_PATTERN: &str = r"BACKEND(\d+)HOSTGROUP(\d+)";

fn backend_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(BACKEND_PATTERN).expect("backend pattern is a valid regex"))
}

/// Classifies containers by image and name.
#[derive(Debug, Clone)]
pub struct NamingConvention {
    proxy_marker: String,
}

impl NamingConvention {
    pub fn new(proxy_marker: impl Into<String>) -> Self {
        Self {
            proxy_marker: proxy_marker.into(),
        }
    }

    pub fn proxy_marker(&self) -> &str {
        &self.proxy_marker
    }

    /// Whether an image belongs to the proxy.
    pub fn is_proxy_image(&self, image: &str) -> bool {
        image.contains(&self.proxy_marker)
    }

    /// Decide the role of a container.
    ///
    /// The backend name is checked before the image: compose names built
    /// images after the project, so a project called `proxysqltests` gives
    /// every backend image the marker too.
    pub fn classify(&self, container: &ContainerRecord) -> ContainerRole {
        self.try_classify(container)
            .unwrap_or(ContainerRole::Unrecognized)
    }

    /// Same as [`classify`](Self::classify), but an unrecognized container
    /// is a `TopologyParse` error explaining why its name did not decode.
    pub fn try_classify(&self, container: &ContainerRecord) -> Result<ContainerRole, HarnessError> {
        match hostgroup_of(&container.name) {
            Ok(hostgroup) => Ok(ContainerRole::Backend { hostgroup }),
            Err(_) if self.is_proxy_image(&container.image) => Ok(ContainerRole::Proxy),
            Err(e) => Err(e),
        }
    }
}

/// Hostgroup encoded in a backend container name.
///
/// `proxysqltests_BACKEND1HOSTGROUP0_1` is in hostgroup 0. The match is
/// case-insensitive on the name since link variables use the uppercased form.
pub fn hostgroup_of(container_name: &str) -> Result<u32, HarnessError> {
    let upper = container_name.to_uppercase();
    let service = upper.split('_').nth(1).ok_or_else(|| {
        HarnessError::TopologyParse(format!(
            "container name '{}' has no service segment",
            container_name
        ))
    })?;

    let captures = backend_pattern().captures(service).ok_or_else(|| {
        HarnessError::TopologyParse(format!(
            "service '{}' of container '{}' does not match {}",
            service, container_name, BACKEND_PATTERN
        ))
    })?;

    captures[2].parse().map_err(|e| {
        HarnessError::TopologyParse(format!(
            "hostgroup '{}' in container '{}': {}",
            &captures[2], container_name, e
        ))
    })
}

/// Port of a `scheme://host:port` URI.
///
/// Only the third `:`-separated segment is looked at; scheme and host are
/// not validated.
pub fn port_of(uri: &str) -> Result<u16, HarnessError> {
    let segment = uri.split(':').nth(2).ok_or_else(|| {
        HarnessError::AddressResolution(format!("uri '{}' has no port segment", uri))
    })?;
    segment
        .parse()
        .map_err(|e| HarnessError::AddressResolution(format!("port in uri '{}': {}", uri, e)))
}

/// Parse `env` output into a map.
///
/// Lines are trimmed and blank lines skipped. A line that does not split
/// into exactly one key and one value on `=` is rejected.
pub fn parse_environment(output: &str) -> Result<HashMap<String, String>, HarnessError> {
    let mut result = HashMap::new();
    for line in output.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => {
                result.insert(key.to_string(), value.to_string());
            }
            _ => {
                return Err(HarnessError::TopologyParse(format!(
                    "environment line '{}' is not KEY=VALUE",
                    line
                )))
            }
        }
    }
    Ok(result)
}

/// Internal address of a backend, read from the proxy's link environment.
///
/// The port comes from `<NAME>_PORT`, and the port is part of the key that
/// holds the IP, so the lookups must happen in that order.
pub fn resolve_address(
    env: &HashMap<String, String>,
    container_name: &str,
) -> Result<(String, u16), HarnessError> {
    let name = container_name.to_uppercase();

    let port_key = format!("{}_PORT", name);
    let uri = env.get(&port_key).ok_or_else(|| {
        HarnessError::AddressResolution(format!("{} is not set in the proxy environment", port_key))
    })?;
    let port = port_of(uri)?;

    let addr_key = format!("{}_PORT_{}_TCP_ADDR", name, port);
    let ip = env.get(&addr_key).ok_or_else(|| {
        HarnessError::AddressResolution(format!("{} is not set in the proxy environment", addr_key))
    })?;

    Ok((ip.clone(), port))
}
