//! Harness Configuration
//!
//! Loaded once from `PROXYSQL_HARNESS_*` environment variables (plus
//! `DOCKER_HOST` and `DEBUG`) into an immutable [`HarnessConfig`].

use crate::domain::entities::{Credentials, Endpoint};
use std::path::PathBuf;
use std::time::Duration;

/// How to reach the Docker daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerConnection {
    /// Platform defaults (`/var/run/docker.sock` on unix)
    LocalDefaults,
    /// Unix socket at the given path
    Socket(String),
    /// `tcp://` or `http://` address
    Http(String),
}

impl DockerConnection {
    /// Interpret a `DOCKER_HOST` value.
    pub fn from_docker_host(value: &str) -> Self {
        if let Some(path) = value.strip_prefix("unix://") {
            Self::Socket(path.to_string())
        } else if value.starts_with("tcp://") || value.starts_with("http://") {
            Self::Http(value.to_string())
        } else {
            Self::LocalDefaults
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    // Compose environment
    pub compose_dir: PathBuf,
    pub compose_program: String,
    pub docker: DockerConnection,

    // Topology
    pub proxy_marker: String,
    pub backend_port: u16,
    pub seed_script: String,
    pub ready_command: Vec<String>,

    // Endpoints and per-role credentials
    pub host: String,
    pub admin_port: u16,
    pub admin_credentials: Credentials,
    pub client_port: u16,
    pub client_credentials: Credentials,
    pub backend_credentials: Credentials,

    // Readiness polling
    pub ready_timeout: Duration,
    pub ready_interval: Duration,
    pub ready_max_interval: Duration,

    pub debug: bool,
}

impl HarnessConfig {
    pub fn admin_endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.admin_port)
    }

    pub fn client_endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.client_port)
    }

    /// Command that seeds a backend with its schema dump.
    pub fn seed_command(&self) -> Vec<String> {
        vec!["bash".to_string(), self.seed_script.clone()]
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            compose_dir: PathBuf::from("."),
            compose_program: "docker-compose".to_string(),
            docker: DockerConnection::LocalDefaults,
            proxy_marker: "proxysql".to_string(),
            backend_port: 3306,
            seed_script: "/tmp/import_schema.sh".to_string(),
            ready_command: default_ready_command(),
            host: "127.0.0.1".to_string(),
            admin_port: 6032,
            admin_credentials: Credentials::new("admin", "admin"),
            client_port: 6033,
            client_credentials: Credentials::new("root", "root"),
            backend_credentials: Credentials::new("root", "root"),
            ready_timeout: Duration::from_secs(120),
            ready_interval: Duration::from_millis(500),
            ready_max_interval: Duration::from_millis(8000),
            debug: false,
        }
    }
}

fn default_ready_command() -> Vec<String> {
    ["mysqladmin", "ping", "--silent"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn load_config() -> anyhow::Result<HarnessConfig> {
    let compose_dir = PathBuf::from(env_or("PROXYSQL_HARNESS_COMPOSE_DIR", "."));
    let compose_program = env_or("PROXYSQL_HARNESS_COMPOSE_PROGRAM", "docker-compose");

    let docker = std::env::var("DOCKER_HOST")
        .map(|v| DockerConnection::from_docker_host(&v))
        .unwrap_or(DockerConnection::LocalDefaults);

    let proxy_marker = env_or("PROXYSQL_HARNESS_PROXY_MARKER", "proxysql");
    let backend_port = env_parse("PROXYSQL_HARNESS_BACKEND_PORT", 3306);
    let seed_script = env_or("PROXYSQL_HARNESS_SEED_SCRIPT", "/tmp/import_schema.sh");

    let ready_command = std::env::var("PROXYSQL_HARNESS_READY_COMMAND")
        .map(|v| v.split_whitespace().map(|s| s.to_string()).collect::<Vec<_>>())
        .ok()
        .filter(|cmd| !cmd.is_empty())
        .unwrap_or_else(default_ready_command);

    let host = env_or("PROXYSQL_HARNESS_HOST", "127.0.0.1");

    // Admin interface
    let admin_port = env_parse("PROXYSQL_HARNESS_ADMIN_PORT", 6032);
    let admin_credentials = Credentials::new(
        env_or("PROXYSQL_HARNESS_ADMIN_USER", "admin"),
        env_or("PROXYSQL_HARNESS_ADMIN_PASSWORD", "admin"),
    );

    // Client interface
    let client_port = env_parse("PROXYSQL_HARNESS_CLIENT_PORT", 6033);
    let client_credentials = Credentials::new(
        env_or("PROXYSQL_HARNESS_CLIENT_USER", "root"),
        env_or("PROXYSQL_HARNESS_CLIENT_PASSWORD", "root"),
    );

    // Direct backend access
    let backend_credentials = Credentials::new(
        env_or("PROXYSQL_HARNESS_BACKEND_USER", "root"),
        env_or("PROXYSQL_HARNESS_BACKEND_PASSWORD", "root"),
    );

    let ready_timeout = Duration::from_secs(env_parse("PROXYSQL_HARNESS_READY_TIMEOUT_SECS", 120));
    let ready_interval = Duration::from_millis(env_parse("PROXYSQL_HARNESS_READY_INTERVAL_MS", 500));
    let ready_max_interval =
        Duration::from_millis(env_parse("PROXYSQL_HARNESS_READY_MAX_INTERVAL_MS", 8000));

    if ready_interval.is_zero() {
        anyhow::bail!("PROXYSQL_HARNESS_READY_INTERVAL_MS must be greater than zero");
    }

    let debug = std::env::var("DEBUG").is_ok();

    Ok(HarnessConfig {
        compose_dir,
        compose_program,
        docker,
        proxy_marker,
        backend_port,
        seed_script,
        ready_command,
        host,
        admin_port,
        admin_credentials,
        client_port,
        client_credentials,
        backend_credentials,
        ready_timeout,
        ready_interval,
        ready_max_interval,
        debug,
    })
}
