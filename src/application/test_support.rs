//! In-memory port implementations shared by the application unit tests.

use crate::domain::entities::{ContainerRecord, Credentials, Endpoint, ExecOutput, PortMapping};
use crate::domain::errors::HarnessError;
use crate::domain::ports::{ComposeCommand, ComposeDriver, ContainerRuntime, SqlClient};
use crate::domain::value_objects::{Rows, SqlValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

// ===== Container runtime =====

pub struct FakeRuntime {
    pub containers: Mutex<Vec<ContainerRecord>>,
    /// Responses keyed by `"<container> <command...>"`; unknown commands succeed silently
    pub responses: Mutex<HashMap<String, ExecOutput>>,
    pub execs: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn new(containers: Vec<ContainerRecord>) -> Self {
        Self {
            containers: Mutex::new(containers),
            responses: Mutex::new(HashMap::new()),
            execs: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(&self, container: &str, command: &str, exit_code: i64, stdout: &str) {
        self.responses.lock().unwrap().insert(
            format!("{} {}", container, command),
            ExecOutput {
                exit_code,
                stdout: stdout.to_string(),
            },
        );
    }

    pub fn execs(&self) -> Vec<String> {
        self.execs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerRecord>, HarnessError> {
        Ok(self.containers.lock().unwrap().clone())
    }

    async fn exec(&self, container: &str, command: &[String]) -> Result<ExecOutput, HarnessError> {
        let key = format!("{} {}", container, command.join(" "));
        self.execs.lock().unwrap().push(key.clone());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or(ExecOutput {
                exit_code: 0,
                stdout: String::new(),
            }))
    }
}

// ===== SQL client =====

#[derive(Debug, Clone, PartialEq)]
pub struct SqlCall {
    pub port: u16,
    pub username: String,
    pub database: Option<String>,
    pub statement: String,
}

#[derive(Default)]
pub struct FakeSql {
    pub calls: Mutex<Vec<SqlCall>>,
    /// Statements containing this text fail
    pub fail_on: Mutex<Option<String>>,
    /// Number of pings that fail before pings start succeeding
    pub ping_failures: AtomicU32,
    pub pings: AtomicU32,
}

impl FakeSql {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, fragment: &str) {
        *self.fail_on.lock().unwrap() = Some(fragment.to_string());
    }

    pub fn calls(&self) -> Vec<SqlCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        database: Option<&str>,
        statement: &str,
    ) -> Result<(), HarnessError> {
        self.calls.lock().unwrap().push(SqlCall {
            port: endpoint.port,
            username: credentials.username.clone(),
            database: database.map(|d| d.to_string()),
            statement: statement.to_string(),
        });
        match self.fail_on.lock().unwrap().as_deref() {
            Some(fragment) if statement.contains(fragment) => {
                Err(HarnessError::Sql(format!("statement failed: {}", statement)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SqlClient for FakeSql {
    async fn query(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        database: Option<&str>,
        statement: &str,
        want_result: bool,
    ) -> Result<Option<Rows>, HarnessError> {
        self.record(endpoint, credentials, database, statement)?;
        // every query answers with the port it reached, to tell endpoints apart
        Ok(want_result.then(|| vec![vec![SqlValue::Int(endpoint.port as i64)]]))
    }

    async fn execute_batch(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
        statements: &[String],
    ) -> Result<(), HarnessError> {
        for statement in statements {
            self.record(endpoint, credentials, None, statement)?;
        }
        Ok(())
    }

    async fn ping(&self, endpoint: &Endpoint, _credentials: &Credentials) -> Result<(), HarnessError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        let remaining = self.ping_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.ping_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(HarnessError::Sql(format!("{}: connection refused", endpoint)));
        }
        Ok(())
    }
}

// ===== Compose driver =====

#[derive(Default)]
pub struct FakeCompose {
    pub commands: Mutex<Vec<ComposeCommand>>,
    pub fail_on: Mutex<Option<ComposeCommand>>,
}

impl FakeCompose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<ComposeCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComposeDriver for FakeCompose {
    async fn run(&self, command: ComposeCommand) -> Result<(), HarnessError> {
        self.commands.lock().unwrap().push(command);
        if *self.fail_on.lock().unwrap() == Some(command) {
            return Err(HarnessError::ContainerRuntime(format!(
                "{:?} exited with status 1",
                command
            )));
        }
        Ok(())
    }
}

// ===== Topology fixtures =====

pub const PROXY: &str = "proxysqltests_PROXYSQL_1";
pub const BACKEND_HG0: &str = "proxysqltests_BACKEND1HOSTGROUP0_1";
pub const BACKEND_HG1: &str = "proxysqltests_BACKEND2HOSTGROUP1_1";

pub fn container(name: &str, image: &str, published: Option<u16>) -> ContainerRecord {
    ContainerRecord {
        name: name.to_string(),
        image: image.to_string(),
        running: true,
        ports: published
            .map(|public| {
                vec![PortMapping {
                    private_port: 3306,
                    public_port: Some(public),
                }]
            })
            .unwrap_or_default(),
    }
}

/// Proxy plus one backend in each of hostgroups 0 and 1, both published.
pub fn two_hostgroups() -> FakeRuntime {
    let runtime = FakeRuntime::new(vec![
        container(PROXY, "proxysqltests_proxysql", None),
        container(BACKEND_HG0, "mysql:5.7", Some(13306)),
        container(BACKEND_HG1, "mysql:5.7", Some(13307)),
    ]);
    runtime.respond(
        PROXY,
        "env",
        0,
        "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin\n\
         PROXYSQLTESTS_BACKEND1HOSTGROUP0_1_PORT=tcp://172.17.0.2:3306\n\
         PROXYSQLTESTS_BACKEND1HOSTGROUP0_1_PORT_3306_TCP_ADDR=172.17.0.2\n\
         PROXYSQLTESTS_BACKEND2HOSTGROUP1_1_PORT=tcp://172.17.0.3:3306\n\
         PROXYSQLTESTS_BACKEND2HOSTGROUP1_1_PORT_3306_TCP_ADDR=172.17.0.3\n\n",
    );
    runtime
}
