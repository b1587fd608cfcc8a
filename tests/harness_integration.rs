//! Integration tests for the Harness with in-memory ports
//!
//! Drives setup, proxy configuration and query routing through the public
//! API against a simulated two-shard environment.

use async_trait::async_trait;
use proxysql_harness::application::EnvironmentInspector;
use proxysql_harness::domain::entities::{ContainerRecord, ExecOutput, PortMapping};
use proxysql_harness::domain::services::{hostgroup_of, port_of};
use proxysql_harness::{
    ComposeCommand, ComposeDriver, ContainerRuntime, Credentials, Endpoint, Harness,
    HarnessConfig, HarnessError, LifecycleState, NamingConvention, Rows, SetupStep, SqlClient,
    SqlValue,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PROXY: &str = "shardtests_PROXYSQL_1";
const SHARD0: &str = "shardtests_BACKEND1HOSTGROUP0_1";
const SHARD1: &str = "shardtests_BACKEND2HOSTGROUP1_1";
const SHARD0_PORT: u16 = 23306;
const SHARD1_PORT: u16 = 23307;

// ===== Simulated environment =====

struct Runtime {
    containers: Vec<ContainerRecord>,
    env: String,
}

impl Runtime {
    fn two_shards() -> Self {
        let record = |name: &str, image: &str, published: Option<u16>| ContainerRecord {
            name: name.to_string(),
            image: image.to_string(),
            running: true,
            ports: vec![PortMapping {
                private_port: 3306,
                public_port: published,
            }],
        };

        Self {
            containers: vec![
                record(PROXY, "proxysql/proxysql:2.5", None),
                record(SHARD0, "mysql:5.7", Some(SHARD0_PORT)),
                record(SHARD1, "mysql:5.7", Some(SHARD1_PORT)),
            ],
            env: format!(
                "HOSTNAME=proxy\n\
                 {0}_PORT=tcp://10.1.0.2:3306\n\
                 {0}_PORT_3306_TCP_ADDR=10.1.0.2\n\
                 {1}_PORT=tcp://10.1.0.3:3306\n\
                 {1}_PORT_3306_TCP_ADDR=10.1.0.3\n",
                SHARD0.to_uppercase(),
                SHARD1.to_uppercase()
            ),
        }
    }
}

#[async_trait]
impl ContainerRuntime for Runtime {
    async fn list_containers(&self) -> Result<Vec<ContainerRecord>, HarnessError> {
        Ok(self.containers.clone())
    }

    async fn exec(&self, _container: &str, command: &[String]) -> Result<ExecOutput, HarnessError> {
        let stdout = if command == ["env"] {
            self.env.clone()
        } else {
            String::new()
        };
        Ok(ExecOutput {
            exit_code: 0,
            stdout,
        })
    }
}

/// A proxy on 6033 in front of two shard servers. Writes through the proxy
/// land on hostgroup 0, the only hostgroup with query rules in this setup.
#[derive(Default)]
struct ShardedSql {
    admin_statements: Mutex<Vec<String>>,
    tables: Mutex<HashMap<u16, Vec<String>>>,
}

impl ShardedSql {
    fn shard_for(port: u16) -> u16 {
        if port == 6033 {
            SHARD0_PORT
        } else {
            port
        }
    }

    fn routed(&self) -> bool {
        self.admin_statements
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.starts_with("LOAD MYSQL SERVERS"))
    }
}

#[async_trait]
impl SqlClient for ShardedSql {
    async fn query(
        &self,
        endpoint: &Endpoint,
        _credentials: &Credentials,
        _database: Option<&str>,
        statement: &str,
        want_result: bool,
    ) -> Result<Option<Rows>, HarnessError> {
        if endpoint.port == 6033 && !self.routed() {
            return Err(HarnessError::Sql("no servers loaded to runtime".to_string()));
        }

        let shard = Self::shard_for(endpoint.port);
        let rows: Rows = if let Some(value) = statement.strip_prefix("INSERT INTO t VALUES ") {
            self.tables
                .lock()
                .unwrap()
                .entry(shard)
                .or_default()
                .push(value.to_string());
            Vec::new()
        } else if statement == "SELECT v FROM t" {
            self.tables
                .lock()
                .unwrap()
                .get(&shard)
                .map(|values| values.iter().map(|v| vec![SqlValue::from(v.as_str())]).collect())
                .unwrap_or_default()
        } else {
            vec![vec![SqlValue::Int(1)]]
        };

        Ok(want_result.then_some(rows))
    }

    async fn execute_batch(
        &self,
        endpoint: &Endpoint,
        _credentials: &Credentials,
        statements: &[String],
    ) -> Result<(), HarnessError> {
        assert_eq!(endpoint.port, 6032, "configuration goes to the admin port");
        self.admin_statements
            .lock()
            .unwrap()
            .extend(statements.iter().cloned());
        Ok(())
    }

    async fn ping(&self, _endpoint: &Endpoint, _credentials: &Credentials) -> Result<(), HarnessError> {
        Ok(())
    }
}

#[derive(Default)]
struct Compose {
    commands: Mutex<Vec<ComposeCommand>>,
    fail_on: Option<ComposeCommand>,
}

#[async_trait]
impl ComposeDriver for Compose {
    async fn run(&self, command: ComposeCommand) -> Result<(), HarnessError> {
        self.commands.lock().unwrap().push(command);
        if self.fail_on == Some(command) {
            return Err(HarnessError::ContainerRuntime("exit status: 1".to_string()));
        }
        Ok(())
    }
}

fn config() -> HarnessConfig {
    HarnessConfig {
        ready_timeout: Duration::from_secs(2),
        ready_interval: Duration::from_millis(1),
        ready_max_interval: Duration::from_millis(4),
        ..HarnessConfig::default()
    }
}

fn harness(sql: Arc<ShardedSql>, compose: Arc<Compose>) -> Harness {
    Harness::new(&config(), Arc::new(Runtime::two_shards()), sql, compose)
}

// ===== Scenarios =====

#[tokio::test]
async fn test_select_one_through_proxy_after_setup() {
    let sql = Arc::new(ShardedSql::default());
    let mut harness = harness(sql.clone(), Arc::new(Compose::default()));

    let entries = harness.setup().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(harness.state(), LifecycleState::Configured);

    let rows = harness.run_via_proxy("SELECT 1", "test", true).await.unwrap();
    let rows = rows.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0].as_i64(), Some(1));

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_insert_via_proxy_visible_on_hostgroup_zero_only() {
    let sql = Arc::new(ShardedSql::default());
    let mut harness = harness(sql, Arc::new(Compose::default()));
    harness.setup().await.unwrap();

    harness
        .run_via_proxy("INSERT INTO t VALUES ('a')", "test", false)
        .await
        .unwrap();

    let shard0 = harness
        .run_via_backend("SELECT v FROM t", "test", true, 0)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shard0, vec![vec![SqlValue::from("('a')")]]);

    let shard1 = harness
        .run_via_backend("SELECT v FROM t", "test", true, 1)
        .await
        .unwrap()
        .unwrap();
    assert!(shard1.is_empty());

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_setup_registers_each_backend_then_loads_runtime() {
    let sql = Arc::new(ShardedSql::default());
    let mut harness = harness(sql.clone(), Arc::new(Compose::default()));
    harness.setup().await.unwrap();

    let statements = sql.admin_statements.lock().unwrap().clone();
    assert_eq!(statements.len(), 3);
    assert!(statements[0].contains("VALUES(0, '10.1.0.2', 3306, 'ONLINE')"));
    assert!(statements[1].contains("VALUES(1, '10.1.0.3', 3306, 'ONLINE')"));
    assert_eq!(statements[2], "LOAD MYSQL SERVERS TO RUNTIME");

    harness.teardown().await.unwrap();
}

#[tokio::test]
async fn test_query_before_configuration_fails_through_proxy() {
    let harness = harness(Arc::new(ShardedSql::default()), Arc::new(Compose::default()));
    let err = harness.run_via_proxy("SELECT 1", "test", true).await.unwrap_err();
    assert!(matches!(err, HarnessError::Sql(_)));
}

#[tokio::test]
async fn test_missing_hostgroup_is_reported() {
    let harness = harness(Arc::new(ShardedSql::default()), Arc::new(Compose::default()));
    let err = harness
        .run_via_backend("SELECT 1", "test", true, 7)
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::NoBackendInHostgroup { hostgroup: 7 }));
}

#[tokio::test]
async fn test_failed_build_aborts_setup() {
    let compose = Arc::new(Compose {
        fail_on: Some(ComposeCommand::Build),
        ..Compose::default()
    });
    let mut harness = harness(Arc::new(ShardedSql::default()), compose.clone());

    let err = harness.setup().await.unwrap_err();
    assert_eq!(err.step(), Some(SetupStep::Build));
    assert!(!compose.commands.lock().unwrap().contains(&ComposeCommand::Up));

    harness.teardown().await.unwrap();
}

#[tokio::test]
async fn test_teardown_twice() {
    let compose = Arc::new(Compose::default());
    let mut harness = harness(Arc::new(ShardedSql::default()), compose.clone());

    harness.teardown().await.unwrap();
    harness.teardown().await.unwrap();

    assert_eq!(
        *compose.commands.lock().unwrap(),
        vec![
            ComposeCommand::Stop,
            ComposeCommand::Remove,
            ComposeCommand::Stop,
            ComposeCommand::Remove
        ]
    );
}

#[tokio::test]
async fn test_read_environment_ignores_blank_lines() {
    struct EnvOnly;

    #[async_trait]
    impl ContainerRuntime for EnvOnly {
        async fn list_containers(&self) -> Result<Vec<ContainerRecord>, HarnessError> {
            Ok(Vec::new())
        }

        async fn exec(&self, _container: &str, _command: &[String]) -> Result<ExecOutput, HarnessError> {
            Ok(ExecOutput {
                exit_code: 0,
                stdout: "A=1\nB=2\n\n".to_string(),
            })
        }
    }

    let inspector = EnvironmentInspector::new(Arc::new(EnvOnly), NamingConvention::new("proxysql"));
    let env = inspector.read_environment("any").await.unwrap();

    let expected: HashMap<String, String> = [("A", "1"), ("B", "2")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(env, expected);
}

#[test]
fn test_port_and_hostgroup_parsing() {
    assert_eq!(port_of("mysql://10.0.0.5:3307").unwrap(), 3307);
    assert_eq!(hostgroup_of(SHARD1).unwrap(), 1);
    assert!(matches!(
        hostgroup_of("shardtests_MEMCACHED_1"),
        Err(HarnessError::TopologyParse(_))
    ));
}
