//! Topology Resolver
//!
//! Turns container records into backend descriptors. Nothing is cached:
//! each call lists the containers again so the result reflects the
//! runtime at the moment of the call.

use crate::application::EnvironmentInspector;
use crate::domain::entities::{BackendCandidate, BackendDescriptor};
use crate::domain::errors::HarnessError;
use crate::domain::services::resolve_address;
use std::sync::Arc;

pub struct TopologyResolver {
    inspector: Arc<EnvironmentInspector>,
    /// MySQL port inside backend containers
    backend_port: u16,
}

impl TopologyResolver {
    pub fn new(inspector: Arc<EnvironmentInspector>, backend_port: u16) -> Self {
        Self {
            inspector,
            backend_port,
        }
    }

    pub fn inspector(&self) -> &EnvironmentInspector {
        &self.inspector
    }

    /// Every backend with its hostgroup and its address as seen by the proxy.
    ///
    /// Addresses come from the proxy container's link environment. A backend
    /// whose name or link variables cannot be decoded fails the whole call.
    pub async fn resolve_backends(&self) -> Result<Vec<BackendDescriptor>, HarnessError> {
        let proxy = self.inspector.proxy_container().await?;
        let env = self.inspector.read_environment(&proxy.name).await?;

        let mut descriptors = Vec::new();
        for (container, hostgroup) in self.inspector.list_backends().await? {
            let (ip, port) = resolve_address(&env, &container.name)?;

            tracing::debug!(
                "backend {} -> hostgroup={} addr={}:{}",
                container.name,
                hostgroup,
                ip,
                port
            );

            descriptors.push(BackendDescriptor {
                published_port: container.published_port(self.backend_port),
                container_name: container.name,
                hostgroup,
                ip,
                port,
            });
        }

        Ok(descriptors)
    }

    /// Backends in `hostgroup` whose MySQL port is published on the host.
    ///
    /// Backends in other hostgroups are still name-checked, so a misnamed
    /// container is reported rather than silently ignored.
    pub async fn direct_candidates(
        &self,
        hostgroup: u32,
    ) -> Result<Vec<BackendCandidate>, HarnessError> {
        let mut candidates = Vec::new();
        for (container, backend_hostgroup) in self.inspector.list_backends().await? {
            if backend_hostgroup != hostgroup {
                continue;
            }
            if let Some(published_port) = container.published_port(self.backend_port) {
                candidates.push(BackendCandidate {
                    container_name: container.name,
                    hostgroup: backend_hostgroup,
                    published_port,
                });
            }
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::*;
    use crate::domain::services::NamingConvention;

    fn resolver(runtime: FakeRuntime) -> TopologyResolver {
        let inspector = EnvironmentInspector::new(Arc::new(runtime), NamingConvention::new("proxysql"));
        TopologyResolver::new(Arc::new(inspector), 3306)
    }

    // ===== resolve_backends Tests =====

    #[tokio::test]
    async fn test_resolve_backends() {
        let backends = resolver(two_hostgroups()).resolve_backends().await.unwrap();

        assert_eq!(backends.len(), 2);
        assert_eq!(
            backends[0],
            BackendDescriptor {
                container_name: BACKEND_HG0.to_string(),
                hostgroup: 0,
                ip: "172.17.0.2".to_string(),
                port: 3306,
                published_port: Some(13306),
            }
        );
        assert_eq!(backends[1].hostgroup, 1);
        assert_eq!(backends[1].ip, "172.17.0.3");
    }

    #[tokio::test]
    async fn test_resolve_backends_without_proxy() {
        let runtime = FakeRuntime::new(vec![container(BACKEND_HG0, "mysql", Some(13306))]);
        let err = resolver(runtime).resolve_backends().await.unwrap_err();
        assert!(matches!(err, HarnessError::NoProxyFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_backends_misnamed_backend() {
        let runtime = two_hostgroups();
        runtime
            .containers
            .lock()
            .unwrap()
            .push(container("proxysqltests_MYSQL_1", "mysql", None));

        let err = resolver(runtime).resolve_backends().await.unwrap_err();
        assert!(matches!(err, HarnessError::TopologyParse(_)));
    }

    #[tokio::test]
    async fn test_resolve_backends_missing_link_variables() {
        let runtime = two_hostgroups();
        runtime.respond(PROXY, "env", 0, "PATH=/usr/bin\n");

        let err = resolver(runtime).resolve_backends().await.unwrap_err();
        assert!(matches!(err, HarnessError::AddressResolution(_)));
    }

    #[tokio::test]
    async fn test_resolve_backends_reflects_current_runtime() {
        let runtime = Arc::new(two_hostgroups());
        let inspector = EnvironmentInspector::new(runtime.clone(), NamingConvention::new("proxysql"));
        let resolver = TopologyResolver::new(Arc::new(inspector), 3306);

        assert_eq!(resolver.resolve_backends().await.unwrap().len(), 2);

        runtime
            .containers
            .lock()
            .unwrap()
            .retain(|c| c.name != BACKEND_HG1);
        assert_eq!(resolver.resolve_backends().await.unwrap().len(), 1);
    }

    // ===== direct_candidates Tests =====

    #[tokio::test]
    async fn test_direct_candidates_by_hostgroup() {
        let resolver = resolver(two_hostgroups());

        let hg0 = resolver.direct_candidates(0).await.unwrap();
        assert_eq!(hg0.len(), 1);
        assert_eq!(hg0[0].container_name, BACKEND_HG0);
        assert_eq!(hg0[0].published_port, 13306);

        let hg1 = resolver.direct_candidates(1).await.unwrap();
        assert_eq!(hg1[0].published_port, 13307);

        assert!(resolver.direct_candidates(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_direct_candidates_skip_unpublished() {
        let runtime = two_hostgroups();
        runtime.containers.lock().unwrap().push(container(
            "proxysqltests_BACKEND3HOSTGROUP0_1",
            "mysql:5.7",
            None,
        ));

        let hg0 = resolver(runtime).direct_candidates(0).await.unwrap();
        assert_eq!(hg0.len(), 1);
        assert_eq!(hg0[0].container_name, BACKEND_HG0);
    }
}
