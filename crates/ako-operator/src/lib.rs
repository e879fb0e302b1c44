//! # AKO Kubernetes Operator
//!
//! Kubernetes operator that deploys and manages the Avi Kubernetes Operator
//! (AKO) ingress controller from a single `AKOConfig` custom resource.
//!
//! ## Features
//!
//! - **Custom Resource Definition**: `AKOConfig` describes one AKO deployment
//! - **Deterministic builders**: the same spec always yields the same objects,
//!   so an unchanged source produces no writes
//! - **Hot/cold configuration**: ConfigMap changes restart the AKO workload
//!   only when a value AKO cannot pick up live has changed
//! - **Optional objects**: PodSecurityPolicy and GatewayClass follow their flags
//! - **Rule CRDs**: `HostRule`, `HTTPRule` and `AviInfraSetting` definitions are
//!   installed on first reconcile
//! - **Complete cleanup**: deleting the `AKOConfig` removes every managed
//!   object, also after an operator restart
//! - **Observability**: Prometheus-compatible operator metrics
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ako_operator::prelude::*;
//! use kube::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::try_default().await?;
//!     run_controller(client, None).await
//! }
//! ```
//!
//! ## Architecture
//!
//! One reconcile pass runs, in order: ConfigMap, ServiceAccount, ClusterRole,
//! ClusterRoleBinding, PodSecurityPolicy, rule CRDs, GatewayClass and the AKO
//! StatefulSet. Each step fetches the live object, builds the desired one and
//! writes only when the change classifier asks for it. A cold ConfigMap
//! change marks the session for restart; the StatefulSet step then deletes
//! and re-creates the workload.
//!
//! ## Modules
//!
//! - [`crd`] - `AKOConfig` types with validation
//! - [`resources`] - desired-state builders
//! - [`classify`] - per-kind change classifiers and the ConfigMap checksum
//! - [`reconcilers`] - per-resource reconcile steps
//! - [`session`] - object registry and restart coordinator
//! - [`cleanup`] - deletion and rediscovery of managed objects
//! - [`crd_installer`] - rule CRD installation
//! - [`store`] - object store seam over the Kubernetes API
//! - [`controller`] - controller setup, finalizer and status handling
//! - [`health`] - liveness and readiness probe endpoints
//! - [`error`] - Error types for operator operations
//!
//! ## Example
//!
//! ```yaml
//! apiVersion: ako.vmware.com/v1alpha1
//! kind: AKOConfig
//! metadata:
//!   name: ako-config
//!   namespace: avi-system
//! spec:
//!   imageRepository: projects.registry.vmware.com/ako/ako:1.12.1
//!   akoSettings:
//!     clusterName: my-cluster
//!     cniPlugin: calico
//!   controllerSettings:
//!     controllerIP: 10.10.10.11
//!     cloudName: Default-Cloud
//!   l7Settings:
//!     serviceType: NodePort
//!   nodePortSelector:
//!     key: node
//!     value: ingress
//! ```
//!
//! ## Metrics
//!
//! - `ako_operator_reconciliations_total` - Total reconciliation attempts
//! - `ako_operator_reconciliation_errors_total` - Reconciliation errors
//! - `ako_operator_reconciliation_duration_seconds` - Reconciliation latency
//! - `ako_operator_workload_restarts_total` - AKO StatefulSet re-creations

pub mod classify;
pub mod cleanup;
pub mod controller;
pub mod crd;
pub mod crd_installer;
pub mod error;
pub mod external;
pub mod health;
pub mod names;
pub mod rbac;
pub mod reconcilers;
pub mod resources;
pub mod session;
pub mod store;

pub mod prelude {
    //! Re-exports for convenient usage
    pub use crate::controller::{run_controller, ControllerContext, ControllerMetrics};
    pub use crate::crd::{AKOConfig, AKOConfigSpec, AKOConfigStatus, ConfigState};
    pub use crate::error::{OperatorError, Result};
    pub use crate::resources::ResourceBuilder;
    pub use crate::session::{ObjectRegistry, RestartCoordinator, SessionState};
    pub use crate::store::{KubeStore, ObjectStore};
}
