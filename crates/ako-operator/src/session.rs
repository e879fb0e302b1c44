//! Per-source reconcile state
//!
//! Each `AKOConfig` gets one [`SessionState`] holding the restart flag and the
//! registry of every object the operator wrote for it. The state is process
//! local; after an operator restart cleanup falls back to rediscovery.

use crate::error::Result;
use crate::external::{GatewayClass, PodSecurityPolicy};
use crate::store::ObjectStore;
use dashmap::DashMap;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::ResourceExt;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Every kind of object the operator manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    ConfigMap,
    ServiceAccount,
    ClusterRole,
    ClusterRoleBinding,
    PodSecurityPolicy,
    CustomResourceDefinition,
    GatewayClass,
    StatefulSet,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::ServiceAccount => "ServiceAccount",
            ResourceKind::ClusterRole => "ClusterRole",
            ResourceKind::ClusterRoleBinding => "ClusterRoleBinding",
            ResourceKind::PodSecurityPolicy => "PodSecurityPolicy",
            ResourceKind::CustomResourceDefinition => "CustomResourceDefinition",
            ResourceKind::GatewayClass => "GatewayClass",
            ResourceKind::StatefulSet => "StatefulSet",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a managed object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    pub kind: ResourceKind,
    /// `None` for cluster-scoped kinds
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectId {
    pub fn new(kind: ResourceKind, namespace: Option<&str>, name: &str) -> Self {
        Self {
            kind,
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// Last-known live object, tagged by kind
#[derive(Debug, Clone)]
pub enum ManagedObject {
    ConfigMap(ConfigMap),
    ServiceAccount(ServiceAccount),
    ClusterRole(ClusterRole),
    ClusterRoleBinding(ClusterRoleBinding),
    PodSecurityPolicy(PodSecurityPolicy),
    CustomResourceDefinition(CustomResourceDefinition),
    GatewayClass(GatewayClass),
    StatefulSet(StatefulSet),
}

impl ManagedObject {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ManagedObject::ConfigMap(_) => ResourceKind::ConfigMap,
            ManagedObject::ServiceAccount(_) => ResourceKind::ServiceAccount,
            ManagedObject::ClusterRole(_) => ResourceKind::ClusterRole,
            ManagedObject::ClusterRoleBinding(_) => ResourceKind::ClusterRoleBinding,
            ManagedObject::PodSecurityPolicy(_) => ResourceKind::PodSecurityPolicy,
            ManagedObject::CustomResourceDefinition(_) => ResourceKind::CustomResourceDefinition,
            ManagedObject::GatewayClass(_) => ResourceKind::GatewayClass,
            ManagedObject::StatefulSet(_) => ResourceKind::StatefulSet,
        }
    }

    pub fn id(&self) -> ObjectId {
        let (namespace, name) = match self {
            ManagedObject::ConfigMap(o) => (o.namespace(), o.name_any()),
            ManagedObject::ServiceAccount(o) => (o.namespace(), o.name_any()),
            ManagedObject::ClusterRole(o) => (None, o.name_any()),
            ManagedObject::ClusterRoleBinding(o) => (None, o.name_any()),
            ManagedObject::PodSecurityPolicy(o) => (None, o.name_any()),
            ManagedObject::CustomResourceDefinition(o) => (None, o.name_any()),
            ManagedObject::GatewayClass(o) => (None, o.name_any()),
            ManagedObject::StatefulSet(o) => (o.namespace(), o.name_any()),
        };
        ObjectId {
            kind: self.kind(),
            namespace,
            name,
        }
    }
}

/// Delete an object by identity with the API of its kind
pub async fn delete_by_id<S: ObjectStore>(store: &S, id: &ObjectId) -> Result<bool> {
    let ns = id.namespace.as_deref();
    let name = id.name.as_str();
    match id.kind {
        ResourceKind::ConfigMap => store.delete::<ConfigMap>(ns, name).await,
        ResourceKind::ServiceAccount => store.delete::<ServiceAccount>(ns, name).await,
        ResourceKind::ClusterRole => store.delete::<ClusterRole>(None, name).await,
        ResourceKind::ClusterRoleBinding => store.delete::<ClusterRoleBinding>(None, name).await,
        ResourceKind::PodSecurityPolicy => store.delete::<PodSecurityPolicy>(None, name).await,
        ResourceKind::CustomResourceDefinition => {
            store.delete::<CustomResourceDefinition>(None, name).await
        }
        ResourceKind::GatewayClass => store.delete::<GatewayClass>(None, name).await,
        ResourceKind::StatefulSet => store.delete::<StatefulSet>(ns, name).await,
    }
}

/// Identity -> last-known live object for every object written for one source
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    entries: DashMap<ObjectId, ManagedObject>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the read-back live object, replacing any earlier entry
    pub fn record(&self, object: ManagedObject) {
        self.entries.insert(object.id(), object);
    }

    pub fn remove(&self, id: &ObjectId) -> Option<ManagedObject> {
        self.entries.remove(id).map(|(_, object)| object)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copy of all entries, sorted by identity. No shard lock outlives the call.
    pub fn snapshot(&self) -> Vec<ManagedObject> {
        let mut objects: Vec<ManagedObject> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        objects.sort_by_key(|object| object.id());
        objects
    }
}

/// State of the restart coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartState {
    Stable,
    RestartPending,
}

/// Restart-required flag shared by the ConfigMap and StatefulSet reconcilers
#[derive(Debug, Default)]
pub struct RestartCoordinator {
    pending: AtomicBool,
}

impl RestartCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cold ConfigMap value changed
    pub fn request_restart(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// The StatefulSet was recreated
    pub fn complete(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> RestartState {
        if self.is_pending() {
            RestartState::RestartPending
        } else {
            RestartState::Stable
        }
    }
}

/// Reconcile session of one source object
#[derive(Debug, Default)]
pub struct SessionState {
    pub restart: RestartCoordinator,
    pub registry: ObjectRegistry,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}
