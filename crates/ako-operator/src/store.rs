//! Object store seam between the reconcilers and the Kubernetes API
//!
//! Reconcilers only talk to an [`ObjectStore`]. [`KubeStore`] is backed by a
//! `kube::Client`; tests use the in-memory store in [`fake`].

use crate::crd::{AKOConfig, AKOConfigStatus};
use crate::error::{is_status, Result};
use crate::external::{GatewayClass, PodSecurityPolicy};
use crate::names;
use crate::session::{ManagedObject, ResourceKind};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

/// A Kubernetes kind the operator reads and writes
pub trait ClusterObject:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: ResourceKind;
    const NAMESPACED: bool;

    /// API handle for this kind, scoped to `namespace` when namespaced
    fn api(client: Client, namespace: Option<&str>) -> Api<Self>;

    fn into_managed(self) -> ManagedObject;

    /// Namespace an object of this kind lives in
    fn scope(namespace: Option<&str>) -> Option<String> {
        if Self::NAMESPACED {
            Some(
                namespace
                    .unwrap_or(names::AVI_SYSTEM_NAMESPACE)
                    .to_string(),
            )
        } else {
            None
        }
    }
}

macro_rules! namespaced_object {
    ($ty:ty, $kind:ident) => {
        impl ClusterObject for $ty {
            const KIND: ResourceKind = ResourceKind::$kind;
            const NAMESPACED: bool = true;

            fn api(client: Client, namespace: Option<&str>) -> Api<Self> {
                Api::namespaced(client, namespace.unwrap_or(names::AVI_SYSTEM_NAMESPACE))
            }

            fn into_managed(self) -> ManagedObject {
                ManagedObject::$kind(self)
            }
        }
    };
}

macro_rules! cluster_object {
    ($ty:ty, $kind:ident) => {
        impl ClusterObject for $ty {
            const KIND: ResourceKind = ResourceKind::$kind;
            const NAMESPACED: bool = false;

            fn api(client: Client, _namespace: Option<&str>) -> Api<Self> {
                Api::all(client)
            }

            fn into_managed(self) -> ManagedObject {
                ManagedObject::$kind(self)
            }
        }
    };
}

namespaced_object!(ConfigMap, ConfigMap);
namespaced_object!(ServiceAccount, ServiceAccount);
namespaced_object!(StatefulSet, StatefulSet);
cluster_object!(ClusterRole, ClusterRole);
cluster_object!(ClusterRoleBinding, ClusterRoleBinding);
cluster_object!(PodSecurityPolicy, PodSecurityPolicy);
cluster_object!(CustomResourceDefinition, CustomResourceDefinition);
cluster_object!(GatewayClass, GatewayClass);

/// Cluster operations used by the reconcilers
///
/// Not-found on `get` is `Ok(None)` and not-found on `delete` is `Ok(false)`;
/// every other API failure is an error.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get<K: ClusterObject>(&self, namespace: Option<&str>, name: &str)
        -> Result<Option<K>>;

    async fn list<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<K>>;

    async fn create<K: ClusterObject>(&self, object: &K) -> Result<K>;

    /// Replace with optimistic concurrency on `resourceVersion`
    async fn replace<K: ClusterObject>(&self, object: &K) -> Result<K>;

    async fn delete<K: ClusterObject>(&self, namespace: Option<&str>, name: &str) -> Result<bool>;

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool>;

    async fn patch_status(&self, config: &AKOConfig, status: &AKOConfigStatus) -> Result<()>;
}

/// [`ObjectStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(names::OPERATOR_NAME.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<K>> {
        let api = K::api(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn list<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        label_selector: &str,
    ) -> Result<Vec<K>> {
        let api = K::api(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default().labels(label_selector))
            .await?;
        Ok(list.items)
    }

    async fn create<K: ClusterObject>(&self, object: &K) -> Result<K> {
        let namespace = object.namespace();
        let api = K::api(self.client.clone(), namespace.as_deref());
        debug!(kind = %K::KIND, name = %object.name_any(), "Creating object");
        Ok(api.create(&Self::post_params(), object).await?)
    }

    async fn replace<K: ClusterObject>(&self, object: &K) -> Result<K> {
        let namespace = object.namespace();
        let api = K::api(self.client.clone(), namespace.as_deref());
        let name = object.name_any();
        debug!(kind = %K::KIND, name = %name, "Replacing object");
        Ok(api.replace(&name, &Self::post_params(), object).await?)
    }

    async fn delete<K: ClusterObject>(&self, namespace: Option<&str>, name: &str) -> Result<bool> {
        let api = K::api(self.client.clone(), namespace);
        debug!(kind = %K::KIND, name = %name, "Deleting object");
        match api.delete(name, &DeleteParams::background()).await {
            Ok(_) => Ok(true),
            Err(e) if is_status(&e, 404) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?.is_some())
    }

    async fn patch_status(&self, config: &AKOConfig, status: &AKOConfigStatus) -> Result<()> {
        let namespace = config.namespace().unwrap_or_else(|| "default".to_string());
        let api: Api<AKOConfig> = Api::namespaced(self.client.clone(), &namespace);
        let patch = serde_json::json!({ "status": status });
        api.patch_status(
            &config.name_any(),
            &PatchParams::default(),
            &Patch::Merge(&patch),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory object store recording every call

    use super::*;
    use crate::error::OperatorError;
    use crate::session::ObjectId;
    use kube::core::ErrorResponse;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Verb {
        Get,
        List,
        Create,
        Replace,
        Delete,
    }

    #[derive(Debug, Clone)]
    pub struct Call {
        pub verb: Verb,
        pub id: ObjectId,
    }

    #[derive(Default)]
    pub struct FakeStore {
        objects: Mutex<BTreeMap<ObjectId, serde_json::Value>>,
        secrets: Mutex<BTreeSet<(String, String)>>,
        calls: Mutex<Vec<Call>>,
        failures: Mutex<Vec<(Verb, ResourceKind)>>,
        statuses: Mutex<Vec<AKOConfigStatus>>,
        version: AtomicU64,
    }

    fn api_error(code: u16, reason: &str, message: String) -> OperatorError {
        OperatorError::KubeError(kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message,
            reason: reason.to_string(),
            code,
        }))
    }

    fn object_id<K: ClusterObject>(namespace: Option<&str>, name: &str) -> ObjectId {
        ObjectId {
            kind: K::KIND,
            namespace: K::scope(namespace),
            name: name.to_string(),
        }
    }

    fn matches_selector(value: &serde_json::Value, selector: &str) -> bool {
        selector
            .split(',')
            .filter(|term| !term.is_empty())
            .all(|term| match term.split_once('=') {
                Some((key, expected)) => {
                    value["metadata"]["labels"][key].as_str() == Some(expected)
                }
                None => false,
            })
    }

    impl FakeStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store with the controller credential secret present
        pub fn with_avi_secret() -> Self {
            let store = Self::new();
            store.add_secret(names::AVI_SYSTEM_NAMESPACE, names::AVI_SECRET_NAME);
            store
        }

        pub fn add_secret(&self, namespace: &str, name: &str) {
            self.secrets
                .lock()
                .unwrap()
                .insert((namespace.to_string(), name.to_string()));
        }

        /// Seed an object without recording a call
        pub fn insert<K: ClusterObject>(&self, object: &K) {
            let id = object_id::<K>(object.namespace().as_deref(), &object.name_any());
            let mut value = serde_json::to_value(object).unwrap();
            let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
            value["metadata"]["resourceVersion"] = serde_json::json!(version.to_string());
            self.objects.lock().unwrap().insert(id, value);
        }

        /// Current stored object
        pub fn object<K: ClusterObject>(&self, namespace: Option<&str>, name: &str) -> Option<K> {
            let id = object_id::<K>(namespace, name);
            self.objects
                .lock()
                .unwrap()
                .get(&id)
                .map(|value| serde_json::from_value(value.clone()).unwrap())
        }

        pub fn contains(&self, kind: ResourceKind, name: &str) -> bool {
            self.objects
                .lock()
                .unwrap()
                .keys()
                .any(|id| id.kind == kind && id.name == name)
        }

        pub fn object_count(&self) -> usize {
            self.objects.lock().unwrap().len()
        }

        /// Make every `verb` on `kind` fail with a server error
        pub fn fail_on(&self, verb: Verb, kind: ResourceKind) {
            self.failures.lock().unwrap().push((verb, kind));
        }

        pub fn clear_failures(&self) {
            self.failures.lock().unwrap().clear();
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, verb: Verb, kind: ResourceKind) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|call| call.verb == verb && call.id.kind == kind)
                .count()
        }

        /// Number of create, replace and delete calls
        pub fn writes(&self) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|call| matches!(call.verb, Verb::Create | Verb::Replace | Verb::Delete))
                .count()
        }

        pub fn reset_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        pub fn statuses(&self) -> Vec<AKOConfigStatus> {
            self.statuses.lock().unwrap().clone()
        }

        fn record(&self, verb: Verb, id: &ObjectId) -> Result<()> {
            self.calls.lock().unwrap().push(Call {
                verb,
                id: id.clone(),
            });
            let failing = self
                .failures
                .lock()
                .unwrap()
                .iter()
                .any(|(v, kind)| *v == verb && *kind == id.kind);
            if failing {
                return Err(api_error(
                    500,
                    "InternalError",
                    format!("injected {:?} failure for {}", verb, id),
                ));
            }
            Ok(())
        }

        fn next_version(&self) -> String {
            (self.version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
        }
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn get<K: ClusterObject>(
            &self,
            namespace: Option<&str>,
            name: &str,
        ) -> Result<Option<K>> {
            let id = object_id::<K>(namespace, name);
            self.record(Verb::Get, &id)?;
            Ok(self.object(namespace, name))
        }

        async fn list<K: ClusterObject>(
            &self,
            namespace: Option<&str>,
            label_selector: &str,
        ) -> Result<Vec<K>> {
            let scope = K::scope(namespace);
            let id = ObjectId {
                kind: K::KIND,
                namespace: scope.clone(),
                name: String::new(),
            };
            self.record(Verb::List, &id)?;
            let objects = self.objects.lock().unwrap();
            Ok(objects
                .iter()
                .filter(|(id, _)| id.kind == K::KIND && id.namespace == scope)
                .filter(|(_, value)| matches_selector(value, label_selector))
                .map(|(_, value)| serde_json::from_value(value.clone()).unwrap())
                .collect())
        }

        async fn create<K: ClusterObject>(&self, object: &K) -> Result<K> {
            let id = object_id::<K>(object.namespace().as_deref(), &object.name_any());
            self.record(Verb::Create, &id)?;
            let mut objects = self.objects.lock().unwrap();
            if objects.contains_key(&id) {
                return Err(api_error(409, "AlreadyExists", format!("{} already exists", id)));
            }
            let mut value = serde_json::to_value(object)?;
            value["metadata"]["resourceVersion"] = serde_json::json!(self.next_version());
            value["metadata"]["uid"] = serde_json::json!(format!("uid-{}", id.name));
            objects.insert(id, value.clone());
            Ok(serde_json::from_value(value)?)
        }

        async fn replace<K: ClusterObject>(&self, object: &K) -> Result<K> {
            let id = object_id::<K>(object.namespace().as_deref(), &object.name_any());
            self.record(Verb::Replace, &id)?;
            let mut objects = self.objects.lock().unwrap();
            let current = objects
                .get(&id)
                .ok_or_else(|| api_error(404, "NotFound", format!("{} not found", id)))?;
            let stored_version = current["metadata"]["resourceVersion"].clone();
            if let Some(version) = object.meta().resource_version.as_deref() {
                if stored_version.as_str() != Some(version) {
                    return Err(api_error(409, "Conflict", format!("{} was modified", id)));
                }
            }
            let uid = current["metadata"]["uid"].clone();
            let mut value = serde_json::to_value(object)?;
            value["metadata"]["resourceVersion"] = serde_json::json!(self.next_version());
            value["metadata"]["uid"] = uid;
            objects.insert(id, value.clone());
            Ok(serde_json::from_value(value)?)
        }

        async fn delete<K: ClusterObject>(
            &self,
            namespace: Option<&str>,
            name: &str,
        ) -> Result<bool> {
            let id = object_id::<K>(namespace, name);
            self.record(Verb::Delete, &id)?;
            Ok(self.objects.lock().unwrap().remove(&id).is_some())
        }

        async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool> {
            Ok(self
                .secrets
                .lock()
                .unwrap()
                .contains(&(namespace.to_string(), name.to_string())))
        }

        async fn patch_status(&self, _config: &AKOConfig, status: &AKOConfigStatus) -> Result<()> {
            self.statuses.lock().unwrap().push(status.clone());
            Ok(())
        }
    }
}
