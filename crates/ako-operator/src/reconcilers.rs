//! Per-resource reconcilers
//!
//! Each reconciler fetches the live object, builds the desired one, asks the
//! classifier whether an update is needed and then creates, replaces,
//! deletes or leaves the object alone. Whatever is live afterwards is
//! recorded in the session registry.

use crate::classify;
use crate::error::{OperatorError, Result};
use crate::external::{GatewayClass, PodSecurityPolicy};
use crate::names;
use crate::resources::ResourceBuilder;
use crate::session::{ObjectId, ObjectRegistry, SessionState};
use crate::store::{ClusterObject, ObjectStore};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use kube::{Resource, ResourceExt};
use tracing::{debug, info};

/// What a reconciler did to its object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Created,
    Updated,
    Deleted,
    Unchanged,
}

fn namespace_of<K: ClusterObject>() -> Option<&'static str> {
    if K::NAMESPACED {
        Some(names::AVI_SYSTEM_NAMESPACE)
    } else {
        None
    }
}

/// Create `desired` when `existing` is absent, replace it when
/// `needs_update`, and record the resulting live object.
async fn apply<S: ObjectStore, K: ClusterObject>(
    store: &S,
    registry: &ObjectRegistry,
    existing: Option<K>,
    mut desired: K,
    needs_update: bool,
) -> Result<Applied> {
    let name = desired.name_any();
    let (live, applied) = match existing {
        None => match store.create(&desired).await {
            Ok(created) => {
                info!(kind = %K::KIND, name = %name, "Created object");
                (created, Applied::Created)
            }
            Err(e) if e.is_already_exists() => {
                // lost a race with a concurrent create
                let live = store
                    .get::<K>(namespace_of::<K>(), &name)
                    .await?
                    .ok_or_else(|| {
                        OperatorError::ReconcileFailed(format!(
                            "{} {} disappeared after a create conflict",
                            K::KIND,
                            name
                        ))
                    })?;
                (live, Applied::Unchanged)
            }
            Err(e) => return Err(e),
        },
        Some(existing) if needs_update => {
            desired.meta_mut().resource_version = existing.meta().resource_version.clone();
            let replaced = store.replace(&desired).await?;
            info!(kind = %K::KIND, name = %name, "Updated object");
            (replaced, Applied::Updated)
        }
        Some(existing) => {
            debug!(kind = %K::KIND, name = %name, "Object up to date");
            (existing, Applied::Unchanged)
        }
    };
    registry.record(live.into_managed());
    Ok(applied)
}

/// Delete an object of an optional kind if it exists
async fn remove<S: ObjectStore, K: ClusterObject>(
    store: &S,
    registry: &ObjectRegistry,
    name: &str,
) -> Result<Applied> {
    let namespace = namespace_of::<K>();
    let id = ObjectId::new(K::KIND, namespace, name);
    if store.get::<K>(namespace, name).await?.is_none() {
        registry.remove(&id);
        return Ok(Applied::Unchanged);
    }
    store.delete::<K>(namespace, name).await?;
    registry.remove(&id);
    info!(kind = %K::KIND, name = %name, "Deleted object");
    Ok(Applied::Deleted)
}

/// Reconcile the AKO ConfigMap. A replace that changes a cold value marks
/// the workload for restart.
pub async fn reconcile_configmap<S: ObjectStore>(
    store: &S,
    session: &SessionState,
    builder: &ResourceBuilder<'_>,
) -> Result<Applied> {
    let desired = builder.build_configmap()?;
    let existing: Option<ConfigMap> = store
        .get(Some(names::AVI_SYSTEM_NAMESPACE), names::CONFIGMAP_NAME)
        .await?;

    let (needs_update, restart) = match &existing {
        Some(existing) => (
            classify::configmap_needs_update(existing, &desired),
            classify::restart_required(existing, &desired),
        ),
        None => (false, false),
    };

    let applied = apply(store, &session.registry, existing, desired, needs_update).await?;
    if applied == Applied::Updated && restart {
        info!("Cold ConfigMap values changed, AKO restart pending");
        session.restart.request_restart();
    }
    Ok(applied)
}

pub async fn reconcile_service_account<S: ObjectStore>(
    store: &S,
    session: &SessionState,
    builder: &ResourceBuilder<'_>,
) -> Result<Applied> {
    let existing: Option<ServiceAccount> = store
        .get(Some(names::AVI_SYSTEM_NAMESPACE), names::SERVICE_ACCOUNT_NAME)
        .await?;
    apply(
        store,
        &session.registry,
        existing,
        builder.build_service_account(),
        false,
    )
    .await
}

pub async fn reconcile_cluster_role<S: ObjectStore>(
    store: &S,
    session: &SessionState,
    builder: &ResourceBuilder<'_>,
) -> Result<Applied> {
    let desired = builder.build_cluster_role();
    let existing: Option<ClusterRole> = store.get(None, names::CLUSTER_ROLE_NAME).await?;
    let needs_update = existing
        .as_ref()
        .is_some_and(|existing| classify::cluster_role_needs_update(existing, &desired));
    apply(store, &session.registry, existing, desired, needs_update).await
}

pub async fn reconcile_cluster_role_binding<S: ObjectStore>(
    store: &S,
    session: &SessionState,
    builder: &ResourceBuilder<'_>,
) -> Result<Applied> {
    let desired = builder.build_cluster_role_binding();
    let existing: Option<ClusterRoleBinding> =
        store.get(None, names::CLUSTER_ROLE_BINDING_NAME).await?;
    let needs_update = existing
        .as_ref()
        .is_some_and(|existing| classify::cluster_role_binding_needs_update(existing, &desired));
    apply(store, &session.registry, existing, desired, needs_update).await
}

/// Keep the PodSecurityPolicy present exactly while `rbac.pspEnable` is set
pub async fn reconcile_pod_security_policy<S: ObjectStore>(
    store: &S,
    session: &SessionState,
    builder: &ResourceBuilder<'_>,
    enabled: bool,
) -> Result<Applied> {
    if !enabled {
        return remove::<S, PodSecurityPolicy>(store, &session.registry, names::PSP_NAME).await;
    }
    let desired = builder.build_pod_security_policy();
    let existing: Option<PodSecurityPolicy> = store.get(None, names::PSP_NAME).await?;
    let needs_update = existing
        .as_ref()
        .is_some_and(|existing| classify::psp_needs_update(existing, &desired));
    apply(store, &session.registry, existing, desired, needs_update).await
}

/// Keep the GatewayClass present exactly while the gateway API gate is on
pub async fn reconcile_gateway_class<S: ObjectStore>(
    store: &S,
    session: &SessionState,
    builder: &ResourceBuilder<'_>,
    enabled: bool,
) -> Result<Applied> {
    if !enabled {
        return remove::<S, GatewayClass>(store, &session.registry, names::GATEWAY_CLASS_NAME)
            .await;
    }
    let existing: Option<GatewayClass> = store.get(None, names::GATEWAY_CLASS_NAME).await?;
    apply(
        store,
        &session.registry,
        existing,
        builder.build_gateway_class(),
        false,
    )
    .await
}

/// Reconcile the AKO StatefulSet.
///
/// A pending restart wins over the classifier: the StatefulSet is deleted
/// and created again, and the flag is only cleared once both succeeded.
pub async fn reconcile_statefulset<S: ObjectStore>(
    store: &S,
    session: &SessionState,
    builder: &ResourceBuilder<'_>,
) -> Result<Applied> {
    let desired = builder.build_statefulset()?;
    let namespace = Some(names::AVI_SYSTEM_NAMESPACE);

    if session.restart.is_pending() {
        info!("Restarting AKO to pick up ConfigMap changes");
        store
            .delete::<StatefulSet>(namespace, names::STATEFULSET_NAME)
            .await?;
        let created = store.create(&desired).await?;
        session.registry.record(created.into_managed());
        session.restart.complete();
        metrics::counter!("ako_operator_workload_restarts_total").increment(1);
        return Ok(Applied::Created);
    }

    let existing: Option<StatefulSet> = store.get(namespace, names::STATEFULSET_NAME).await?;
    let needs_update = existing
        .as_ref()
        .is_some_and(|existing| classify::statefulset_needs_update(existing, &desired));
    apply(store, &session.registry, existing, desired, needs_update).await
}
