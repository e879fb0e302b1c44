//! Removal of everything an AKOConfig caused to exist
//!
//! The recorded objects are deleted together with everything found again by
//! the `managed-by` label and by fixed name. After an operator restart the
//! registry is empty or only partly refilled.

use crate::crd_installer;
use crate::error::Result;
use crate::external::{GatewayClass, PodSecurityPolicy};
use crate::names;
use crate::session::{delete_by_id, ObjectId, ResourceKind, SessionState};
use crate::store::{ClusterObject, ObjectStore};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Every object the operator may create, by fixed name
fn fixed_objects() -> Vec<ObjectId> {
    let ns = Some(names::AVI_SYSTEM_NAMESPACE);
    vec![
        ObjectId::new(ResourceKind::ConfigMap, ns, names::CONFIGMAP_NAME),
        ObjectId::new(ResourceKind::ServiceAccount, ns, names::SERVICE_ACCOUNT_NAME),
        ObjectId::new(ResourceKind::ClusterRole, None, names::CLUSTER_ROLE_NAME),
        ObjectId::new(
            ResourceKind::ClusterRoleBinding,
            None,
            names::CLUSTER_ROLE_BINDING_NAME,
        ),
        ObjectId::new(ResourceKind::PodSecurityPolicy, None, names::PSP_NAME),
        ObjectId::new(ResourceKind::GatewayClass, None, names::GATEWAY_CLASS_NAME),
        ObjectId::new(ResourceKind::StatefulSet, ns, names::STATEFULSET_NAME),
    ]
}

/// Add every labelled object of one kind. A kind the server does not serve
/// has nothing to clean up.
async fn collect_labelled<S: ObjectStore, K: ClusterObject>(
    store: &S,
    found: &mut BTreeSet<ObjectId>,
) -> Result<()> {
    let namespace = K::scope(None);
    match store
        .list::<K>(namespace.as_deref(), names::MANAGED_BY_SELECTOR)
        .await
    {
        Ok(objects) => {
            found.extend(objects.into_iter().map(|o| o.into_managed().id()));
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            debug!(kind = %K::KIND, "Kind not served, skipping");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn exists<S: ObjectStore>(store: &S, id: &ObjectId) -> Result<bool> {
    let ns = id.namespace.as_deref();
    let name = id.name.as_str();
    Ok(match id.kind {
        ResourceKind::ConfigMap => store.get::<ConfigMap>(ns, name).await?.is_some(),
        ResourceKind::ServiceAccount => store.get::<ServiceAccount>(ns, name).await?.is_some(),
        ResourceKind::ClusterRole => store.get::<ClusterRole>(None, name).await?.is_some(),
        ResourceKind::ClusterRoleBinding => {
            store.get::<ClusterRoleBinding>(None, name).await?.is_some()
        }
        ResourceKind::PodSecurityPolicy => {
            store.get::<PodSecurityPolicy>(None, name).await?.is_some()
        }
        ResourceKind::GatewayClass => store.get::<GatewayClass>(None, name).await?.is_some(),
        ResourceKind::StatefulSet => store.get::<StatefulSet>(ns, name).await?.is_some(),
        // rule CRDs are removed by the installer
        ResourceKind::CustomResourceDefinition => false,
    })
}

/// Find managed objects without a registry: label lists first, then the
/// fixed-name table for anything the lists missed.
pub async fn rediscover<S: ObjectStore>(store: &S) -> Result<Vec<ObjectId>> {
    let mut found = BTreeSet::new();
    collect_labelled::<S, ConfigMap>(store, &mut found).await?;
    collect_labelled::<S, ServiceAccount>(store, &mut found).await?;
    collect_labelled::<S, ClusterRole>(store, &mut found).await?;
    collect_labelled::<S, ClusterRoleBinding>(store, &mut found).await?;
    collect_labelled::<S, PodSecurityPolicy>(store, &mut found).await?;
    collect_labelled::<S, GatewayClass>(store, &mut found).await?;
    collect_labelled::<S, StatefulSet>(store, &mut found).await?;

    for id in fixed_objects() {
        if found.contains(&id) {
            continue;
        }
        match exists(store, &id).await {
            Ok(true) => {
                found.insert(id);
            }
            Ok(false) => {}
            Err(e) => {
                // deletion below treats a missing object as success
                warn!(object = %id, error = %e, "Lookup failed, deleting anyway");
                found.insert(id);
            }
        }
    }
    Ok(found.into_iter().collect())
}

/// Delete every managed object of one source, then the rule CRDs.
///
/// Targets are the registry entries plus everything rediscovered. A registry
/// refilled by a partial pass after a restart is incomplete.
/// Objects go in reverse reconcile order, so the workload stops before its
/// configuration disappears. Safe to run repeatedly.
pub async fn cleanup<S: ObjectStore>(store: &S, session: &SessionState) -> Result<()> {
    let registry = &session.registry;
    let mut targets: BTreeSet<ObjectId> =
        registry.snapshot().iter().map(|object| object.id()).collect();
    let recorded = targets.len();
    targets.extend(rediscover(store).await?);
    debug!(
        recorded,
        total = targets.len(),
        "Collected managed objects for cleanup"
    );

    for id in targets.into_iter().rev() {
        if delete_by_id(store, &id).await? {
            info!(object = %id, "Deleted managed object");
        } else {
            debug!(object = %id, "Managed object already gone");
        }
        registry.remove(&id);
    }

    crd_installer::delete_crds(store, registry).await?;
    session.restart.complete();
    Ok(())
}
