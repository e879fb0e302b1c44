//! Change classifiers
//!
//! Each classifier compares only the fields the operator writes, so values
//! the API server fills in (resource versions, defaults, status) never cause
//! an update. None of them can fail.

use crate::external::PodSecurityPolicy;
use crate::names::HOT_CONFIG_KEYS;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Container, EnvVar, PodSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Order-independent checksum over the ConfigMap values not in `skip`.
///
/// Values are sorted and JSON-encoded as one array before hashing, so no two
/// distinct value sets share an encoding.
pub fn config_checksum(data: &BTreeMap<String, String>, skip: &[&str]) -> String {
    let mut values: Vec<&str> = data
        .iter()
        .filter(|(key, _)| !skip.contains(&key.as_str()))
        .map(|(_, value)| value.as_str())
        .collect();
    values.sort_unstable();

    let encoded = serde_json::to_vec(&values).unwrap_or_default();
    format!("{:x}", Sha256::digest(&encoded))
}

fn configmap_data(cm: &ConfigMap) -> BTreeMap<String, String> {
    cm.data.clone().unwrap_or_default()
}

/// Whether the ConfigMap content differs at all
pub fn configmap_needs_update(existing: &ConfigMap, desired: &ConfigMap) -> bool {
    configmap_data(existing) != configmap_data(desired)
}

/// Whether moving from `existing` to `desired` changes a cold value
pub fn restart_required(existing: &ConfigMap, desired: &ConfigMap) -> bool {
    config_checksum(&configmap_data(existing), HOT_CONFIG_KEYS)
        != config_checksum(&configmap_data(desired), HOT_CONFIG_KEYS)
}

pub fn cluster_role_needs_update(existing: &ClusterRole, desired: &ClusterRole) -> bool {
    existing.rules.clone().unwrap_or_default() != desired.rules.clone().unwrap_or_default()
}

pub fn cluster_role_binding_needs_update(
    existing: &ClusterRoleBinding,
    desired: &ClusterRoleBinding,
) -> bool {
    existing.subjects.clone().unwrap_or_default() != desired.subjects.clone().unwrap_or_default()
        || existing.role_ref != desired.role_ref
}

pub fn psp_needs_update(existing: &PodSecurityPolicy, desired: &PodSecurityPolicy) -> bool {
    existing.spec != desired.spec
}

fn pod_spec(sts: &StatefulSet) -> Option<&PodSpec> {
    sts.spec.as_ref().and_then(|spec| spec.template.spec.as_ref())
}

fn env_map(container: &Container) -> BTreeMap<&str, &EnvVar> {
    container
        .env
        .iter()
        .flatten()
        .map(|var| (var.name.as_str(), var))
        .collect()
}

fn liveness_port(container: &Container) -> Option<String> {
    container
        .liveness_probe
        .as_ref()
        .and_then(|probe| probe.http_get.as_ref())
        .map(|get| match &get.port {
            IntOrString::Int(port) => port.to_string(),
            IntOrString::String(port) => port.clone(),
        })
}

/// Quantity in units of 1e-12, `None` for anything but a plain decimal
/// number with an optional suffix
fn quantity_value(quantity: &Quantity) -> Option<i128> {
    let text = quantity.0.as_str();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, suffix) = text.split_at(split);
    let factor: i128 = match suffix {
        "m" => 1,
        "" => 1_000,
        "k" => 1_000_000,
        "M" => 1_000_000_000,
        "G" => 1_000_000_000_000,
        "T" => 1_000_000_000_000_000,
        "P" => 1_000_000_000_000_000_000,
        "E" => 1_000_000_000_000_000_000_000,
        "Ki" => 1_000 << 10,
        "Mi" => 1_000 << 20,
        "Gi" => 1_000 << 30,
        "Ti" => 1_000 << 40,
        "Pi" => 1_000 << 50,
        "Ei" => 1_000 << 60,
        _ => return None,
    };

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() || fraction.len() > 9 {
        return None;
    }
    let nanos = whole
        .parse::<i128>()
        .ok()?
        .checked_mul(1_000_000_000)?
        .checked_add(format!("{fraction:0<9}").parse::<i128>().ok()?)?;
    nanos.checked_mul(factor)
}

fn same_quantity(a: &Quantity, b: &Quantity) -> bool {
    match (quantity_value(a), quantity_value(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

fn same_amounts(
    a: Option<&BTreeMap<String, Quantity>>,
    b: Option<&BTreeMap<String, Quantity>>,
) -> bool {
    let empty = BTreeMap::new();
    let (a, b) = (a.unwrap_or(&empty), b.unwrap_or(&empty));
    a.len() == b.len()
        && a.iter().all(|(name, value)| {
            b.get(name)
                .is_some_and(|other| same_quantity(value, other))
        })
}

/// Limits and requests compared by amount, so `1` and `1000m` are equal
fn resources_differ(
    existing: Option<&ResourceRequirements>,
    desired: Option<&ResourceRequirements>,
) -> bool {
    fn limits(r: Option<&ResourceRequirements>) -> Option<&BTreeMap<String, Quantity>> {
        r.and_then(|r| r.limits.as_ref())
    }
    fn requests(r: Option<&ResourceRequirements>) -> Option<&BTreeMap<String, Quantity>> {
        r.and_then(|r| r.requests.as_ref())
    }
    !same_amounts(limits(existing), limits(desired))
        || !same_amounts(requests(existing), requests(desired))
}

/// Fields compared on both containers
fn container_differs(existing: &Container, desired: &Container) -> bool {
    existing.image != desired.image
        || existing.image_pull_policy != desired.image_pull_policy
        || env_map(existing) != env_map(desired)
        || resources_differ(existing.resources.as_ref(), desired.resources.as_ref())
        || existing.volume_mounts.clone().unwrap_or_default()
            != desired.volume_mounts.clone().unwrap_or_default()
}

/// Whether the live StatefulSet has drifted from the desired one
pub fn statefulset_needs_update(existing: &StatefulSet, desired: &StatefulSet) -> bool {
    let replicas = |sts: &StatefulSet| sts.spec.as_ref().and_then(|spec| spec.replicas);
    if replicas(existing) != replicas(desired) {
        return true;
    }

    let (Some(existing_pod), Some(desired_pod)) = (pod_spec(existing), pod_spec(desired)) else {
        return true;
    };

    if existing_pod.containers.len() != desired_pod.containers.len() {
        return true;
    }
    if existing_pod.image_pull_secrets.clone().unwrap_or_default()
        != desired_pod.image_pull_secrets.clone().unwrap_or_default()
    {
        return true;
    }

    let (Some(existing_main), Some(desired_main)) =
        (existing_pod.containers.first(), desired_pod.containers.first())
    else {
        return false;
    };

    if container_differs(existing_main, desired_main)
        || existing_main.ports.clone().unwrap_or_default()
            != desired_main.ports.clone().unwrap_or_default()
        || liveness_port(existing_main) != liveness_port(desired_main)
    {
        return true;
    }

    match (existing_pod.containers.get(1), desired_pod.containers.get(1)) {
        (Some(existing_sidecar), Some(desired_sidecar)) => {
            container_differs(existing_sidecar, desired_sidecar)
        }
        _ => false,
    }
}
