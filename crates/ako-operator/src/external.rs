//! API types managed by the operator that k8s-openapi does not ship
//!
//! `GatewayClass` belongs to the gateway-API project and `PodSecurityPolicy`
//! was removed from the upstream type crate. Both are cluster-scoped and only
//! the fields the operator writes are modelled.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// gateway.networking.k8s.io/v1 GatewayClass
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "gateway.networking.k8s.io",
    version = "v1",
    kind = "GatewayClass",
    plural = "gatewayclasses"
)]
#[serde(rename_all = "camelCase")]
pub struct GatewayClassSpec {
    /// Controller responsible for gateways of this class
    pub controller_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// policy/v1beta1 PodSecurityPolicy
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "policy",
    version = "v1beta1",
    kind = "PodSecurityPolicy",
    plural = "podsecuritypolicies"
)]
#[serde(rename_all = "camelCase")]
pub struct PodSecurityPolicySpec {
    #[serde(default)]
    pub privileged: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_privilege_escalation: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_drop_capabilities: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,

    #[serde(default)]
    pub host_network: bool,

    #[serde(default, rename = "hostIPC")]
    pub host_ipc: bool,

    #[serde(default, rename = "hostPID")]
    pub host_pid: bool,

    #[serde(default)]
    pub read_only_root_filesystem: bool,

    #[serde(default)]
    pub run_as_user: StrategyOptions,

    #[serde(default, rename = "seLinux")]
    pub se_linux: StrategyOptions,

    #[serde(default)]
    pub supplemental_groups: StrategyOptions,

    #[serde(default)]
    pub fs_group: StrategyOptions,
}

/// Rule of one PodSecurityPolicy strategy
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOptions {
    pub rule: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<IdRange>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct IdRange {
    pub min: i64,
    pub max: i64,
}
