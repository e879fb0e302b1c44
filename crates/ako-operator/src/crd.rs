//! Custom Resource Definition for the AKO operator
//!
//! This module defines the `AKOConfig` CRD. A single `AKOConfig` describes how
//! the AKO ingress controller should be deployed and configured; the operator
//! derives every managed object from its spec.

use crate::names;
use kube::CustomResource;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

/// Default image used when `imageRepository` is empty
pub const DEFAULT_IMAGE: &str = "projects.registry.vmware.com/ako/ako:latest";

/// Default image of the gateway-API sidecar
pub const DEFAULT_GATEWAY_IMAGE: &str = "projects.registry.vmware.com/ako/ako-gateway-api:latest";

/// Default AKO API server port
pub const DEFAULT_API_SERVER_PORT: i32 = 8080;

pub const DEFAULT_LIMIT_CPU: &str = "350m";
pub const DEFAULT_LIMIT_MEMORY: &str = "400Mi";
pub const DEFAULT_REQUEST_CPU: &str = "200m";
pub const DEFAULT_REQUEST_MEMORY: &str = "300Mi";

/// Regex for validating Kubernetes names (RFC 1123 label)
static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap());

/// Regex for the full sync frequency, a number of seconds
static SECONDS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// AKOConfig custom resource definition
///
/// Represents one AKO deployment. The operator watches these resources and
/// reconciles the ConfigMap, RBAC objects, CRDs and the AKO StatefulSet to
/// match the desired specification.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
#[kube(
    group = "ako.vmware.com",
    version = "v1alpha1",
    kind = "AKOConfig",
    plural = "akoconfigs",
    shortname = "ako",
    namespaced,
    status = "AKOConfigStatus",
    printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Controller", "type":"string", "jsonPath":".spec.controllerSettings.controllerIP"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AKOConfigSpec {
    /// AKO container image (empty uses the default image)
    #[serde(default)]
    #[validate(length(max = 255, message = "image reference exceeds 255 characters"))]
    pub image_repository: String,

    /// Image pull policy (Always, IfNotPresent, Never)
    #[serde(default = "default_image_pull_policy")]
    pub image_pull_policy: String,

    /// Image pull secrets (max 10 secrets)
    #[serde(default)]
    #[validate(length(max = 10, message = "maximum 10 image pull secrets allowed"))]
    pub image_pull_secrets: Vec<String>,

    /// Name of the PersistentVolumeClaim used for AKO logs (empty disables it)
    #[serde(default)]
    #[validate(custom(function = "validate_optional_k8s_name"))]
    pub pvc: String,

    /// Mount path of the log volume
    #[serde(default = "default_mount_path")]
    pub mount_path: String,

    /// Log file name of the AKO container
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Log file name of the gateway-API container
    #[serde(default = "default_gateway_log_file")]
    pub ako_gateway_log_file: String,

    #[serde(default)]
    #[validate(nested)]
    pub ako_settings: AkoSettings,

    #[serde(default)]
    pub network_settings: NetworkSettings,

    #[serde(default)]
    #[validate(nested)]
    pub l7_settings: L7Settings,

    #[serde(default)]
    pub l4_settings: L4Settings,

    #[serde(default)]
    pub controller_settings: ControllerSettings,

    #[serde(default)]
    pub node_port_selector: NodePortSelector,

    /// Resource limits and requests of the AKO container
    #[serde(default)]
    pub resources: ResourceSettings,

    #[serde(default)]
    pub rbac: RbacSettings,

    #[serde(default)]
    pub feature_gates: FeatureGates,

    #[serde(default)]
    pub gateway_api: GatewayApiSettings,
}

/// Validate a Kubernetes name (RFC 1123 label), empty allowed
fn validate_optional_k8s_name(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > 63 {
        return Err(
            ValidationError::new("name_too_long").with_message("name exceeds 63 characters".into())
        );
    }
    if !NAME_REGEX.is_match(value) {
        return Err(ValidationError::new("invalid_name").with_message(
            format!("'{}' is not a valid Kubernetes name (RFC 1123)", value).into(),
        ));
    }
    Ok(())
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level {
        "INFO" | "DEBUG" | "WARN" | "ERROR" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")
            .with_message("logLevel must be one of: INFO, DEBUG, WARN, ERROR".into())),
    }
}

fn validate_sync_frequency(value: &str) -> Result<(), ValidationError> {
    if SECONDS_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_sync_frequency")
            .with_message(format!("'{}' is not a number of seconds", value).into()))
    }
}

fn validate_service_type(value: &str) -> Result<(), ValidationError> {
    match value {
        "NodePort" | "ClusterIP" | "NodePortLocal" => Ok(()),
        _ => Err(ValidationError::new("invalid_service_type")
            .with_message("serviceType must be NodePort, ClusterIP or NodePortLocal".into())),
    }
}

fn validate_shard_size(value: &str) -> Result<(), ValidationError> {
    match value {
        "LARGE" | "MEDIUM" | "SMALL" | "DEDICATED" => Ok(()),
        _ => Err(ValidationError::new("invalid_shard_size")
            .with_message("shard size must be LARGE, MEDIUM, SMALL or DEDICATED".into())),
    }
}

/// General AKO settings
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AkoSettings {
    /// Log level of the AKO workload (INFO, DEBUG, WARN, ERROR)
    #[serde(default = "default_log_level")]
    #[validate(custom(function = "validate_log_level"))]
    pub log_level: String,

    /// Full sync interval in seconds
    #[serde(default = "default_full_sync_frequency")]
    #[validate(custom(function = "validate_sync_frequency"))]
    pub full_sync_frequency: String,

    /// AKO API server port (0 selects 8080)
    #[serde(default)]
    #[validate(range(min = 0, max = 65535, message = "apiServerPort must be 0-65535"))]
    pub api_server_port: i32,

    /// Tells AKO to remove its Avi objects
    #[serde(default)]
    pub delete_config: bool,

    #[serde(default)]
    pub disable_static_route_sync: bool,

    #[serde(default)]
    pub cluster_name: String,

    #[serde(default)]
    pub cni_plugin: String,

    #[serde(default)]
    pub namespace_selector: NamespaceSelector,

    #[serde(default, rename = "enableEVH")]
    pub enable_evh: bool,

    #[serde(default)]
    pub layer7_only: bool,

    #[serde(default, rename = "servicesAPI")]
    pub services_api: bool,

    #[serde(default)]
    pub vip_per_namespace: bool,

    #[serde(default = "default_true")]
    pub enable_events: bool,

    #[serde(default)]
    pub istio_enabled: bool,

    #[serde(default)]
    pub blocked_namespace_list: Vec<String>,

    /// IP family of the cluster (V4 or V6)
    #[serde(default)]
    pub ip_family: String,

    #[serde(default)]
    pub use_default_secrets_only: bool,
}

impl Default for AkoSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            full_sync_frequency: default_full_sync_frequency(),
            api_server_port: 0,
            delete_config: false,
            disable_static_route_sync: false,
            cluster_name: String::new(),
            cni_plugin: String::new(),
            namespace_selector: NamespaceSelector::default(),
            enable_evh: false,
            layer7_only: false,
            services_api: false,
            vip_per_namespace: false,
            enable_events: true,
            istio_enabled: false,
            blocked_namespace_list: vec![],
            ip_family: String::new(),
            use_default_secrets_only: false,
        }
    }
}

/// Namespace label selecting the namespaces AKO syncs
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSelector {
    #[serde(default)]
    pub label_key: String,
    #[serde(default)]
    pub label_value: String,
}

/// Network settings
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSettings {
    #[serde(default)]
    pub node_network_list: Vec<NodeNetwork>,

    #[serde(default, rename = "enableRHI")]
    pub enable_rhi: bool,

    #[serde(default)]
    pub vip_network_list: Vec<VipNetwork>,

    #[serde(default)]
    pub bgp_peer_labels: Vec<String>,

    #[serde(default, rename = "nsxtT1LR")]
    pub nsxt_t1_lr: String,

    /// Takes precedence over `l4Settings.defaultDomain`
    #[serde(default)]
    pub default_domain: String,
}

/// Node network row, also the JSON shape written to the ConfigMap
///
/// Fields are declared in key order so the encoded rows are stable.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeNetwork {
    #[serde(default)]
    pub cidrs: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_name: String,

    #[serde(
        default,
        rename = "networkUUID",
        skip_serializing_if = "String::is_empty"
    )]
    pub network_uuid: String,
}

/// VIP network row, also the JSON shape written to the ConfigMap
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VipNetwork {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_name: String,

    #[serde(
        default,
        rename = "networkUUID",
        skip_serializing_if = "String::is_empty"
    )]
    pub network_uuid: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub v6cidr: String,
}

/// L7 (ingress) settings
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct L7Settings {
    #[serde(default)]
    pub default_ing_controller: bool,

    /// NodePort, ClusterIP or NodePortLocal
    #[serde(default = "default_service_type")]
    #[validate(custom(function = "validate_service_type"))]
    pub service_type: String,

    #[serde(default = "default_shard_size", rename = "shardVSSize")]
    #[validate(custom(function = "validate_shard_size"))]
    pub shard_vs_size: String,

    #[serde(default = "default_passthrough_shard_size")]
    #[validate(custom(function = "validate_shard_size"))]
    pub passthrough_shard_size: String,

    #[serde(default, rename = "noPGForSNI")]
    pub no_pg_for_sni: bool,

    #[serde(default = "default_fqdn_reuse_policy")]
    pub fqdn_reuse_policy: String,
}

impl Default for L7Settings {
    fn default() -> Self {
        Self {
            default_ing_controller: false,
            service_type: default_service_type(),
            shard_vs_size: default_shard_size(),
            passthrough_shard_size: default_passthrough_shard_size(),
            no_pg_for_sni: false,
            fqdn_reuse_policy: default_fqdn_reuse_policy(),
        }
    }
}

/// L4 (load balancer) settings
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct L4Settings {
    #[serde(default)]
    pub default_domain: String,

    #[serde(default = "default_auto_fqdn", rename = "autoFQDN")]
    pub auto_fqdn: String,

    #[serde(default = "default_true", rename = "defaultLBController")]
    pub default_lb_controller: bool,
}

impl Default for L4Settings {
    fn default() -> Self {
        Self {
            default_domain: String::new(),
            auto_fqdn: default_auto_fqdn(),
            default_lb_controller: true,
        }
    }
}

/// Avi controller settings
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSettings {
    #[serde(default)]
    pub service_engine_group_name: String,

    #[serde(default)]
    pub controller_version: String,

    #[serde(default)]
    pub cloud_name: String,

    #[serde(default, rename = "controllerIP")]
    pub controller_ip: String,

    #[serde(default)]
    pub tenant_name: String,

    #[serde(default)]
    pub vrf_name: String,
}

/// Node selector used with `serviceType = NodePort`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct NodePortSelector {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Resource limits and requests; unset quantities fall back to defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ResourceSettings {
    #[serde(default)]
    pub limits: ResourceAmounts,
    #[serde(default)]
    pub requests: ResourceAmounts,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ResourceAmounts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RbacSettings {
    /// Create and bind a PodSecurityPolicy
    #[serde(default)]
    pub psp_enable: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureGates {
    /// Run the gateway-API sidecar and create the GatewayClass
    #[serde(default)]
    pub gateway_api: bool,

    #[serde(default)]
    pub enable_prometheus: bool,

    #[serde(default)]
    pub enable_endpoint_slice: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct GatewayApiSettings {
    #[serde(default)]
    pub image: GatewayImage,
}

/// Image of the gateway-API sidecar
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayImage {
    #[serde(default)]
    pub repository: String,

    #[serde(default = "default_image_pull_policy")]
    pub pull_policy: String,
}

impl Default for GatewayImage {
    fn default() -> Self {
        Self {
            repository: String::new(),
            pull_policy: default_image_pull_policy(),
        }
    }
}

/// Status of an AKOConfig resource
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AKOConfigStatus {
    /// Current reconcile state
    #[serde(default)]
    pub state: ConfigState,

    /// Error message of the last failed reconcile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Generation of the spec the state refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last time the status was updated (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// Reconcile state of an AKOConfig
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConfigState {
    /// Not yet reconciled
    #[default]
    Pending,
    /// A reconcile pass is running
    Processing,
    /// Every managed object matches the spec
    Ready,
    /// The last reconcile pass failed
    Error,
}

// Default value functions
fn default_image_pull_policy() -> String {
    "IfNotPresent".to_string()
}

fn default_mount_path() -> String {
    "/log".to_string()
}

fn default_log_file() -> String {
    "avi.log".to_string()
}

fn default_gateway_log_file() -> String {
    "avi-gw.log".to_string()
}

fn default_log_level() -> String {
    "WARN".to_string()
}

fn default_full_sync_frequency() -> String {
    "1800".to_string()
}

fn default_service_type() -> String {
    "ClusterIP".to_string()
}

fn default_shard_size() -> String {
    "LARGE".to_string()
}

fn default_passthrough_shard_size() -> String {
    "SMALL".to_string()
}

fn default_fqdn_reuse_policy() -> String {
    "InterNamespaceAllowed".to_string()
}

fn default_auto_fqdn() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for AKOConfigSpec {
    fn default() -> Self {
        Self {
            image_repository: String::new(),
            image_pull_policy: default_image_pull_policy(),
            image_pull_secrets: vec![],
            pvc: String::new(),
            mount_path: default_mount_path(),
            log_file: default_log_file(),
            ako_gateway_log_file: default_gateway_log_file(),
            ako_settings: AkoSettings::default(),
            network_settings: NetworkSettings::default(),
            l7_settings: L7Settings::default(),
            l4_settings: L4Settings::default(),
            controller_settings: ControllerSettings::default(),
            node_port_selector: NodePortSelector::default(),
            resources: ResourceSettings::default(),
            rbac: RbacSettings::default(),
            feature_gates: FeatureGates::default(),
            gateway_api: GatewayApiSettings::default(),
        }
    }
}

impl AKOConfigSpec {
    /// Container image of the AKO workload
    pub fn image(&self) -> &str {
        if self.image_repository.is_empty() {
            DEFAULT_IMAGE
        } else {
            &self.image_repository
        }
    }

    /// Container image of the gateway-API sidecar
    pub fn gateway_image(&self) -> &str {
        let repository = &self.gateway_api.image.repository;
        if repository.is_empty() {
            DEFAULT_GATEWAY_IMAGE
        } else {
            repository
        }
    }

    /// AKO API server port, 8080 when unset
    pub fn api_server_port(&self) -> i32 {
        match self.ako_settings.api_server_port {
            0 => DEFAULT_API_SERVER_PORT,
            port => port,
        }
    }

    pub fn is_node_port(&self) -> bool {
        self.l7_settings.service_type == "NodePort"
    }

    pub fn gateway_api_enabled(&self) -> bool {
        self.feature_gates.gateway_api
    }

    pub fn psp_enabled(&self) -> bool {
        self.rbac.psp_enable
    }

    pub fn pvc_enabled(&self) -> bool {
        !self.pvc.is_empty()
    }

    /// Default domain, `networkSettings` winning over `l4Settings`
    pub fn default_domain(&self) -> &str {
        if self.network_settings.default_domain.is_empty() {
            &self.l4_settings.default_domain
        } else {
            &self.network_settings.default_domain
        }
    }
}

/// Labels carried by every managed object
pub fn managed_labels(instance: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app.kubernetes.io/name".to_string(), "ako".to_string());
    labels.insert(
        "app.kubernetes.io/instance".to_string(),
        instance.to_string(),
    );
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        names::OPERATOR_NAME.to_string(),
    );
    labels
}

/// Labels selecting the AKO pods
pub fn selector_labels() -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), "ako".to_string());
    labels.insert("app.kubernetes.io/name".to_string(), "ako".to_string());
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_spec() {
        let spec = AKOConfigSpec::default();

        assert_eq!(spec.image(), DEFAULT_IMAGE);
        assert_eq!(spec.image_pull_policy, "IfNotPresent");
        assert_eq!(spec.mount_path, "/log");
        assert_eq!(spec.log_file, "avi.log");
        assert_eq!(spec.ako_settings.log_level, "WARN");
        assert_eq!(spec.ako_settings.full_sync_frequency, "1800");
        assert_eq!(spec.api_server_port(), 8080);
        assert_eq!(spec.l7_settings.service_type, "ClusterIP");
        assert!(spec.l4_settings.default_lb_controller);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_empty_object_matches_defaults() {
        let spec: AKOConfigSpec = serde_json::from_value(json!({})).unwrap();
        let defaults = AKOConfigSpec::default();

        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            serde_json::to_value(&defaults).unwrap()
        );
    }

    #[test]
    fn test_wire_names() {
        let spec: AKOConfigSpec = serde_json::from_value(json!({
            "akoSettings": {"enableEVH": true, "servicesAPI": true, "apiServerPort": 9000},
            "networkSettings": {
                "enableRHI": true,
                "nsxtT1LR": "/infra/tier-1s/t1",
                "nodeNetworkList": [{"networkName": "net", "cidrs": ["10.0.0.0/24"], "networkUUID": "u"}]
            },
            "l7Settings": {"shardVSSize": "SMALL", "noPGForSNI": true},
            "l4Settings": {"autoFQDN": "flat", "defaultLBController": false},
            "controllerSettings": {"controllerIP": "10.1.1.1"},
            "featureGates": {"gatewayApi": true}
        }))
        .unwrap();

        assert!(spec.ako_settings.enable_evh);
        assert!(spec.ako_settings.services_api);
        assert_eq!(spec.api_server_port(), 9000);
        assert!(spec.network_settings.enable_rhi);
        assert_eq!(spec.network_settings.nsxt_t1_lr, "/infra/tier-1s/t1");
        assert_eq!(spec.network_settings.node_network_list[0].network_uuid, "u");
        assert_eq!(spec.l7_settings.shard_vs_size, "SMALL");
        assert!(spec.l7_settings.no_pg_for_sni);
        assert_eq!(spec.l4_settings.auto_fqdn, "flat");
        assert!(!spec.l4_settings.default_lb_controller);
        assert_eq!(spec.controller_settings.controller_ip, "10.1.1.1");
        assert!(spec.gateway_api_enabled());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut spec = AKOConfigSpec::default();
        spec.ako_settings.log_level = "VERBOSE".to_string();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_invalid_service_type_and_shard_size() {
        let mut spec = AKOConfigSpec::default();
        spec.l7_settings.service_type = "LoadBalancer".to_string();
        assert!(spec.validate().is_err());

        let mut spec = AKOConfigSpec::default();
        spec.l7_settings.passthrough_shard_size = "HUGE".to_string();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_invalid_sync_frequency() {
        let mut spec = AKOConfigSpec::default();
        spec.ako_settings.full_sync_frequency = "30m".to_string();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_invalid_pvc_name() {
        let mut spec = AKOConfigSpec::default();
        spec.pvc = "Not_A_Name".to_string();
        assert!(spec.validate().is_err());

        spec.pvc = "ako-logs".to_string();
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_default_domain_precedence() {
        let mut spec = AKOConfigSpec::default();
        spec.l4_settings.default_domain = "l4.example.com".to_string();
        assert_eq!(spec.default_domain(), "l4.example.com");

        spec.network_settings.default_domain = "net.example.com".to_string();
        assert_eq!(spec.default_domain(), "net.example.com");
    }

    #[test]
    fn test_managed_labels() {
        let labels = managed_labels("my-ako");

        assert_eq!(
            labels.get("app.kubernetes.io/name"),
            Some(&"ako".to_string())
        );
        assert_eq!(
            labels.get("app.kubernetes.io/instance"),
            Some(&"my-ako".to_string())
        );
        assert_eq!(
            labels.get("app.kubernetes.io/managed-by"),
            Some(&"ako-operator".to_string())
        );
    }

    #[test]
    fn test_node_network_serialization_omits_empty_uuid() {
        let row = NodeNetwork {
            network_name: "net".to_string(),
            cidrs: vec!["10.0.0.0/24".to_string()],
            network_uuid: String::new(),
        };

        let value = serde_json::to_value(&row).unwrap();
        assert!(value.get("networkUUID").is_none());
    }

    #[test]
    fn test_network_rows_omit_empty_name() {
        let row = NodeNetwork {
            cidrs: vec![],
            network_name: String::new(),
            network_uuid: "dvportgroup-12".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"cidrs":[],"networkUUID":"dvportgroup-12"}"#
        );

        let vip = VipNetwork {
            network_uuid: "dvportgroup-13".to_string(),
            ..Default::default()
        };
        assert!(serde_json::to_value(&vip).unwrap().get("networkName").is_none());
    }
}
