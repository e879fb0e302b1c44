//! Kubernetes Resource Builders
//!
//! This module generates the desired ConfigMap, RBAC objects, PodSecurityPolicy,
//! GatewayClass and StatefulSet from an `AKOConfig` specification. Every
//! builder is a pure function of the spec: the same input always yields the
//! same object, so a second pass over an unchanged source writes nothing.

use crate::crd::{
    managed_labels, selector_labels, AKOConfig, AKOConfigSpec, ResourceAmounts,
    DEFAULT_LIMIT_CPU, DEFAULT_LIMIT_MEMORY, DEFAULT_REQUEST_CPU, DEFAULT_REQUEST_MEMORY,
};
use crate::error::{OperatorError, Result};
use crate::external::{
    GatewayClass, GatewayClassSpec, PodSecurityPolicy, PodSecurityPolicySpec, StrategyOptions,
};
use crate::names::{self, keys};
use crate::rbac;
use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    Affinity, ConfigMap, ConfigMapKeySelector, Container, ContainerPort, EnvVar, EnvVarSource,
    ExecAction, HTTPGetAction, Lifecycle, LifecycleHandler, LocalObjectReference,
    ObjectFieldSelector, PersistentVolumeClaimVolumeSource, PodAffinityTerm, PodAntiAffinity,
    PodSpec, PodTemplateSpec, Probe, ResourceRequirements, SecretKeySelector, ServiceAccount,
    Volume, VolumeMount,
};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    LabelSelector, LabelSelectorRequirement, ObjectMeta, OwnerReference,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Volume backing the AKO log directory when a PVC is configured
const LOG_VOLUME_NAME: &str = "ako-pv-storage";

const MAIN_CONTAINER_NAME: &str = "ako";
const GATEWAY_CONTAINER_NAME: &str = "ako-gateway-api";
const PROMETHEUS_PORT_NAME: &str = "prometheus-port";

const PULL_POLICIES: &[&str] = &["Always", "IfNotPresent", "Never"];

/// Kubernetes resource quantity, e.g. `350m`, `1.5`, `400Mi`
static QUANTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(\.[0-9]+)?(m|Ki|Mi|Gi|Ti|Pi|Ei|k|M|G|T|P|E)?$").unwrap()
});

/// Builder for generating Kubernetes resources from an AKOConfig
pub struct ResourceBuilder<'a> {
    config: &'a AKOConfig,
    name: String,
    namespace: String,
}

impl<'a> ResourceBuilder<'a> {
    /// Create a new resource builder
    pub fn new(config: &'a AKOConfig) -> Result<Self> {
        let name =
            config.metadata.name.clone().ok_or_else(|| {
                OperatorError::InvalidConfig("AKOConfig name is required".to_string())
            })?;

        let namespace = config
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| "default".to_string());

        Ok(Self {
            config,
            name,
            namespace,
        })
    }

    fn spec(&self) -> &AKOConfigSpec {
        &self.config.spec
    }

    /// Owner reference to the AKOConfig.
    ///
    /// Owner references cannot cross namespaces, so namespaced objects only
    /// carry one when the AKOConfig itself lives in `avi-system`.
    fn owner_reference(&self) -> Option<OwnerReference> {
        if self.namespace != names::AVI_SYSTEM_NAMESPACE {
            return None;
        }
        Some(OwnerReference {
            api_version: "ako.vmware.com/v1alpha1".to_string(),
            kind: "AKOConfig".to_string(),
            name: self.name.clone(),
            uid: self.config.metadata.uid.clone().unwrap_or_default(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        })
    }

    fn namespaced_metadata(&self, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(names::AVI_SYSTEM_NAMESPACE.to_string()),
            labels: Some(managed_labels(&self.name)),
            owner_references: self.owner_reference().map(|owner| vec![owner]),
            ..Default::default()
        }
    }

    fn cluster_metadata(&self, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(managed_labels(&self.name)),
            ..Default::default()
        }
    }

    /// Build the `avi-k8s-config` ConfigMap read by the AKO workload
    pub fn build_configmap(&self) -> Result<ConfigMap> {
        let spec = self.spec();
        let ako = &spec.ako_settings;
        let network = &spec.network_settings;
        let l7 = &spec.l7_settings;
        let l4 = &spec.l4_settings;
        let controller = &spec.controller_settings;

        let mut data = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            data.insert(key.to_string(), value);
        };

        put(keys::CONTROLLER_IP, controller.controller_ip.clone());
        put(keys::CONTROLLER_VERSION, controller.controller_version.clone());
        put(keys::CLOUD_NAME, controller.cloud_name.clone());
        put(
            keys::SERVICE_ENGINE_GROUP_NAME,
            controller.service_engine_group_name.clone(),
        );
        put(keys::TENANT_NAME, controller.tenant_name.clone());
        put(keys::VRF_NAME, controller.vrf_name.clone());

        put(keys::CNI_PLUGIN, ako.cni_plugin.clone());
        put(keys::CLUSTER_NAME, ako.cluster_name.clone());
        put(keys::FULL_SYNC_FREQUENCY, ako.full_sync_frequency.clone());
        put(keys::API_SERVER_PORT, spec.api_server_port().to_string());
        put(keys::LOG_LEVEL, ako.log_level.clone());
        put(keys::DELETE_CONFIG, ako.delete_config.to_string());
        put(
            keys::DISABLE_STATIC_ROUTE_SYNC,
            ako.disable_static_route_sync.to_string(),
        );
        put(keys::ENABLE_EVH, ako.enable_evh.to_string());
        put(keys::LAYER7_ONLY, ako.layer7_only.to_string());
        put(keys::SERVICES_API, ako.services_api.to_string());
        put(keys::VIP_PER_NAMESPACE, ako.vip_per_namespace.to_string());
        put(keys::ENABLE_EVENTS, ako.enable_events.to_string());
        put(keys::ISTIO_ENABLED, ako.istio_enabled.to_string());
        put(keys::IP_FAMILY, ako.ip_family.clone());
        put(
            keys::USE_DEFAULT_SECRETS_ONLY,
            ako.use_default_secrets_only.to_string(),
        );
        put(keys::NS_SYNC_LABEL_KEY, ako.namespace_selector.label_key.clone());
        put(
            keys::NS_SYNC_LABEL_VALUE,
            ako.namespace_selector.label_value.clone(),
        );
        put(
            keys::BLOCKED_NAMESPACE_LIST,
            json_list(&ako.blocked_namespace_list)?,
        );

        put(keys::NODE_NETWORK_LIST, json_list(&network.node_network_list)?);
        put(keys::VIP_NETWORK_LIST, json_list(&network.vip_network_list)?);
        put(keys::BGP_PEER_LABELS, json_list(&network.bgp_peer_labels)?);
        put(keys::ENABLE_RHI, network.enable_rhi.to_string());
        put(keys::NSXT_T1_LR, network.nsxt_t1_lr.clone());
        put(keys::DEFAULT_DOMAIN, spec.default_domain().to_string());

        put(
            keys::DEFAULT_ING_CONTROLLER,
            l7.default_ing_controller.to_string(),
        );
        put(keys::SERVICE_TYPE, l7.service_type.clone());
        put(keys::SHARD_VS_SIZE, l7.shard_vs_size.clone());
        put(keys::PASSTHROUGH_SHARD_SIZE, l7.passthrough_shard_size.clone());
        put(keys::NO_PG_FOR_SNI, l7.no_pg_for_sni.to_string());
        put(keys::FQDN_REUSE_POLICY, l7.fqdn_reuse_policy.clone());

        put(keys::AUTO_FQDN, l4.auto_fqdn.clone());
        put(
            keys::DEFAULT_LB_CONTROLLER,
            l4.default_lb_controller.to_string(),
        );

        if spec.is_node_port() {
            put(keys::NODE_KEY, spec.node_port_selector.key.clone());
            put(keys::NODE_VALUE, spec.node_port_selector.value.clone());
        }

        put(keys::PRIMARY_INSTANCE, "true".to_string());
        put(keys::ENABLE_MCI, "false".to_string());
        put(
            keys::ENABLE_PROMETHEUS,
            spec.feature_gates.enable_prometheus.to_string(),
        );
        put(
            keys::ENABLE_ENDPOINT_SLICE,
            spec.feature_gates.enable_endpoint_slice.to_string(),
        );

        Ok(ConfigMap {
            metadata: self.namespaced_metadata(names::CONFIGMAP_NAME),
            data: Some(data),
            ..Default::default()
        })
    }

    /// Build the ServiceAccount the AKO pods run as
    pub fn build_service_account(&self) -> ServiceAccount {
        ServiceAccount {
            metadata: self.namespaced_metadata(names::SERVICE_ACCOUNT_NAME),
            ..Default::default()
        }
    }

    pub fn build_cluster_role(&self) -> ClusterRole {
        ClusterRole {
            metadata: self.cluster_metadata(names::CLUSTER_ROLE_NAME),
            rules: Some(rbac::cluster_role_rules(self.spec().psp_enabled())),
            ..Default::default()
        }
    }

    pub fn build_cluster_role_binding(&self) -> ClusterRoleBinding {
        ClusterRoleBinding {
            metadata: self.cluster_metadata(names::CLUSTER_ROLE_BINDING_NAME),
            subjects: Some(vec![Subject {
                kind: "ServiceAccount".to_string(),
                name: names::SERVICE_ACCOUNT_NAME.to_string(),
                namespace: Some(names::AVI_SYSTEM_NAMESPACE.to_string()),
                ..Default::default()
            }]),
            role_ref: RoleRef {
                api_group: "rbac.authorization.k8s.io".to_string(),
                kind: "ClusterRole".to_string(),
                name: names::CLUSTER_ROLE_NAME.to_string(),
            },
        }
    }

    /// Build the restrictive PodSecurityPolicy used when `rbac.pspEnable` is set
    pub fn build_pod_security_policy(&self) -> PodSecurityPolicy {
        let run_as_any = || StrategyOptions {
            rule: "RunAsAny".to_string(),
            ranges: vec![],
        };
        let spec = PodSecurityPolicySpec {
            privileged: false,
            allow_privilege_escalation: Some(false),
            required_drop_capabilities: vec!["ALL".to_string()],
            volumes: [
                "configMap",
                "emptyDir",
                "projected",
                "secret",
                "downwardAPI",
                "persistentVolumeClaim",
            ]
            .iter()
            .map(|v| v.to_string())
            .collect(),
            host_network: false,
            host_ipc: false,
            host_pid: false,
            read_only_root_filesystem: false,
            run_as_user: run_as_any(),
            se_linux: run_as_any(),
            supplemental_groups: run_as_any(),
            fs_group: run_as_any(),
        };

        let mut psp = PodSecurityPolicy::new(names::PSP_NAME, spec);
        psp.metadata.labels = Some(managed_labels(&self.name));
        psp
    }

    /// Build the GatewayClass served by the gateway-API sidecar
    pub fn build_gateway_class(&self) -> GatewayClass {
        let spec = GatewayClassSpec {
            controller_name: names::GATEWAY_CLASS_CONTROLLER.to_string(),
            description: None,
        };
        let mut class = GatewayClass::new(names::GATEWAY_CLASS_NAME, spec);
        class.metadata.labels = Some(managed_labels(&self.name));
        class
    }

    /// Build the StatefulSet running AKO
    pub fn build_statefulset(&self) -> Result<StatefulSet> {
        let spec = self.spec();
        let port = spec.api_server_port();
        let resources = build_resources(spec)?;

        let mut containers = vec![self.build_main_container(resources.clone())?];
        if spec.gateway_api_enabled() {
            containers.push(self.build_gateway_container(resources)?);
        }

        let annotations = if spec.feature_gates.enable_prometheus {
            let mut annotations = BTreeMap::new();
            annotations.insert("prometheus.io/scrape".to_string(), "true".to_string());
            annotations.insert("prometheus.io/port".to_string(), port.to_string());
            annotations.insert("prometheus.io/path".to_string(), "/metrics".to_string());
            Some(annotations)
        } else {
            None
        };

        let volumes = if spec.pvc_enabled() {
            Some(vec![Volume {
                name: LOG_VOLUME_NAME.to_string(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: spec.pvc.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            }])
        } else {
            None
        };

        let pod_spec = PodSpec {
            service_account_name: Some(names::SERVICE_ACCOUNT_NAME.to_string()),
            containers,
            volumes,
            affinity: Some(anti_affinity()),
            image_pull_secrets: if spec.image_pull_secrets.is_empty() {
                None
            } else {
                Some(
                    spec.image_pull_secrets
                        .iter()
                        .map(|s| LocalObjectReference { name: s.clone() })
                        .collect(),
                )
            },
            ..Default::default()
        };

        Ok(StatefulSet {
            metadata: self.namespaced_metadata(names::STATEFULSET_NAME),
            spec: Some(StatefulSetSpec {
                replicas: Some(1),
                service_name: names::SERVICE_NAME.to_string(),
                selector: LabelSelector {
                    match_labels: Some(selector_labels()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(selector_labels()),
                        annotations,
                        ..Default::default()
                    }),
                    spec: Some(pod_spec),
                },
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn build_main_container(&self, resources: ResourceRequirements) -> Result<Container> {
        let spec = self.spec();
        let port = spec.api_server_port();

        let mut env: Vec<EnvVar> = names::AKO_CONFIGMAP_ENV
            .iter()
            .filter(|(var, _)| spec.is_node_port() || !names::NODE_PORT_ENV.contains(var))
            .map(|(var, key)| configmap_env(var, key))
            .collect();
        env.extend(secret_env());
        env.extend(downward_env());
        if spec.pvc_enabled() {
            env.push(value_env("USE_PVC", "true"));
        }
        env.push(value_env("LOG_FILE_PATH", &spec.mount_path));
        env.push(value_env("LOG_FILE_NAME", &spec.log_file));

        let ports = if spec.feature_gates.enable_prometheus {
            Some(vec![ContainerPort {
                name: Some(PROMETHEUS_PORT_NAME.to_string()),
                container_port: port,
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }])
        } else {
            None
        };

        Ok(Container {
            name: MAIN_CONTAINER_NAME.to_string(),
            image: Some(spec.image().to_string()),
            image_pull_policy: Some(parse_pull_policy(&spec.image_pull_policy)?),
            env: Some(env),
            ports,
            resources: Some(resources),
            liveness_probe: Some(Probe {
                http_get: Some(HTTPGetAction {
                    path: Some("/api/status".to_string()),
                    port: IntOrString::Int(port),
                    ..Default::default()
                }),
                initial_delay_seconds: Some(5),
                period_seconds: Some(10),
                ..Default::default()
            }),
            lifecycle: Some(Lifecycle {
                pre_stop: Some(LifecycleHandler {
                    exec: Some(ExecAction {
                        command: Some(vec![
                            "/bin/sh".to_string(),
                            "/var/pre_stop_hook.sh".to_string(),
                        ]),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            volume_mounts: self.volume_mounts(),
            ..Default::default()
        })
    }

    /// Sidecar serving the gateway API. Shares resources and log volume with
    /// the main container.
    fn build_gateway_container(&self, resources: ResourceRequirements) -> Result<Container> {
        let spec = self.spec();

        let mut env: Vec<EnvVar> = names::GATEWAY_CONFIGMAP_ENV
            .iter()
            .map(|(var, key)| configmap_env(var, key))
            .collect();
        env.extend(secret_env());
        env.extend(downward_env());
        if spec.pvc_enabled() {
            env.push(value_env("USE_PVC", "true"));
        }
        env.push(value_env("LOG_FILE_PATH", &spec.mount_path));
        env.push(value_env("LOG_FILE_NAME", &spec.ako_gateway_log_file));

        Ok(Container {
            name: GATEWAY_CONTAINER_NAME.to_string(),
            image: Some(spec.gateway_image().to_string()),
            image_pull_policy: Some(parse_pull_policy(&spec.gateway_api.image.pull_policy)?),
            env: Some(env),
            resources: Some(resources),
            volume_mounts: self.volume_mounts(),
            ..Default::default()
        })
    }

    fn volume_mounts(&self) -> Option<Vec<VolumeMount>> {
        let spec = self.spec();
        if !spec.pvc_enabled() {
            return None;
        }
        Some(vec![VolumeMount {
            name: LOG_VOLUME_NAME.to_string(),
            mount_path: spec.mount_path.clone(),
            ..Default::default()
        }])
    }
}

/// JSON encoding of a list setting; an empty list is the empty string
fn json_list<T: Serialize>(items: &[T]) -> Result<String> {
    if items.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(items)?)
}

fn parse_pull_policy(value: &str) -> Result<String> {
    if PULL_POLICIES.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(OperatorError::InvalidPullPolicy(value.to_string()))
    }
}

/// Parse a quantity setting. Unset falls back to `default`; set but empty or
/// malformed is an error.
fn parse_quantity(field: &str, value: Option<&str>, default: &str) -> Result<Quantity> {
    let value = value.unwrap_or(default);
    if !QUANTITY_REGEX.is_match(value) {
        return Err(OperatorError::InvalidQuantity {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(Quantity(value.to_string()))
}

fn quantities(
    section: &str,
    amounts: &ResourceAmounts,
    cpu_default: &str,
    memory_default: &str,
) -> Result<BTreeMap<String, Quantity>> {
    let mut map = BTreeMap::new();
    map.insert(
        "cpu".to_string(),
        parse_quantity(
            &format!("resources.{}.cpu", section),
            amounts.cpu.as_deref(),
            cpu_default,
        )?,
    );
    map.insert(
        "memory".to_string(),
        parse_quantity(
            &format!("resources.{}.memory", section),
            amounts.memory.as_deref(),
            memory_default,
        )?,
    );
    Ok(map)
}

fn build_resources(spec: &AKOConfigSpec) -> Result<ResourceRequirements> {
    Ok(ResourceRequirements {
        limits: Some(quantities(
            "limits",
            &spec.resources.limits,
            DEFAULT_LIMIT_CPU,
            DEFAULT_LIMIT_MEMORY,
        )?),
        requests: Some(quantities(
            "requests",
            &spec.resources.requests,
            DEFAULT_REQUEST_CPU,
            DEFAULT_REQUEST_MEMORY,
        )?),
        ..Default::default()
    })
}

/// At most one AKO pod per node
fn anti_affinity() -> Affinity {
    Affinity {
        pod_anti_affinity: Some(PodAntiAffinity {
            required_during_scheduling_ignored_during_execution: Some(vec![PodAffinityTerm {
                label_selector: Some(LabelSelector {
                    match_expressions: Some(vec![LabelSelectorRequirement {
                        key: "app.kubernetes.io/name".to_string(),
                        operator: "In".to_string(),
                        values: Some(vec!["ako".to_string()]),
                    }]),
                    ..Default::default()
                }),
                topology_key: "kubernetes.io/hostname".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn configmap_env(var: &str, key: &str) -> EnvVar {
    EnvVar {
        name: var.to_string(),
        value_from: Some(EnvVarSource {
            config_map_key_ref: Some(ConfigMapKeySelector {
                name: names::CONFIGMAP_NAME.to_string(),
                key: key.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn secret_env() -> Vec<EnvVar> {
    names::SECRET_ENV
        .iter()
        .map(|(var, key, optional)| EnvVar {
            name: var.to_string(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: names::AVI_SECRET_NAME.to_string(),
                    key: key.to_string(),
                    optional: optional.then_some(true),
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect()
}

fn downward_env() -> Vec<EnvVar> {
    [("POD_NAME", "metadata.name"), ("POD_NAMESPACE", "metadata.namespace")]
        .iter()
        .map(|(var, path)| EnvVar {
            name: var.to_string(),
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    api_version: Some("v1".to_string()),
                    field_path: path.to_string(),
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect()
}

fn value_env(var: &str, value: &str) -> EnvVar {
    EnvVar {
        name: var.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{NodeNetwork, VipNetwork};

    fn create_test_config(namespace: &str, spec: AKOConfigSpec) -> AKOConfig {
        let mut config = AKOConfig::new("ako-config", spec);
        config.metadata.namespace = Some(namespace.to_string());
        config.metadata.uid = Some("test-uid-123".to_string());
        config
    }

    fn configmap(spec: AKOConfigSpec) -> BTreeMap<String, String> {
        let config = create_test_config("avi-system", spec);
        ResourceBuilder::new(&config)
            .unwrap()
            .build_configmap()
            .unwrap()
            .data
            .unwrap()
    }

    fn statefulset(spec: AKOConfigSpec) -> StatefulSet {
        let config = create_test_config("avi-system", spec);
        ResourceBuilder::new(&config)
            .unwrap()
            .build_statefulset()
            .unwrap()
    }

    fn pod_spec(sts: &StatefulSet) -> &PodSpec {
        sts.spec.as_ref().unwrap().template.spec.as_ref().unwrap()
    }

    fn env_names(container: &Container) -> Vec<&str> {
        container
            .env
            .as_ref()
            .unwrap()
            .iter()
            .map(|var| var.name.as_str())
            .collect()
    }

    fn env_var<'c>(container: &'c Container, name: &str) -> &'c EnvVar {
        container
            .env
            .as_ref()
            .unwrap()
            .iter()
            .find(|var| var.name == name)
            .unwrap()
    }

    #[test]
    fn test_builder_requires_name() {
        let mut config = create_test_config("avi-system", AKOConfigSpec::default());
        config.metadata.name = None;
        assert!(ResourceBuilder::new(&config).is_err());
    }

    #[test]
    fn test_configmap_node_port_keys() {
        let mut spec = AKOConfigSpec::default();
        spec.l7_settings.service_type = "NodePort".to_string();
        spec.node_port_selector.key = "k".to_string();
        spec.node_port_selector.value = "v".to_string();

        let data = configmap(spec);
        assert_eq!(data.get("serviceType").map(String::as_str), Some("NodePort"));
        assert_eq!(data.get("nodeKey").map(String::as_str), Some("k"));
        assert_eq!(data.get("nodeValue").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_configmap_cluster_ip_omits_node_keys() {
        let mut spec = AKOConfigSpec::default();
        spec.node_port_selector.key = "k".to_string();

        let data = configmap(spec);
        assert!(!data.contains_key("nodeKey"));
        assert!(!data.contains_key("nodeValue"));
    }

    #[test]
    fn test_configmap_defaults() {
        let data = configmap(AKOConfigSpec::default());

        assert_eq!(data["apiServerPort"], "8080");
        assert_eq!(data["primaryInstance"], "true");
        assert_eq!(data["enableMCI"], "false");
        assert_eq!(data["logLevel"], "WARN");
        assert_eq!(data["deleteConfig"], "false");
        assert_eq!(data["enableEvents"], "true");
        assert_eq!(data["nodeNetworkList"], "");
        assert_eq!(data["vipNetworkList"], "");
        assert_eq!(data["bgpPeerLabels"], "");
        assert_eq!(data["passhtroughShardSize"], "SMALL");
    }

    #[test]
    fn test_configmap_node_network_list_encoding() {
        let mut spec = AKOConfigSpec::default();
        spec.network_settings.node_network_list = vec![NodeNetwork {
            cidrs: vec!["10.0.0.0/24".to_string()],
            network_name: "nw1".to_string(),
            network_uuid: String::new(),
        }];

        let data = configmap(spec);
        assert_eq!(
            data["nodeNetworkList"],
            r#"[{"cidrs":["10.0.0.0/24"],"networkName":"nw1"}]"#
        );
    }

    #[test]
    fn test_configmap_vip_network_list_encoding() {
        let mut spec = AKOConfigSpec::default();
        spec.network_settings.vip_network_list = vec![VipNetwork {
            network_name: "vip".to_string(),
            cidr: "10.1.0.0/24".to_string(),
            ..Default::default()
        }];

        let data = configmap(spec);
        let decoded: serde_json::Value = serde_json::from_str(&data["vipNetworkList"]).unwrap();
        assert_eq!(decoded[0]["networkName"], "vip");
        assert_eq!(decoded[0]["cidr"], "10.1.0.0/24");
    }

    #[test]
    fn test_configmap_default_domain_precedence() {
        let mut spec = AKOConfigSpec::default();
        spec.l4_settings.default_domain = "l4.example.com".to_string();
        assert_eq!(configmap(spec.clone())["defaultDomain"], "l4.example.com");

        spec.network_settings.default_domain = "net.example.com".to_string();
        assert_eq!(configmap(spec)["defaultDomain"], "net.example.com");
    }

    #[test]
    fn test_configmap_is_deterministic() {
        let mut spec = AKOConfigSpec::default();
        spec.network_settings.bgp_peer_labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(configmap(spec.clone()), configmap(spec));
    }

    #[test]
    fn test_statefulset_cluster_ip_env() {
        let sts = statefulset(AKOConfigSpec::default());
        let containers = &pod_spec(&sts).containers;

        assert_eq!(containers.len(), 1);
        let names = env_names(&containers[0]);
        assert!(!names.contains(&"NODE_KEY"));
        assert!(!names.contains(&"NODE_VALUE"));
        assert!(!names.contains(&"USE_PVC"));
        assert!(names.contains(&"CTRL_IPADDRESS"));

        let ctrl = env_var(&containers[0], "CTRL_IPADDRESS");
        let key_ref = ctrl
            .value_from
            .as_ref()
            .unwrap()
            .config_map_key_ref
            .as_ref()
            .unwrap();
        assert_eq!(key_ref.name, "avi-k8s-config");
        assert_eq!(key_ref.key, "controllerIP");
        assert!(ctrl.value.is_none());
    }

    #[test]
    fn test_statefulset_node_port_env() {
        let mut spec = AKOConfigSpec::default();
        spec.l7_settings.service_type = "NodePort".to_string();

        let sts = statefulset(spec);
        let names = env_names(&pod_spec(&sts).containers[0]);
        assert!(names.contains(&"NODE_KEY"));
        assert!(names.contains(&"NODE_VALUE"));
    }

    #[test]
    fn test_statefulset_secret_env() {
        let sts = statefulset(AKOConfigSpec::default());
        let container = &pod_spec(&sts).containers[0];

        let username = env_var(container, "CTRL_USERNAME");
        let selector = username
            .value_from
            .as_ref()
            .unwrap()
            .secret_key_ref
            .as_ref()
            .unwrap();
        assert_eq!(selector.name, "avi-secret");
        assert_eq!(selector.optional, None);

        let password = env_var(container, "CTRL_PASSWORD");
        let selector = password
            .value_from
            .as_ref()
            .unwrap()
            .secret_key_ref
            .as_ref()
            .unwrap();
        assert_eq!(selector.optional, Some(true));
    }

    #[test]
    fn test_statefulset_shape() {
        let sts = statefulset(AKOConfigSpec::default());
        let spec = sts.spec.as_ref().unwrap();
        let container = &pod_spec(&sts).containers[0];

        assert_eq!(sts.metadata.name.as_deref(), Some("ako"));
        assert_eq!(sts.metadata.namespace.as_deref(), Some("avi-system"));
        assert_eq!(spec.replicas, Some(1));
        assert_eq!(
            pod_spec(&sts).service_account_name.as_deref(),
            Some("ako-sa")
        );
        assert_eq!(container.image.as_deref(), Some(crate::crd::DEFAULT_IMAGE));
        assert_eq!(container.image_pull_policy.as_deref(), Some("IfNotPresent"));

        let probe = container.liveness_probe.as_ref().unwrap();
        let get = probe.http_get.as_ref().unwrap();
        assert_eq!(get.path.as_deref(), Some("/api/status"));
        assert_eq!(get.port, IntOrString::Int(8080));
        assert_eq!(probe.initial_delay_seconds, Some(5));
        assert_eq!(probe.period_seconds, Some(10));

        let limits = container.resources.as_ref().unwrap().limits.as_ref().unwrap();
        assert_eq!(limits["cpu"], Quantity("350m".to_string()));
        assert_eq!(limits["memory"], Quantity("400Mi".to_string()));
        assert!(pod_spec(&sts).affinity.is_some());
    }

    #[test]
    fn test_statefulset_invalid_pull_policy() {
        let mut spec = AKOConfigSpec::default();
        spec.image_pull_policy = "Sometimes".to_string();

        let config = create_test_config("avi-system", spec);
        let err = ResourceBuilder::new(&config)
            .unwrap()
            .build_statefulset()
            .unwrap_err();
        assert!(matches!(err, OperatorError::InvalidPullPolicy(ref p) if p == "Sometimes"));
    }

    #[test]
    fn test_statefulset_invalid_quantity() {
        let mut spec = AKOConfigSpec::default();
        spec.resources.limits.memory = Some("lots".to_string());

        let config = create_test_config("avi-system", spec.clone());
        let err = ResourceBuilder::new(&config)
            .unwrap()
            .build_statefulset()
            .unwrap_err();
        assert!(matches!(err, OperatorError::InvalidQuantity { .. }));

        spec.resources.limits.memory = Some(String::new());
        let config = create_test_config("avi-system", spec);
        assert!(ResourceBuilder::new(&config)
            .unwrap()
            .build_statefulset()
            .is_err());
    }

    #[test]
    fn test_statefulset_pvc() {
        let mut spec = AKOConfigSpec::default();
        spec.pvc = "ako-logs".to_string();

        let sts = statefulset(spec);
        let pod = pod_spec(&sts);
        let volumes = pod.volumes.as_ref().unwrap();
        assert_eq!(volumes[0].name, "ako-pv-storage");
        assert_eq!(
            volumes[0].persistent_volume_claim.as_ref().unwrap().claim_name,
            "ako-logs"
        );

        let container = &pod.containers[0];
        let mounts = container.volume_mounts.as_ref().unwrap();
        assert_eq!(mounts[0].mount_path, "/log");
        assert_eq!(env_var(container, "USE_PVC").value.as_deref(), Some("true"));
    }

    #[test]
    fn test_statefulset_gateway_sidecar() {
        let mut spec = AKOConfigSpec::default();
        spec.feature_gates.gateway_api = true;

        let sts = statefulset(spec);
        let containers = &pod_spec(&sts).containers;
        assert_eq!(containers.len(), 2);

        let sidecar = &containers[1];
        assert_eq!(sidecar.name, "ako-gateway-api");
        assert_eq!(
            sidecar.image.as_deref(),
            Some(crate::crd::DEFAULT_GATEWAY_IMAGE)
        );
        assert_eq!(
            env_var(sidecar, "LOG_FILE_NAME").value.as_deref(),
            Some("avi-gw.log")
        );
        assert!(env_names(sidecar).len() < env_names(&containers[0]).len());
    }

    #[test]
    fn test_statefulset_prometheus() {
        let mut spec = AKOConfigSpec::default();
        spec.ako_settings.api_server_port = 9090;
        spec.feature_gates.enable_prometheus = true;

        let sts = statefulset(spec);
        let template = &sts.spec.as_ref().unwrap().template;
        let annotations = template.metadata.as_ref().unwrap().annotations.as_ref().unwrap();
        assert_eq!(annotations["prometheus.io/scrape"], "true");
        assert_eq!(annotations["prometheus.io/port"], "9090");

        let ports = pod_spec(&sts).containers[0].ports.as_ref().unwrap();
        assert_eq!(ports[0].name.as_deref(), Some("prometheus-port"));
        assert_eq!(ports[0].container_port, 9090);
    }

    #[test]
    fn test_statefulset_is_deterministic() {
        let mut spec = AKOConfigSpec::default();
        spec.feature_gates.gateway_api = true;
        spec.pvc = "logs".to_string();
        assert_eq!(statefulset(spec.clone()), statefulset(spec));
    }

    #[test]
    fn test_owner_references() {
        let config = create_test_config("avi-system", AKOConfigSpec::default());
        let cm = ResourceBuilder::new(&config)
            .unwrap()
            .build_configmap()
            .unwrap();

        let owner_refs = cm.metadata.owner_references.as_ref().unwrap();
        assert_eq!(owner_refs.len(), 1);
        assert_eq!(owner_refs[0].kind, "AKOConfig");
        assert_eq!(owner_refs[0].name, "ako-config");
        assert_eq!(owner_refs[0].uid, "test-uid-123");
    }

    #[test]
    fn test_no_cross_namespace_owner_reference() {
        let config = create_test_config("default", AKOConfigSpec::default());
        let cm = ResourceBuilder::new(&config)
            .unwrap()
            .build_configmap()
            .unwrap();

        assert!(cm.metadata.owner_references.is_none());
        assert_eq!(cm.metadata.namespace.as_deref(), Some("avi-system"));
    }

    #[test]
    fn test_cluster_scoped_objects() {
        let mut spec = AKOConfigSpec::default();
        spec.rbac.psp_enable = true;
        let config = create_test_config("avi-system", spec);
        let builder = ResourceBuilder::new(&config).unwrap();

        let crb = builder.build_cluster_role_binding();
        let subject = &crb.subjects.as_ref().unwrap()[0];
        assert_eq!(subject.name, "ako-sa");
        assert_eq!(subject.namespace.as_deref(), Some("avi-system"));
        assert_eq!(crb.role_ref.name, "ako-cr");

        let role = builder.build_cluster_role();
        assert!(role
            .rules
            .as_ref()
            .unwrap()
            .iter()
            .any(|rule| rule.verbs.contains(&"use".to_string())));

        let psp = builder.build_pod_security_policy();
        assert_eq!(psp.metadata.name.as_deref(), Some("ako"));
        assert!(!psp.spec.privileged);

        let class = builder.build_gateway_class();
        assert_eq!(class.spec.controller_name, "ako.vmware.com/avi-lb");
        assert!(class.metadata.owner_references.is_none());
    }
}
