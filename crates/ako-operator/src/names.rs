//! Well-known names of every object the operator manages, plus the
//! ConfigMap keys and the environment variables that reference them.
//!
//! Names are fixed so that cleanup can rediscover every managed object after
//! an operator restart without any persisted state.

/// Namespace all namespaced AKO objects live in
pub const AVI_SYSTEM_NAMESPACE: &str = "avi-system";

pub const STATEFULSET_NAME: &str = "ako";
pub const SERVICE_NAME: &str = "ako";
pub const CONFIGMAP_NAME: &str = "avi-k8s-config";
pub const SERVICE_ACCOUNT_NAME: &str = "ako-sa";
pub const CLUSTER_ROLE_NAME: &str = "ako-cr";
pub const CLUSTER_ROLE_BINDING_NAME: &str = "ako-crb";
pub const PSP_NAME: &str = "ako";
pub const AVI_SECRET_NAME: &str = "avi-secret";
pub const GATEWAY_CLASS_NAME: &str = "avi-lb";
pub const GATEWAY_CLASS_CONTROLLER: &str = "ako.vmware.com/avi-lb";

/// Field manager / `managed-by` label value
pub const OPERATOR_NAME: &str = "ako-operator";

/// Label selector matching every object this operator created
pub const MANAGED_BY_SELECTOR: &str = "app.kubernetes.io/managed-by=ako-operator";

/// ConfigMap keys
pub mod keys {
    pub const CONTROLLER_IP: &str = "controllerIP";
    pub const CONTROLLER_VERSION: &str = "controllerVersion";
    pub const CNI_PLUGIN: &str = "cniPlugin";
    pub const ENABLE_EVH: &str = "enableEVH";
    pub const LAYER7_ONLY: &str = "layer7Only";
    pub const SERVICES_API: &str = "servicesAPI";
    pub const VIP_PER_NAMESPACE: &str = "vipPerNamespace";
    pub const SHARD_VS_SIZE: &str = "shardVSSize";
    pub const PASSTHROUGH_SHARD_SIZE: &str = "passhtroughShardSize";
    pub const FULL_SYNC_FREQUENCY: &str = "fullSyncFrequency";
    pub const CLOUD_NAME: &str = "cloudName";
    pub const CLUSTER_NAME: &str = "clusterName";
    pub const ENABLE_RHI: &str = "enableRHI";
    pub const DEFAULT_DOMAIN: &str = "defaultDomain";
    pub const DISABLE_STATIC_ROUTE_SYNC: &str = "disableStaticRouteSync";
    pub const DEFAULT_ING_CONTROLLER: &str = "defaultIngController";
    pub const VIP_NETWORK_LIST: &str = "vipNetworkList";
    pub const BGP_PEER_LABELS: &str = "bgpPeerLabels";
    pub const ENABLE_EVENTS: &str = "enableEvents";
    pub const LOG_LEVEL: &str = "logLevel";
    pub const DELETE_CONFIG: &str = "deleteConfig";
    pub const AUTO_FQDN: &str = "autoFQDN";
    pub const SERVICE_TYPE: &str = "serviceType";
    pub const NODE_KEY: &str = "nodeKey";
    pub const NODE_VALUE: &str = "nodeValue";
    pub const SERVICE_ENGINE_GROUP_NAME: &str = "serviceEngineGroupName";
    pub const NODE_NETWORK_LIST: &str = "nodeNetworkList";
    pub const API_SERVER_PORT: &str = "apiServerPort";
    pub const NS_SYNC_LABEL_KEY: &str = "nsSyncLabelKey";
    pub const NS_SYNC_LABEL_VALUE: &str = "nsSyncLabelValue";
    pub const TENANT_NAME: &str = "tenantName";
    pub const NO_PG_FOR_SNI: &str = "noPGForSni";
    pub const NSXT_T1_LR: &str = "nsxtT1LR";
    pub const PRIMARY_INSTANCE: &str = "primaryInstance";
    pub const ISTIO_ENABLED: &str = "istioEnabled";
    pub const BLOCKED_NAMESPACE_LIST: &str = "blockedNamespaceList";
    pub const IP_FAMILY: &str = "ipFamily";
    pub const ENABLE_MCI: &str = "enableMCI";
    pub const USE_DEFAULT_SECRETS_ONLY: &str = "useDefaultSecretsOnly";
    pub const DEFAULT_LB_CONTROLLER: &str = "defaultLBController";
    pub const VRF_NAME: &str = "vrfName";
    pub const ENABLE_PROMETHEUS: &str = "enablePrometheus";
    pub const FQDN_REUSE_POLICY: &str = "fqdnReusePolicy";
    pub const ENABLE_ENDPOINT_SLICE: &str = "enableEndpointSlice";
}

/// ConfigMap keys that the running workload picks up live.
///
/// A change confined to these keys updates the ConfigMap without restarting
/// the StatefulSet. Every other key is cold.
pub const HOT_CONFIG_KEYS: &[&str] = &[keys::DELETE_CONFIG, keys::LOG_LEVEL];

/// Environment variables of the AKO container, sourced from ConfigMap keys.
pub const AKO_CONFIGMAP_ENV: &[(&str, &str)] = &[
    ("CTRL_IPADDRESS", keys::CONTROLLER_IP),
    ("CTRL_VERSION", keys::CONTROLLER_VERSION),
    ("CNI_PLUGIN", keys::CNI_PLUGIN),
    ("ENABLE_EVH", keys::ENABLE_EVH),
    ("SERVICES_API", keys::SERVICES_API),
    ("SHARD_VS_SIZE", keys::SHARD_VS_SIZE),
    ("PASSTHROUGH_SHARD_SIZE", keys::PASSTHROUGH_SHARD_SIZE),
    ("FULL_SYNC_INTERVAL", keys::FULL_SYNC_FREQUENCY),
    ("CLOUD_NAME", keys::CLOUD_NAME),
    ("CLUSTER_NAME", keys::CLUSTER_NAME),
    ("ENABLE_RHI", keys::ENABLE_RHI),
    ("BGP_PEER_LABELS", keys::BGP_PEER_LABELS),
    ("DEFAULT_DOMAIN", keys::DEFAULT_DOMAIN),
    ("DISABLE_STATIC_ROUTE_SYNC", keys::DISABLE_STATIC_ROUTE_SYNC),
    ("DEFAULT_ING_CONTROLLER", keys::DEFAULT_ING_CONTROLLER),
    ("VIP_NETWORK_LIST", keys::VIP_NETWORK_LIST),
    ("AUTO_L4_FQDN", keys::AUTO_FQDN),
    ("SERVICE_TYPE", keys::SERVICE_TYPE),
    ("NODE_KEY", keys::NODE_KEY),
    ("NODE_VALUE", keys::NODE_VALUE),
    ("SEG_NAME", keys::SERVICE_ENGINE_GROUP_NAME),
    ("NODE_NETWORK_LIST", keys::NODE_NETWORK_LIST),
    ("AKO_API_PORT", keys::API_SERVER_PORT),
    ("TENANT_NAME", keys::TENANT_NAME),
    ("NAMESPACE_SYNC_LABEL_KEY", keys::NS_SYNC_LABEL_KEY),
    ("NAMESPACE_SYNC_LABEL_VALUE", keys::NS_SYNC_LABEL_VALUE),
    ("NSXT_T1_LR", keys::NSXT_T1_LR),
    ("PRIMARY_AKO_FLAG", keys::PRIMARY_INSTANCE),
    ("ISTIO_ENABLED", keys::ISTIO_ENABLED),
    ("IP_FAMILY", keys::IP_FAMILY),
    ("MCI_ENABLED", keys::ENABLE_MCI),
    ("BLOCKED_NS_LIST", keys::BLOCKED_NAMESPACE_LIST),
    ("VIP_PER_NAMESPACE", keys::VIP_PER_NAMESPACE),
    ("USE_DEFAULT_SECRETS_ONLY", keys::USE_DEFAULT_SECRETS_ONLY),
    ("VRF_NAME", keys::VRF_NAME),
    ("DEFAULT_LB_CONTROLLER", keys::DEFAULT_LB_CONTROLLER),
    ("PROMETHEUS_ENABLED", keys::ENABLE_PROMETHEUS),
    ("FQDN_REUSE_POLICY", keys::FQDN_REUSE_POLICY),
    ("ENDPOINTSLICES_ENABLED", keys::ENABLE_ENDPOINT_SLICE),
];

/// Environment variables only meaningful with `serviceType = NodePort`
pub const NODE_PORT_ENV: &[&str] = &["NODE_KEY", "NODE_VALUE"];

/// Environment variables of the gateway-API sidecar, sourced from ConfigMap keys.
pub const GATEWAY_CONFIGMAP_ENV: &[(&str, &str)] = &[
    ("CTRL_IPADDRESS", keys::CONTROLLER_IP),
    ("CTRL_VERSION", keys::CONTROLLER_VERSION),
    ("FULL_SYNC_INTERVAL", keys::FULL_SYNC_FREQUENCY),
    ("CLOUD_NAME", keys::CLOUD_NAME),
    ("CLUSTER_NAME", keys::CLUSTER_NAME),
    ("SEG_NAME", keys::SERVICE_ENGINE_GROUP_NAME),
    ("TENANT_NAME", keys::TENANT_NAME),
    ("PRIMARY_AKO_FLAG", keys::PRIMARY_INSTANCE),
];

/// Environment variables sourced from the controller credential secret:
/// (variable, secret key, optional)
pub const SECRET_ENV: &[(&str, &str, bool)] = &[
    ("CTRL_USERNAME", "username", false),
    ("CTRL_PASSWORD", "password", true),
    ("CTRL_AUTHTOKEN", "authtoken", true),
    ("CTRL_CA_DATA", "certificateAuthorityData", true),
];
