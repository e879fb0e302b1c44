//! Rule CRDs consumed by the AKO workload
//!
//! AKO reads `HostRule`, `HTTPRule` and `AviInfraSetting` objects. The
//! operator installs their definitions when absent and removes them on
//! cleanup. The schemas are generated from the reduced types below.

use crate::crd::VipNetwork;
use crate::error::Result;
use crate::session::{ObjectId, ObjectRegistry, ResourceKind};
use crate::store::{ClusterObject, ObjectStore};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{CustomResource, CustomResourceExt, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Per-host virtual service overrides
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ako.vmware.com",
    version = "v1beta1",
    kind = "HostRule",
    plural = "hostrules",
    shortname = "hostrule",
    namespaced,
    status = "RuleStatus"
)]
pub struct HostRuleSpec {
    #[serde(default)]
    pub virtualhost: HostRuleVirtualHost,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostRuleVirtualHost {
    #[serde(default)]
    pub fqdn: String,
    /// Exact, Wildcard or Contains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_virtual_host: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waf_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<HostRuleTls>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostRuleTls {
    #[serde(default)]
    pub ssl_key_certificate: NamedRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination: Option<String>,
}

/// Reference to a controller-side or Kubernetes object
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct NamedRef {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

/// Per-path pool overrides
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ako.vmware.com",
    version = "v1beta1",
    kind = "HTTPRule",
    plural = "httprules",
    shortname = "httprule",
    namespaced,
    status = "RuleStatus"
)]
pub struct HTTPRuleSpec {
    #[serde(default)]
    pub fqdn: String,
    #[serde(default)]
    pub paths: Vec<HTTPRulePath>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HTTPRulePath {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer_policy: Option<LoadBalancerPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<PathTls>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub health_monitors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_persistence: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathTls {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_profile: Option<String>,
    #[serde(default, rename = "destinationCA", skip_serializing_if = "Option::is_none")]
    pub destination_ca: Option<String>,
}

/// Infrastructure placement for a set of virtual services
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ako.vmware.com",
    version = "v1beta1",
    kind = "AviInfraSetting",
    plural = "aviinfrasettings",
    shortname = "aviinfrasetting",
    status = "RuleStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct AviInfraSettingSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub se_group: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<InfraNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l7_settings: Option<InfraL7Settings>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfraNetwork {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vip_networks: Vec<VipNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_rhi: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bgp_peer_labels: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfraL7Settings {
    pub shard_size: String,
}

/// Status written by AKO on every rule kind
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct RuleStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Definitions of every rule CRD, in install order
pub fn rule_crds() -> Vec<CustomResourceDefinition> {
    vec![HostRule::crd(), HTTPRule::crd(), AviInfraSetting::crd()]
}

/// Names of the rule CRDs, e.g. `hostrules.ako.vmware.com`
pub fn rule_crd_names() -> Vec<String> {
    rule_crds().iter().map(|crd| crd.name_any()).collect()
}

/// Create every rule CRD that does not exist yet and record the live
/// definitions. Existing definitions are left untouched.
pub async fn ensure_crds<S: ObjectStore>(store: &S, registry: &ObjectRegistry) -> Result<()> {
    for crd in rule_crds() {
        let name = crd.name_any();
        let live = match store.get::<CustomResourceDefinition>(None, &name).await? {
            Some(existing) => {
                debug!(crd = %name, "CRD already installed");
                existing
            }
            None => match store.create(&crd).await {
                Ok(created) => {
                    info!(crd = %name, "Installed CRD");
                    created
                }
                Err(e) if e.is_already_exists() => {
                    match store.get::<CustomResourceDefinition>(None, &name).await? {
                        Some(existing) => existing,
                        None => continue,
                    }
                }
                Err(e) => return Err(e),
            },
        };
        registry.record(live.into_managed());
    }
    Ok(())
}

/// Delete every rule CRD; missing definitions are not an error
pub async fn delete_crds<S: ObjectStore>(store: &S, registry: &ObjectRegistry) -> Result<()> {
    for name in rule_crd_names() {
        if store
            .delete::<CustomResourceDefinition>(None, &name)
            .await?
        {
            info!(crd = %name, "Deleted CRD");
        }
        registry.remove(&ObjectId::new(
            ResourceKind::CustomResourceDefinition,
            None,
            &name,
        ));
    }
    Ok(())
}
