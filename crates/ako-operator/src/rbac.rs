//! Static RBAC rules granted to the AKO service account

use crate::names;
use k8s_openapi::api::rbac::v1::PolicyRule;

const READ: &[&str] = &["get", "watch", "list"];
const READ_UPDATE: &[&str] = &["get", "watch", "list", "patch", "update"];

/// (api groups, resources, verbs)
const RULES: &[(&[&str], &[&str], &[&str])] = &[
    (&[""], &["*"], &["get", "watch", "list", "patch"]),
    (&["apps"], &["statefulsets"], READ),
    (&["apps"], &["statefulsets/status"], READ_UPDATE),
    (
        &["extensions", "networking.k8s.io"],
        &["ingresses", "ingresses/status", "ingressclasses"],
        READ_UPDATE,
    ),
    (&[""], &["services/status"], READ_UPDATE),
    (&[""], &["events"], &["create", "patch", "update"]),
    (&["discovery.k8s.io"], &["endpointslices"], READ),
    (&["crd.projectcalico.org"], &["blockaffinities"], READ),
    (&["network.openshift.io"], &["hostsubnets"], READ),
    (&["route.openshift.io"], &["routes", "routes/status"], READ_UPDATE),
    (
        &["ako.vmware.com"],
        &[
            "hostrules",
            "hostrules/status",
            "httprules",
            "httprules/status",
            "aviinfrasettings",
            "aviinfrasettings/status",
        ],
        READ_UPDATE,
    ),
    (
        &["gateway.networking.k8s.io"],
        &[
            "gateways",
            "gateways/status",
            "gatewayclasses",
            "gatewayclasses/status",
            "httproutes",
            "httproutes/status",
        ],
        READ_UPDATE,
    ),
    (&["coordination.k8s.io"], &["leases"], &["create", "get", "update"]),
];

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Rules of the AKO ClusterRole; with `psp_enabled` the role may also use the
/// operator's PodSecurityPolicy.
pub fn cluster_role_rules(psp_enabled: bool) -> Vec<PolicyRule> {
    let mut rules: Vec<PolicyRule> = RULES
        .iter()
        .map(|(groups, resources, verbs)| PolicyRule {
            api_groups: Some(to_strings(groups)),
            resources: Some(to_strings(resources)),
            verbs: to_strings(verbs),
            ..Default::default()
        })
        .collect();

    if psp_enabled {
        rules.push(PolicyRule {
            api_groups: Some(vec!["policy".to_string()]),
            resources: Some(vec!["podsecuritypolicies".to_string()]),
            resource_names: Some(vec![names::PSP_NAME.to_string()]),
            verbs: vec!["use".to_string()],
            ..Default::default()
        });
    }
    rules
}
