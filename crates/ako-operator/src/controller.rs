//! AKOConfig Controller
//!
//! This module implements the Kubernetes controller pattern for managing
//! AKOConfig custom resources. It watches for changes and reconciles the
//! AKO ConfigMap, RBAC objects, rule CRDs and workload to match the desired
//! specification.

use crate::cleanup;
use crate::crd::{AKOConfig, AKOConfigStatus, ConfigState};
use crate::crd_installer;
use crate::error::{OperatorError, Result};
use crate::names;
use crate::reconcilers;
use crate::resources::ResourceBuilder;
use crate::session::SessionState;
use crate::store::{KubeStore, ObjectStore};
use chrono::Utc;
use dashmap::DashMap;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::Api;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::finalizer::{finalizer, Event as FinalizerEvent};
use kube::runtime::watcher::Config;
use kube::{Client, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

/// Finalizer name for cleanup operations
pub const FINALIZER_NAME: &str = "ako.vmware.com/cleanup";

/// Default requeue interval for successful reconciliations
const DEFAULT_REQUEUE_SECONDS: u64 = 300; // 5 minutes

/// Requeue interval for error cases (base for exponential backoff)
const ERROR_REQUEUE_SECONDS: u64 = 30;

/// Maximum requeue delay for error backoff
const MAX_ERROR_REQUEUE_SECONDS: u64 = 600;

/// Context passed to the controller
pub struct ControllerContext {
    /// Object store backed by the Kubernetes client
    pub store: KubeStore,
    /// Metrics recorder (optional)
    pub metrics: Option<ControllerMetrics>,
    /// Per-config error retry counts for exponential backoff
    pub error_counts: DashMap<String, u32>,
    /// Reconcile session of every AKOConfig, keyed by `namespace/name`
    pub sessions: DashMap<String, Arc<SessionState>>,
}

impl ControllerContext {
    pub fn new(client: Client) -> Self {
        Self {
            store: KubeStore::new(client),
            metrics: Some(ControllerMetrics::new()),
            error_counts: DashMap::new(),
            sessions: DashMap::new(),
        }
    }

    /// Session of one AKOConfig, created on first use
    pub fn session(&self, key: &str) -> Arc<SessionState> {
        self.sessions
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(SessionState::new()))
            .clone()
    }
}

/// Metrics for the controller
#[derive(Clone)]
pub struct ControllerMetrics {
    /// Counter for reconciliation attempts
    pub reconciliations: metrics::Counter,
    /// Counter for reconciliation errors
    pub errors: metrics::Counter,
    /// Histogram for reconciliation duration
    pub duration: metrics::Histogram,
}

impl ControllerMetrics {
    /// Create new controller metrics
    pub fn new() -> Self {
        Self {
            reconciliations: metrics::counter!("ako_operator_reconciliations_total"),
            errors: metrics::counter!("ako_operator_reconciliation_errors_total"),
            duration: metrics::histogram!("ako_operator_reconciliation_duration_seconds"),
        }
    }
}

impl Default for ControllerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn session_key(config: &AKOConfig) -> String {
    format!(
        "{}/{}",
        config.namespace().unwrap_or_else(|| "default".to_string()),
        config.name_any()
    )
}

/// Start the AKOConfig controller
pub async fn run_controller(client: Client, namespace: Option<String>) -> Result<()> {
    let configs: Api<AKOConfig> = match &namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };

    let ctx = Arc::new(ControllerContext::new(client.clone()));

    info!(
        namespace = namespace.as_deref().unwrap_or("all"),
        "Starting AKOConfig controller"
    );

    // Managed objects always live in avi-system
    let managed = Config::default().labels(names::MANAGED_BY_SELECTOR);
    let configmaps = Api::<ConfigMap>::namespaced(client.clone(), names::AVI_SYSTEM_NAMESPACE);
    let statefulsets = Api::<StatefulSet>::namespaced(client.clone(), names::AVI_SYSTEM_NAMESPACE);

    Controller::new(configs, Config::default())
        .owns(configmaps, managed.clone())
        .owns(statefulsets, managed)
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, action)) => {
                    debug!(
                        name = obj.name,
                        namespace = obj.namespace,
                        ?action,
                        "Reconciliation completed"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Reconciliation failed");
                }
            }
        })
        .await;

    Ok(())
}

/// Main reconciliation function
#[instrument(skip(config, ctx), fields(name = %config.name_any(), namespace = config.namespace()))]
async fn reconcile(config: Arc<AKOConfig>, ctx: Arc<ControllerContext>) -> Result<Action> {
    let start = std::time::Instant::now();

    if let Some(ref metrics) = ctx.metrics {
        metrics.reconciliations.increment(1);
    }

    let namespace = config.namespace().unwrap_or_else(|| "default".to_string());
    let key = session_key(&config);
    let session = ctx.session(&key);
    let configs: Api<AKOConfig> = Api::namespaced(ctx.store.client(), &namespace);

    let result = finalizer(&configs, FINALIZER_NAME, config, |event| async {
        match event {
            FinalizerEvent::Apply(config) => apply_config(&config, &ctx.store, &session).await,
            FinalizerEvent::Cleanup(config) => {
                let action = cleanup_config(&config, &ctx.store, &session).await?;
                ctx.sessions.remove(&key);
                Ok(action)
            }
        }
    })
    .await;

    if let Some(ref metrics) = ctx.metrics {
        metrics.duration.record(start.elapsed().as_secs_f64());
    }

    // Reset error backoff counter on success
    if result.is_ok() {
        ctx.error_counts.remove(&key);
    }

    result.map_err(|e| {
        if let Some(ref metrics) = ctx.metrics {
            metrics.errors.increment(1);
        }
        OperatorError::ReconcileFailed(e.to_string())
    })
}

/// Reconcile every managed object of one AKOConfig and record the outcome
/// in its status.
#[instrument(skip(config, store, session), fields(name = %config.name_any()))]
pub async fn apply_config<S: ObjectStore>(
    config: &AKOConfig,
    store: &S,
    session: &SessionState,
) -> Result<Action> {
    info!("Reconciling AKOConfig");

    let result = reconcile_objects(config, store, session).await;

    let status = match &result {
        Ok(()) => build_status(config, ConfigState::Ready, None),
        Err(e) => {
            warn!(error = %e, "AKOConfig reconcile failed");
            build_status(config, ConfigState::Error, Some(e.to_string()))
        }
    };
    update_status(store, config, status).await?;

    result?;
    Ok(Action::requeue(Duration::from_secs(DEFAULT_REQUEUE_SECONDS)))
}

async fn reconcile_objects<S: ObjectStore>(
    config: &AKOConfig,
    store: &S,
    session: &SessionState,
) -> Result<()> {
    validate_config(config)?;

    if !store
        .secret_exists(names::AVI_SYSTEM_NAMESPACE, names::AVI_SECRET_NAME)
        .await?
    {
        return Err(OperatorError::MissingSecret {
            namespace: names::AVI_SYSTEM_NAMESPACE.to_string(),
            name: names::AVI_SECRET_NAME.to_string(),
        });
    }

    update_status(
        store,
        config,
        build_status(config, ConfigState::Processing, None),
    )
    .await?;

    let spec = &config.spec;
    let builder = ResourceBuilder::new(config)?;

    // ConfigMap before StatefulSet: a cold change must be seen by the
    // StatefulSet reconciler in the same pass
    reconcilers::reconcile_configmap(store, session, &builder).await?;
    reconcilers::reconcile_service_account(store, session, &builder).await?;
    reconcilers::reconcile_cluster_role(store, session, &builder).await?;
    reconcilers::reconcile_cluster_role_binding(store, session, &builder).await?;
    reconcilers::reconcile_pod_security_policy(store, session, &builder, spec.psp_enabled())
        .await?;
    crd_installer::ensure_crds(store, &session.registry).await?;
    reconcilers::reconcile_gateway_class(store, session, &builder, spec.gateway_api_enabled())
        .await?;
    reconcilers::reconcile_statefulset(store, session, &builder).await?;

    Ok(())
}

/// Validate the spec before anything is written
fn validate_config(config: &AKOConfig) -> Result<()> {
    if let Err(errors) = config.spec.validate() {
        let error_messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter()
                    .map(move |e| format!("{}: {:?}", field, e.message))
            })
            .collect();
        let error_msg = if error_messages.is_empty() {
            errors.to_string()
        } else {
            error_messages.join("; ")
        };
        warn!(errors = %error_msg, "AKOConfig spec validation failed");
        return Err(OperatorError::InvalidConfig(error_msg));
    }
    Ok(())
}

/// Remove every managed object of a deleted AKOConfig
#[instrument(skip(config, store, session), fields(name = %config.name_any()))]
pub async fn cleanup_config<S: ObjectStore>(
    config: &AKOConfig,
    store: &S,
    session: &SessionState,
) -> Result<Action> {
    info!("Cleaning up AKOConfig resources");
    cleanup::cleanup(store, session).await?;
    info!("Cleanup complete");
    Ok(Action::await_change())
}

fn build_status(
    config: &AKOConfig,
    state: ConfigState,
    message: Option<String>,
) -> AKOConfigStatus {
    AKOConfigStatus {
        state,
        message,
        observed_generation: config.metadata.generation,
        last_updated: Some(Utc::now().to_rfc3339()),
    }
}

/// Patch the status subresource unless only the timestamp would change.
///
/// Every status write is a watch event on the AKOConfig, so unchanged
/// states are not written again.
async fn update_status<S: ObjectStore>(
    store: &S,
    config: &AKOConfig,
    status: AKOConfigStatus,
) -> Result<()> {
    if let Some(current) = config.status.as_ref() {
        let unchanged = current.state == status.state
            && current.message == status.message
            && current.observed_generation == status.observed_generation;
        // Processing only marks a new generation
        let repeat_processing = status.state == ConfigState::Processing
            && current.observed_generation == status.observed_generation;
        if unchanged || repeat_processing {
            return Ok(());
        }
    }

    debug!(state = ?status.state, "Updating AKOConfig status");
    store.patch_status(config, &status).await
}

/// Backoff after `retries` consecutive failures: 30s, 60s, ... capped at 600s
fn backoff_delay(base: Duration, retries: u32) -> Duration {
    let backoff = base * 2u32.saturating_pow(retries.saturating_sub(1).min(5));
    backoff.min(Duration::from_secs(MAX_ERROR_REQUEUE_SECONDS))
}

/// Error policy for the controller with exponential backoff
fn error_policy(
    config: Arc<AKOConfig>,
    error: &OperatorError,
    ctx: Arc<ControllerContext>,
) -> Action {
    let key = session_key(&config);
    let retries = {
        let mut entry = ctx.error_counts.entry(key.clone()).or_insert(0);
        *entry += 1;
        *entry
    };

    let base = error
        .requeue_delay()
        .unwrap_or(Duration::from_secs(ERROR_REQUEUE_SECONDS));
    let delay = backoff_delay(base, retries);

    warn!(
        error = %error,
        retry = retries,
        delay_secs = delay.as_secs(),
        "Reconciliation error for '{}', will retry",
        key
    );

    Action::requeue(delay)
}
