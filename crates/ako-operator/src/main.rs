//! AKO Kubernetes Operator
//!
//! Watches AKOConfig resources and deploys the Avi Kubernetes Operator
//! together with its configuration, RBAC objects and rule CRDs.

use ako_operator::controller;
use ako_operator::crd::AKOConfig;
use ako_operator::crd_installer;
use ako_operator::health::{run_health_server, HealthState};
use anyhow::{Context, Result};
use clap::Parser;
use kube::{Client, CustomResourceExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

/// AKO Kubernetes Operator
#[derive(Parser, Debug)]
#[command(name = "ako-operator")]
#[command(about = "Kubernetes operator deploying the Avi Kubernetes Operator from AKOConfig resources")]
#[command(version)]
struct Args {
    /// Prometheus metrics listen address
    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:8080")]
    metrics_addr: SocketAddr,

    /// Health probe listen address (/healthz, /readyz)
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8081")]
    health_addr: SocketAddr,

    /// Namespace to watch for AKOConfig resources (empty for cluster-wide)
    #[arg(long, env = "WATCH_NAMESPACE", default_value = "")]
    namespace: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: Level,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    log_json: bool,

    /// Print the AKOConfig CRD as YAML and exit
    #[arg(long)]
    print_crd: bool,

    /// With --print-crd, also print the rule CRDs installed for AKO
    #[arg(long, requires = "print_crd")]
    all_crds: bool,
}

impl Args {
    fn watch_namespace(&self) -> Option<String> {
        if self.namespace.is_empty() {
            None
        } else {
            Some(self.namespace.clone())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_crd {
        return print_crds(args.all_crds);
    }

    init_logging(&args);

    let namespace = args.watch_namespace();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        namespace = namespace.as_deref().unwrap_or("all"),
        "Starting AKO Kubernetes Operator"
    );

    install_metrics_exporter(args.metrics_addr)?;

    let health = Arc::new(HealthState::new());
    let health_addr = args.health_addr;
    let probe_state = health.clone();
    tokio::spawn(async move {
        if let Err(e) = run_health_server(health_addr, probe_state).await {
            error!(error = %e, "Health server failed");
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    health.mark_ready();

    controller::run_controller(client, namespace)
        .await
        .context("Controller failed")?;

    Ok(())
}

fn init_logging(args: &Args) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(false);

    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Install the Prometheus recorder; its HTTP listener runs on the runtime
fn install_metrics_exporter(addr: SocketAddr) -> Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Print CRD YAML for manual installation
fn print_crds(all: bool) -> Result<()> {
    println!("{}", serde_yaml::to_string(&AKOConfig::crd())?);

    if all {
        for crd in crd_installer::rule_crds() {
            println!("---");
            println!("{}", serde_yaml::to_string(&crd)?);
        }
    }
    Ok(())
}
