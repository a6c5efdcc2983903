//! Ceph Orphan Audit
//!
//! Command-line entry point. `audit` (the default) inspects the cluster and
//! writes the report artifacts; `render` regenerates the text views from a
//! saved `report.json`.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ceph_orphan_audit::access::{check_tools, RequiredTool};
use ceph_orphan_audit::report::rerender;
use ceph_orphan_audit::{
    write_artifacts, AuditConfig, Auditor, CephToolbox, Error, KubeInventory, MetricsAccess,
    Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Ceph Orphan Audit - find storage no Kubernetes object claims
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// YAML configuration file
    #[arg(long, env = "AUDIT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "AUDIT_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "AUDIT_LOG_JSON", global = true)]
    log_json: bool,

    #[command(flatten)]
    audit: AuditArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Audit the cluster and write all artifacts (default)
    Audit,
    /// Regenerate text views from an existing report.json
    Render {
        /// Path to report.json
        #[arg(long)]
        report: PathBuf,
        /// Directory for the regenerated views (defaults to the report's directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct AuditArgs {
    /// Artifact directory (defaults to a timestamped directory)
    #[arg(long, env = "AUDIT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Storage operator namespace
    #[arg(long, env = "AUDIT_STORAGE_NAMESPACE")]
    namespace: Option<String>,

    /// Ceph toolbox deployment
    #[arg(long, env = "AUDIT_TOOLBOX_DEPLOYMENT")]
    toolbox: Option<String>,

    /// kubectl (or oc) binary
    #[arg(long, env = "AUDIT_KUBECTL")]
    kubectl: Option<String>,

    /// Metrics query URL; skips discovery
    #[arg(long, env = "AUDIT_METRICS_URL")]
    metrics_url: Option<String>,

    /// Metrics bearer token; skips token discovery
    #[arg(long, env = "AUDIT_METRICS_TOKEN", hide_env_values = true)]
    metrics_token: Option<String>,

    /// Accept self-signed metrics certificates
    #[arg(long, env = "AUDIT_INSECURE_SKIP_TLS_VERIFY")]
    insecure_skip_tls_verify: bool,
}

impl AuditArgs {
    /// Command-line values win over the config file
    fn apply(&self, config: &mut AuditConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(ns) = &self.namespace {
            config.storage.namespace = ns.clone();
        }
        if let Some(toolbox) = &self.toolbox {
            config.storage.toolbox_deployment = toolbox.clone();
        }
        if let Some(kubectl) = &self.kubectl {
            config.storage.kubectl = kubectl.clone();
        }
        if let Some(url) = &self.metrics_url {
            config.metrics.url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(token) = &self.metrics_token {
            config.metrics.token = Some(token.clone());
        }
        if self.insecure_skip_tls_verify {
            config.metrics.insecure_skip_tls_verify = true;
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args);

    let outcome = match &args.command {
        Some(Command::Render { report, output_dir }) => render(report, output_dir.clone()),
        Some(Command::Audit) | None => audit(&args).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprint!("{}", e.diagnostic());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn audit(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AuditConfig::from_file(path)?,
        None => AuditConfig::default(),
    };
    args.audit.apply(&mut config);

    info!("Starting Ceph orphan audit");
    info!("  Version: {}", ceph_orphan_audit::VERSION);
    info!("  Storage namespace: {}", config.storage.namespace);
    info!("  Toolbox: deploy/{}", config.storage.toolbox_deployment);

    check_tools(&[RequiredTool::new(
        config.storage.kubectl.clone(),
        &["version", "--client"],
    )])
    .await?;

    let kube_config = kube::Config::infer()
        .await
        .map_err(|e| Error::ControlPlaneAuth {
            reason: e.to_string(),
            verify: format!("{} auth whoami", config.storage.kubectl),
        })?;
    let control_plane = kube_config.cluster_url.to_string();
    let client = kube::Client::try_from(kube_config).map_err(|e| Error::ControlPlaneAuth {
        reason: e.to_string(),
        verify: format!("{} get pv --request-timeout=10s", config.storage.kubectl),
    })?;
    info!("  Control plane: {}", control_plane);

    let metrics = MetricsAccess::new(config.metrics.clone(), Some(client.clone()))?;
    let admin = CephToolbox::new(config.storage.clone());
    let inventory = KubeInventory::new(client, config.naming.bucket_secret_label.clone());

    let now = Utc::now();
    let output_dir = config.resolve_output_dir(now);

    let auditor = Auditor::new(
        config,
        Arc::new(metrics),
        Arc::new(admin),
        Arc::new(inventory),
    )?
    .with_control_plane(control_plane);

    let report = auditor.run(now, &output_dir.display().to_string()).await?;
    let written = write_artifacts(&report, &output_dir)?;

    print!("{}", ceph_orphan_audit::report::render_summary(&report));
    println!();
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn render(report: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    let dir = output_dir
        .or_else(|| {
            report
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from("."));

    for path in rerender(report, &dir)? {
        println!("{}", path.display());
    }
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "kube=info", "reqwest=warn", "rustls=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // stdout carries the summary, so logs go to stderr
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
