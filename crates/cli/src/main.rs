use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::unbounded_channel;
use tracing::warn;
use url::Url;

use socialflow_capabilities::{RestCapability, RestConfig, TransformCapability};
use socialflow_engine::{CapabilityInvoker, WorkflowRunner, parse_workflow_document};
use socialflow_registry::{CapabilityCatalog, CapabilityRegistry, load_catalog_file};
use socialflow_types::{ParameterValidationResult, RunEvent, RunStatus, StepStatus};

#[derive(Parser)]
#[command(name = "socialflow", about = "Run capability workflows produced by the planner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a workflow document against a capability catalog
    Run {
        /// Path to the workflow document (JSON or YAML)
        #[arg(long, short = 'w')]
        workflow: PathBuf,
        /// Path to the capability catalog (JSON or YAML)
        #[arg(long, short = 'c', env = "SOCIALFLOW_CATALOG")]
        catalog: PathBuf,
        /// Base URL for HTTP-bound capabilities
        #[arg(long, env = "SOCIALFLOW_API_BASE")]
        api_base: Option<Url>,
        /// Bearer token for HTTP-bound capabilities
        #[arg(long, env = "SOCIALFLOW_API_TOKEN")]
        api_token: Option<String>,
        /// Print progress events as JSON lines instead of text
        #[arg(long)]
        json_events: bool,
    },
    /// List the capabilities and operations a catalog provides
    Catalog {
        /// Path to the capability catalog (JSON or YAML)
        #[arg(long, short = 'c', env = "SOCIALFLOW_CATALOG")]
        catalog: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            workflow,
            catalog,
            api_base,
            api_token,
            json_events,
        } => run_workflow(workflow, catalog, api_base, api_token, json_events).await,
        Command::Catalog { catalog } => print_catalog(catalog),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn run_workflow(
    workflow_path: PathBuf,
    catalog_path: PathBuf,
    api_base: Option<Url>,
    api_token: Option<String>,
    json_events: bool,
) -> Result<()> {
    let document = parse_workflow_document(&workflow_path)?;
    let validation = document.validation.unwrap_or_else(ParameterValidationResult::valid);
    let workflow = document.workflow;

    let catalog = load_catalog_file(&catalog_path)?;
    let registry = build_registry(catalog, api_base, api_token)?;
    let runner = WorkflowRunner::new(Arc::new(CapabilityInvoker::new(Arc::new(registry))));

    let (event_tx, mut event_rx) = unbounded_channel();
    let run = tokio::spawn(async move { runner.drive(&workflow, &validation, &event_tx).await });

    while let Some(event) = event_rx.recv().await {
        if json_events {
            println!("{}", serde_json::to_string(&event)?);
            continue;
        }
        match event {
            RunEvent::StepStarted { index, step_id, description, .. } => {
                println!("[{}] {}: {}", index + 1, step_id, description);
            }
            RunEvent::StepFinished {
                step_id,
                status,
                error,
                duration_ms,
                ..
            } => match status {
                StepStatus::Completed => println!("    {} completed in {}ms", step_id, duration_ms),
                StepStatus::Failed => {
                    let message = error.map(|error| error.message).unwrap_or_else(|| "unknown error".into());
                    println!("    {} failed: {}", step_id, message);
                }
                StepStatus::Skipped => println!("    {} skipped", step_id),
            },
            RunEvent::RunCompleted { result } => {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
    }

    let result = run.await.context("workflow task panicked")?;
    if result.status != RunStatus::Completed {
        bail!("workflow '{}' finished with status {:?}", result.workflow_id, result.status);
    }
    Ok(())
}

/// Instantiate a capability for every catalog descriptor: HTTP-bound
/// descriptors get a REST capability (which needs `--api-base`), the rest are
/// served by the in-process transformer when their operations match it.
fn build_registry(catalog: CapabilityCatalog, api_base: Option<Url>, api_token: Option<String>) -> Result<CapabilityRegistry> {
    let descriptors = catalog.capabilities.clone();
    let mut registry = CapabilityRegistry::new(catalog);

    for descriptor in descriptors {
        if descriptor.operations.iter().any(|operation| operation.http.is_some()) {
            let Some(base_url) = api_base.clone() else {
                bail!(
                    "capability '{}' is HTTP-bound; pass --api-base or set SOCIALFLOW_API_BASE",
                    descriptor.capability_id
                );
            };
            let mut config = RestConfig::new(base_url);
            config.bearer_token = api_token.clone();
            let capability_id = descriptor.capability_id.clone();
            let capability = RestCapability::from_descriptor(descriptor, config)
                .with_context(|| format!("failed to build REST capability '{capability_id}'"))?;
            registry.register(Arc::new(capability))?;
        } else if descriptor
            .operations
            .iter()
            .all(|operation| TransformCapability::supports(&operation.operation_id))
        {
            registry.register(Arc::new(TransformCapability::new(descriptor.capability_id.clone())))?;
        } else {
            warn!(
                capability = %descriptor.capability_id,
                "no implementation available for capability; steps targeting it will fail"
            );
        }
    }
    Ok(registry)
}

fn print_catalog(catalog_path: PathBuf) -> Result<()> {
    let catalog = load_catalog_file(&catalog_path)?;
    for capability in &catalog.capabilities {
        println!("{}: {}", capability.capability_id, capability.description);
        for operation in &capability.operations {
            let kind = match &operation.http {
                Some(binding) if binding.paginated => format!("{} {} (paginated)", binding.method, binding.path),
                Some(binding) => format!("{} {}", binding.method, binding.path),
                None => "in-process".to_string(),
            };
            println!("  {} -> {}  [{}]", operation.operation_id, operation.return_type, kind);
        }
    }
    Ok(())
}
