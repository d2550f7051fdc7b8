//! CLI entrypoint for expert-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use council_application::ports::progress::{NoProgress, ProgressNotifier};
use council_application::ports::usage_log::{NoUsageLog, UsageLog};
use council_application::{ConsultExpertsUseCase, ConsultationConfig, LlmGateway};
use council_domain::{ConsultationRequest, ConsultationResult, ConsultationStatus, RoleCatalog};
use council_infrastructure::{ConfigLoader, FileConfig, JsonlUsageLog, LocalCodeBackend};
use council_presentation::{Cli, ConsoleFormatter, OutputFormat, ProgressReporter, resolve_context};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };

    let log_file = cli.log_file.as_deref().or(config.logging.log_file.as_deref());
    let _log_guard = init_logging(cli.verbose, log_file)?;

    if cli.show_config {
        show_config(&cli, &config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let issues = config.validate();
    if !issues.is_empty() {
        let list: Vec<String> = issues.iter().map(|i| format!("  - {}", i)).collect();
        bail!("invalid configuration:\n{}", list.join("\n"));
    }
    let roles = config.to_role_catalog()?;
    let consultation = config.to_consultation_config()?;

    if cli.list_roles {
        list_roles(&roles);
        return Ok(ExitCode::SUCCESS);
    }

    let context = cli
        .context
        .as_deref()
        .map(resolve_context)
        .transpose()
        .context("failed to read --context file")?;
    let Some(request) = cli.to_request(context) else {
        bail!("a consultation scope is required (see --help)");
    };

    let backend = Arc::new(lookup_backend(&config)?);
    let usage = usage_log(&config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling consultation");
            on_interrupt.cancel();
        }
    });

    let progress: Arc<dyn ProgressNotifier> = if cli.quiet {
        Arc::new(NoProgress)
    } else {
        Arc::new(ProgressReporter::new())
    };

    info!("Starting consultation: {}", request.scope());
    let result = consult_with_provider(
        &config,
        backend,
        roles,
        consultation,
        usage,
        request,
        progress,
        cancel,
    )
    .await?;

    let output = match cli.output {
        OutputFormat::Full => ConsoleFormatter::format(&result),
        OutputFormat::Summary => ConsoleFormatter::format_summary(&result),
        OutputFormat::Json => ConsoleFormatter::format_json(&result),
    };
    println!("{}", output);

    Ok(exit_code(result.status))
}

fn exit_code(status: ConsultationStatus) -> ExitCode {
    match status {
        ConsultationStatus::Complete => ExitCode::SUCCESS,
        ConsultationStatus::Partial => ExitCode::from(2),
        ConsultationStatus::Failed => ExitCode::from(1),
    }
}

/// Console diagnostics from `-v` (or `RUST_LOG`), plus an optional log file
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(console).init();
        return Ok(None);
    };

    let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("--log-file {} has no file name", path.display()))?;
    std::fs::create_dir_all(directory)
        .with_context(|| format!("creating {}", directory.display()))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter());
    tracing_subscriber::registry().with(console).with(file).init();
    Ok(Some(guard))
}

fn show_config(cli: &Cli, config: &FileConfig) -> Result<()> {
    println!("Configuration sources (highest priority first):");
    println!("  Environment: COUNCIL_* variables");
    if cli.no_config {
        println!("  (configuration files disabled by --no-config)");
    } else {
        for source in ConfigLoader::sources(cli.config.as_deref()) {
            let path = source
                .path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string());
            let state = if source.found { "" } else { " (not found)" };
            println!("  {}: {}{}", source.label, path, state);
        }
    }
    println!();
    println!("Merged configuration:");
    println!("{}", config.to_toml().context("rendering configuration")?);
    Ok(())
}

fn list_roles(roles: &RoleCatalog) {
    println!("Available expert roles:");
    for role in roles.roles() {
        let model = match &role.analysis_model {
            Some(analysis) => format!("{} -> {}", role.default_model, analysis),
            None => role.default_model.to_string(),
        };
        println!(
            "  {:<14} {:<22} {:<36} tools: {}",
            role.key(),
            role.display_name,
            model,
            role.allowed_tools.join(", ")
        );
    }
}

fn lookup_backend(config: &FileConfig) -> Result<LocalCodeBackend> {
    let root = config.tools.project_root();
    let mut backend = LocalCodeBackend::new(&root)
        .with_context(|| format!("project root {}", root.display()))?;

    if let Some(memory) = &config.tools.memory_file {
        let memory = if memory.is_relative() {
            backend.root().join(memory)
        } else {
            memory.clone()
        };
        backend = backend.with_memory_file(memory);
    }

    #[cfg(feature = "web-tools")]
    if config.tools.web_enabled {
        let timeout = std::time::Duration::from_secs(config.limits.tool_timeout_secs);
        backend = backend.with_web_search(council_infrastructure::DuckDuckGoSearch::new(timeout)?);
    }

    Ok(backend)
}

fn usage_log(config: &FileConfig) -> Arc<dyn UsageLog> {
    match config.logging.usage_log.as_deref().and_then(JsonlUsageLog::open) {
        Some(log) => {
            info!("Recording usage to {}", log.path().display());
            Arc::new(log)
        }
        None => Arc::new(NoUsageLog),
    }
}

#[cfg(feature = "http-provider")]
#[allow(clippy::too_many_arguments)]
async fn consult_with_provider(
    config: &FileConfig,
    backend: Arc<LocalCodeBackend>,
    roles: RoleCatalog,
    consultation: ConsultationConfig,
    usage: Arc<dyn UsageLog>,
    request: ConsultationRequest,
    progress: Arc<dyn ProgressNotifier>,
    cancel: CancellationToken,
) -> Result<ConsultationResult> {
    let provider = &config.provider;
    let gateway = council_infrastructure::OpenAiCompatGateway::from_env(
        &provider.base_url,
        &provider.api_key_env,
        provider.max_tokens,
    )?;
    info!("Model endpoint: {}", gateway.endpoint());
    let gateway = Arc::new(gateway);
    Ok(consult(gateway, backend, roles, consultation, usage, request, progress, cancel).await)
}

#[cfg(not(feature = "http-provider"))]
#[allow(clippy::too_many_arguments)]
async fn consult_with_provider(
    _config: &FileConfig,
    _backend: Arc<LocalCodeBackend>,
    _roles: RoleCatalog,
    _consultation: ConsultationConfig,
    _usage: Arc<dyn UsageLog>,
    _request: ConsultationRequest,
    _progress: Arc<dyn ProgressNotifier>,
    _cancel: CancellationToken,
) -> Result<ConsultationResult> {
    bail!("this build has no model provider; rebuild with the `http-provider` feature")
}

#[cfg_attr(not(feature = "http-provider"), allow(dead_code))]
#[allow(clippy::too_many_arguments)]
async fn consult<G: LlmGateway + 'static>(
    gateway: Arc<G>,
    backend: Arc<LocalCodeBackend>,
    roles: RoleCatalog,
    consultation: ConsultationConfig,
    usage: Arc<dyn UsageLog>,
    request: ConsultationRequest,
    progress: Arc<dyn ProgressNotifier>,
    cancel: CancellationToken,
) -> ConsultationResult {
    ConsultExpertsUseCase::new(gateway, backend, roles, consultation)
        .with_usage_log(usage)
        .consult_with_progress(request, progress, cancel)
        .await
}
