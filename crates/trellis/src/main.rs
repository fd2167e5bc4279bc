//! trellis: load, validate and inspect multi-file OpenAPI descriptions.

mod report;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context as _};
use clap::{Args, Parser, Subcommand, ValueEnum};

use trellis_loader::{root_url, Loader, LoaderConfig, SchemeFetcher};
use trellis_spec::model::Document;
use trellis_spec::{downcast, Graph, Object, SpecVersion};
use trellis_telemetry::{LogFormat, TelemetryConfig};
use trellis_validator::{GraphRule, ValidatorFactory};

use report::{Inventory, ValidationResult};

#[derive(Parser, Debug)]
#[command(
    name = "trellis",
    about = "Load, validate and inspect multi-file OpenAPI descriptions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    load: LoadOptions,

    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, global = true, env = "TRELLIS_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log output format (json or pretty).
    #[arg(long, global = true, env = "TRELLIS_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

#[derive(Args, Debug)]
struct LoadOptions {
    /// OpenAPI version for resources that declare none and are not referenced
    /// from a versioned document (e.g. 3.1).
    #[arg(long, global = true, env = "TRELLIS_DEFAULT_VERSION")]
    default_version: Option<SpecVersion>,

    /// Schema dialect for resources that declare and inherit none.
    #[arg(long, global = true, env = "TRELLIS_DEFAULT_DIALECT")]
    default_dialect: Option<String>,

    /// Additional schema dialect URIs to accept.
    #[arg(long = "allow-dialect", global = true, value_name = "URI")]
    allow_dialects: Vec<String>,

    /// Maximum number of resources fetched at once.
    #[arg(long, global = true, env = "TRELLIS_MAX_CONCURRENT_FETCHES", default_value = "8")]
    max_concurrent_fetches: usize,

    /// HTTP request timeout in seconds.
    #[arg(long, global = true, env = "TRELLIS_HTTP_TIMEOUT", default_value = "30")]
    http_timeout: u64,

    /// Skip the per-object structural rules.
    #[arg(long, global = true)]
    skip_structural: bool,

    /// Skip the path template and operationId rules.
    #[arg(long, global = true)]
    skip_path_rules: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load description(s) with every referenced resource and validate them.
    Validate {
        /// Root document(s): file paths or absolute URIs.
        #[arg(short, long, required = true, num_args = 1..)]
        spec: Vec<String>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List the resources and references of a loaded description.
    Inspect {
        /// Root document: file path or absolute URI.
        spec: String,

        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Print the root document as parsed, references kept as references.
    Dump {
        /// Root document: file path or absolute URI.
        spec: String,

        /// Output encoding.
        #[arg(long, value_enum, default_value_t = Encoding::Yaml)]
        to: Encoding,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Encoding {
    Json,
    Yaml,
}

fn build_loader(options: &LoadOptions) -> anyhow::Result<Loader> {
    let fetch = SchemeFetcher::standard(Duration::from_secs(options.http_timeout))
        .context("failed to set up fetchers")?;

    let mut factory = ValidatorFactory::new().with_structural_rules(!options.skip_structural);
    for dialect in &options.allow_dialects {
        factory = factory.with_dialect(dialect.clone());
    }
    if options.skip_path_rules {
        for rule in [
            GraphRule::PathTemplate,
            GraphRule::DuplicateOperationId,
            GraphRule::AmbiguousPath,
            GraphRule::UndeclaredPathParameter,
            GraphRule::OptionalPathParameter,
        ] {
            factory = factory.without_rule(rule);
        }
    }
    let validator = factory.build().context("failed to compile rule sets")?;
    tracing::debug!(
        structural = !options.skip_structural,
        path_rules = !options.skip_path_rules,
        dialects = options.allow_dialects.len(),
        "validator built"
    );

    let mut config = LoaderConfig::new().with_max_concurrent_fetches(options.max_concurrent_fetches);
    if let Some(version) = options.default_version {
        config = config.with_default_version(version);
    }
    if let Some(dialect) = &options.default_dialect {
        config = config.with_default_dialect(dialect.clone());
    }

    Ok(Loader::new(Arc::new(fetch), Arc::new(validator)).with_config(config))
}

async fn load(loader: &Loader, spec: &str) -> anyhow::Result<Arc<Graph>> {
    let root = root_url(spec)?;
    Ok(loader.load(&root).await?)
}

/// Run the validate command.
async fn run_validate(loader: &Loader, specs: &[String], format: Format) -> ExitCode {
    let mut results = Vec::new();

    for spec in specs {
        let result = match root_url(spec) {
            Err(e) => ValidationResult {
                file: spec.clone(),
                valid: false,
                resources: 0,
                errors: vec![report::Issue {
                    code: "E1305".to_string(),
                    message: e.to_string(),
                    location: None,
                }],
            },
            Ok(root) => match loader.load(&root).await {
                Ok(graph) => ValidationResult {
                    file: spec.clone(),
                    valid: true,
                    resources: graph.len(),
                    errors: Vec::new(),
                },
                Err(e) => ValidationResult {
                    file: spec.clone(),
                    valid: false,
                    resources: 0,
                    errors: report::issues(&e),
                },
            },
        };
        results.push(result);
    }

    let invalid = results.iter().filter(|r| !r.valid).count();

    if format == Format::Json {
        let output = serde_json::json!({
            "results": results,
            "summary": {
                "total": results.len(),
                "valid": results.len() - invalid,
                "invalid": invalid,
            }
        });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
        }
    } else {
        for result in &results {
            if result.valid {
                eprintln!("✓ {} is valid ({} resource(s))", result.file, result.resources);
            } else {
                eprintln!("✗ {} has {} error(s)", result.file, result.errors.len());
            }

            for err in &result.errors {
                if let Some(loc) = &err.location {
                    eprintln!("  {} [{}]: {}", err.code, loc, err.message);
                } else {
                    eprintln!("  {}: {}", err.code, err.message);
                }
            }
        }

        eprintln!();
        eprintln!(
            "validated {} description(s): {} valid, {} invalid",
            results.len(),
            results.len() - invalid,
            invalid
        );
    }

    if invalid > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Run the inspect command.
async fn run_inspect(loader: &Loader, spec: &str, format: Format) -> anyhow::Result<()> {
    let graph = load(loader, spec).await?;
    let inventory = Inventory::of(&graph);
    match format {
        Format::Text => inventory.print_text(),
        Format::Json => println!("{}", serde_json::to_string_pretty(&inventory)?),
    }
    Ok(())
}

/// Run the dump command.
async fn run_dump(loader: &Loader, spec: &str, to: Encoding) -> anyhow::Result<()> {
    let graph = load(loader, spec).await?;
    let document = graph
        .root_node()
        .and_then(downcast::<Document>)
        .ok_or_else(|| anyhow!("{} is not an OpenAPI document", spec))?;
    let value = document.encode()?;
    match to {
        Encoding::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        Encoding::Yaml => print!("{}", serde_yaml::to_string(&value)?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_format = match LogFormat::parse(&cli.log_format) {
        Some(format) => format,
        None => {
            eprintln!("error: unknown log format '{}' (json or pretty)", cli.log_format);
            return ExitCode::from(2);
        }
    };
    let telemetry = TelemetryConfig::new()
        .with_log_level(cli.log_level.as_str())
        .with_log_format(log_format);
    if let Err(e) = trellis_telemetry::init(&telemetry) {
        eprintln!("warning: {}", e);
    }
    trellis_telemetry::log_startup!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %cli.log_level,
        "trellis starting"
    );

    let loader = match build_loader(&cli.load) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    let outcome = match cli.command {
        Commands::Validate { spec, format } => return run_validate(&loader, &spec, format).await,
        Commands::Inspect { spec, format } => run_inspect(&loader, &spec, format).await,
        Commands::Dump { spec, to } => run_dump(&loader, &spec, to).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
