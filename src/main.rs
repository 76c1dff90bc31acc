use anyhow::Result;
use aws_config::BehaviorVersion;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use costctl::analyzer::AnalysisResult;
use costctl::aws::validate_credentials;
use costctl::config::{Config, TargetConfig};
use costctl::pricing::{PricingService, PricingSource};
use costctl::registry;
use costctl::report::{self, Report};

#[derive(Parser)]
#[command(name = "costctl")]
#[command(
    about = "Cloud cost-saving analyzer",
    long_about = "costctl inspects a cloud account's compute and storage resources and emits\ncost-saving recommendations.\n\nChecks:\n  - EC2 instances on superseded instance families\n  - Stopped instances still paying for EBS volumes\n  - Unattached EBS volumes\n  - RDS utilization, topology, backup, and engine-specific heuristics\n  - Reserved Instance coverage"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    output: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one analysis pass and emit the report
    Analyze {
        /// Analyze a single region, overriding configured targets
        #[arg(long)]
        region: Option<String>,
    },
    /// Initialize analyzer configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = ".costctl.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Suppress INFO by default, only show warnings and errors
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { region } => {
            analyze(&config, region, &cli.output).await?;
        }
        Commands::Init { output } => {
            costctl::config::init_config(&output)?;
        }
    }

    Ok(())
}

async fn analyze(config: &Config, region_override: Option<String>, output: &str) -> Result<()> {
    let targets: Vec<TargetConfig> = match region_override {
        Some(region) => vec![TargetConfig {
            provider: "aws".to_string(),
            region,
        }],
        None => config.targets.clone(),
    };

    // Fail fast on missing or expired credentials before any inventory calls
    if targets.iter().any(|t| t.provider == "aws") {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        validate_credentials(&sdk_config).await.map_err(|e| {
            anyhow::Error::from(e).context(
                "Please ensure valid AWS credentials are configured through the AWS CLI \
                 credentials file, environment variables, or an IAM role",
            )
        })?;
    }

    let pricing: Arc<dyn PricingSource> =
        Arc::new(PricingService::new(&config.pricing.data_dir)?);

    let mut results: Vec<AnalysisResult> = Vec::new();
    for target in &targets {
        let analyzers = match registry::build_analyzers(target, pricing.clone()).await {
            Ok(analyzers) => analyzers,
            Err(e) => {
                error!(
                    "Failed to create analyzers for provider {}: {}",
                    target.provider, e
                );
                continue;
            }
        };

        for analyzer in analyzers {
            info!("Executing analyzer: {}", analyzer.name());
            match analyzer.execute().await {
                Ok(result) => results.push(result),
                Err(e) => error!("Analyzer {} failed: {}", analyzer.name(), e),
            }
        }
    }

    if results.is_empty() {
        info!("No results were generated from any analyzers");
        return Ok(());
    }

    let report = Report::new(results);

    if output == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_summary(&report);
    }

    if !config.report.console_only {
        report::write_json(&report, &config.report.output_dir)?;
    }

    Ok(())
}
