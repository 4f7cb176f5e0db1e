//! divval - sample diversity validation CLI
//!
//! Checks whether quality metrics and benchmark pass rates are consistent
//! across platforms, chemistries and flow cells.

use clap::{Parser, Subcommand, ValueEnum};
use sample_diversity::data::{
    CatalogFile, CatalogMetricsOnly, MetricsDir, MetricsFile, MetricsSource, ValidationResult,
};
use sample_diversity::error::Result;
use sample_diversity::test::TestMethod;
use sample_diversity::validate::{DiversityValidator, ValidationConfig};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// CLI-friendly test selection
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTestMethod {
    /// ANOVA when every group looks normal, Kruskal-Wallis otherwise
    Auto,
    /// Always one-way ANOVA
    Anova,
    /// Always Kruskal-Wallis
    KruskalWallis,
}

impl From<CliTestMethod> for TestMethod {
    fn from(method: CliTestMethod) -> Self {
        match method {
            CliTestMethod::Auto => TestMethod::Auto,
            CliTestMethod::Anova => TestMethod::Anova,
            CliTestMethod::KruskalWallis => TestMethod::KruskalWallis,
        }
    }
}

/// Sample diversity validation
#[derive(Parser)]
#[command(name = "divval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate metric consistency across sample categories
    Run {
        /// Sample catalog (.json, or TSV with sample id in the first column)
        #[arg(short = 'c', long)]
        catalog: PathBuf,

        /// Directory of per-sample metric JSON files
        #[arg(long, conflicts_with = "metrics")]
        metrics_dir: Option<PathBuf>,

        /// Metrics table (.json or TSV)
        #[arg(short, long)]
        metrics: Option<PathBuf>,

        /// Validation configuration YAML
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only analyze samples with this chemistry
        #[arg(long)]
        chemistry: Option<String>,

        /// Categories to analyze (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Minimum samples per group
        #[arg(long)]
        min_samples: Option<usize>,

        /// Confidence level for significance
        #[arg(long)]
        confidence_level: Option<f64>,

        /// Group comparison test
        #[arg(long, value_enum)]
        test_method: Option<CliTestMethod>,

        /// Output path for the JSON result (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the default configuration as YAML
    ExampleConfig {
        /// Output path for the YAML file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            catalog,
            metrics_dir,
            metrics,
            config,
            chemistry,
            categories,
            min_samples,
            confidence_level,
            test_method,
            output,
        } => {
            let overrides = Overrides {
                chemistry,
                categories,
                min_samples,
                confidence_level,
                test_method: test_method.map(TestMethod::from),
            };
            cmd_run(
                &catalog,
                metrics_dir.as_deref(),
                metrics.as_deref(),
                config.as_deref(),
                overrides,
                output.as_deref(),
            )
        }
        Commands::ExampleConfig { output } => cmd_example_config(&output),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Filter used when `RUST_LOG` is unset or `--verbose` is given.
fn default_log_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn init_logging(verbose: bool) {
    let level = default_log_level(verbose);
    let filter = if verbose {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Command-line values that take precedence over the configuration file.
struct Overrides {
    chemistry: Option<String>,
    categories: Vec<String>,
    min_samples: Option<usize>,
    confidence_level: Option<f64>,
    test_method: Option<TestMethod>,
}

impl Overrides {
    fn apply(self, config: &mut ValidationConfig) {
        if self.chemistry.is_some() {
            config.chemistry = self.chemistry;
        }
        if !self.categories.is_empty() {
            config.categories = self.categories;
        }
        if let Some(n) = self.min_samples {
            config.min_samples = n;
        }
        if let Some(c) = self.confidence_level {
            config.confidence_level = c;
        }
        if let Some(m) = self.test_method {
            config.test_method = m;
        }
    }
}

/// Run a validation; returns whether the run passed.
fn cmd_run(
    catalog_path: &Path,
    metrics_dir: Option<&Path>,
    metrics_path: Option<&Path>,
    config_path: Option<&Path>,
    overrides: Overrides,
    output_path: Option<&Path>,
) -> Result<bool> {
    let mut config = match config_path {
        Some(path) => {
            eprintln!("Loading configuration from {:?}...", path);
            ValidationConfig::from_yaml_file(path)?
        }
        None => ValidationConfig::default(),
    };
    overrides.apply(&mut config);

    let metrics_source: Box<dyn MetricsSource> = match (metrics_dir, metrics_path) {
        (Some(dir), _) => Box::new(MetricsDir::new(dir)),
        (None, Some(path)) => Box::new(MetricsFile::new(path)),
        (None, None) => Box::new(CatalogMetricsOnly),
    };

    eprintln!("Running diversity validation on {:?}...", catalog_path);
    let validator = DiversityValidator::new(config);
    let result = validator
        .run_sources(&CatalogFile::new(catalog_path), metrics_source.as_ref())
        .stamped();

    write_result(&result, output_path)?;
    eprintln!();
    eprint!("{}", result);

    Ok(result.ran())
}

fn write_result(result: &ValidationResult, output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            result.to_json_file(path)?;
            eprintln!("Wrote results to {:?}", path);
        }
        None => println!("{}", result.to_json()?),
    }
    Ok(())
}

/// Write the default configuration; always succeeds as a run.
fn cmd_example_config(output_path: &Path) -> Result<bool> {
    let yaml = ValidationConfig::default().to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(true)
}
