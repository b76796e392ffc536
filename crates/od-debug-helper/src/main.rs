use std::fs;
use std::io::{self, Read, Write};

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use eyre::{Result, eyre};
use od_debug_core::UrlMetricGroupCollection;
use od_debug_helper::extension::extension_module;
use od_debug_helper::{HelperConfig, TagVisitorRegistry, optimize, register_debug_helper};
use tracing::{debug, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "od-debug",
    version,
    about = "Annotate pages with Optimization Detective LCP and INP debug markers"
)]
struct Cli {
    /// Config file (defaults to `.config/od-debug.yaml` found walking up from the current directory)
    #[arg(long, global = true, env = "OD_DEBUG_CONFIG")]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite an HTML document with debug markers
    Annotate {
        /// URL Metric group collection as JSON
        #[arg(long)]
        metrics: Utf8PathBuf,

        /// Input document (stdin when omitted)
        #[arg(long)]
        input: Option<Utf8PathBuf>,

        /// Output document (stdout when omitted)
        #[arg(long)]
        output: Option<Utf8PathBuf>,
    },
    /// Print the `inpData` URL Metric schema extension
    Schema,
    /// Print the extension module to serve at `extension_module_url`
    Extension,
}

fn init_tracing() {
    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(io::stderr)
        .compact();
    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
}

fn load_config(explicit: Option<&Utf8PathBuf>) -> Result<HelperConfig> {
    if let Some(path) = explicit {
        return HelperConfig::load(path);
    }
    match HelperConfig::discover()? {
        Some((path, config)) => {
            debug!(%path, "loaded config");
            Ok(config)
        }
        None => Ok(HelperConfig::default()),
    }
}

fn annotate(
    config: &HelperConfig,
    metrics: &Utf8PathBuf,
    input: Option<&Utf8PathBuf>,
    output: Option<&Utf8PathBuf>,
) -> Result<()> {
    let metrics_json = fs::read_to_string(metrics)
        .map_err(|e| eyre!("Failed to read {}: {}", metrics, e))?;
    let collection: UrlMetricGroupCollection = serde_json::from_str(&metrics_json)
        .map_err(|e| eyre!("Failed to parse {}: {}", metrics, e))?;

    let html = match input {
        Some(path) => {
            fs::read_to_string(path).map_err(|e| eyre!("Failed to read {}: {}", path, e))?
        }
        None => {
            let mut html = String::new();
            io::stdin().read_to_string(&mut html)?;
            html
        }
    };

    let mut registry = TagVisitorRegistry::new();
    match register_debug_helper(&mut registry, config) {
        Some(registration) => debug!(
            use_attribution_build = registration.use_attribution_build,
            extension_module_urls = ?registration.extension_module_urls,
            "registered debug helper"
        ),
        None => info!("debug helper disabled, passing document through"),
    }
    let annotated = optimize(&html, &collection, &mut registry)?;

    match output {
        Some(path) => {
            fs::write(path, annotated).map_err(|e| eyre!("Failed to write {}: {}", path, e))?
        }
        None => io::stdout().write_all(annotated.as_bytes())?,
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        Command::Annotate {
            metrics,
            input,
            output,
        } => {
            let config = load_config(cli.config.as_ref())?;
            annotate(&config, metrics, input.as_ref(), output.as_ref())
        }
        Command::Extension => {
            let config = load_config(cli.config.as_ref())?;
            print!("{}", extension_module(&config.client_module_url)?);
            Ok(())
        }
        Command::Schema => {
            let schema = serde_json::to_string_pretty(&od_debug_core::schema::inp_data_schema())?;
            println!("{schema}");
            Ok(())
        }
    }
}
