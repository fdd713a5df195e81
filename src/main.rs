//! llmstxt-gateway is an HTTP service that generates llms.txt files for websites by
//! running an external generator script and returning the file it wrote.
//!
//! Endpoints:
//! 1. `POST /generate` - runs the generator for a URL and returns the llms.txt content
//! 2. `GET /check-env` - reports which API key defaults the server was started with

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{LevelFilter, info, warn};

use llmstxt_gateway::{
    Generator, GeneratorConfig, ProcessDefaults, ProcessJobRunner,
    constants::{DEFAULT_OUTPUT_DIR, DEFAULT_SCRIPT_DIR, DEFAULT_SCRIPT_NAME, DEFAULT_TIMEOUT_SECS},
    launcher::resolve_interpreter,
    server::serve,
};

/// An HTTP gateway that builds llms.txt files with an external generator
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, short, env = "LLMSTXT_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Directory containing the generator script; the generator runs inside it
    #[arg(long, env = "LLMSTXT_SCRIPT_DIR", default_value = DEFAULT_SCRIPT_DIR)]
    script_dir: PathBuf,

    /// Generator script file name, relative to the script directory
    #[arg(long, env = "LLMSTXT_SCRIPT", default_value = DEFAULT_SCRIPT_NAME)]
    script: String,

    /// Scratch directory the generator writes its files to
    #[arg(long, short, env = "LLMSTXT_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Maximum seconds a single generation may run before it is killed
    #[arg(long, short, env = "LLMSTXT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", default_value_t = 2)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => warn!("Unable to load .env file: {err}"),
    }

    let script_dir = std::path::absolute(&cli.script_dir)
        .context(format!("Invalid script directory: {}", cli.script_dir.display()))?;
    if !script_dir.join(&cli.script).is_file() {
        warn!(
            "Generator script {} not found in {}, requests will fail until it exists",
            cli.script,
            script_dir.display()
        );
    }
    info!("Using interpreter {}", resolve_interpreter(&script_dir).display());

    let defaults = ProcessDefaults::from_env();
    info!(
        "Default keys configured: firecrawl={}, openai={}; Firecrawl base URL {}",
        defaults.firecrawl_api_key.is_some(),
        defaults.openai_api_key.is_some(),
        defaults.effective_base_url()
    );

    let config = GeneratorConfig {
        script_dir,
        script_name: cli.script,
        output_dir: cli.output_dir,
        timeout: Duration::from_secs(cli.timeout_secs),
    };
    let generator = Arc::new(Generator::new(
        config,
        defaults,
        Arc::new(ProcessJobRunner),
    ));

    serve(generator, cli.bind)
        .await
        .context(format!("Server on {} failed", cli.bind))
}
