use crate::config::ServiceConfig;
use crate::dispatcher::Dispatcher;
use crate::logging::init_logging_with_config;
use crate::server::serve;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line interface for a brrtdispatch service
#[derive(Parser)]
#[command(name = "brrtdispatch")]
#[command(version, about = "brrtdispatch service", long_about = None)]
pub struct Cli {
    /// YAML configuration file; defaults apply when omitted
    #[arg(short, long, global = true, env = "BRRTD_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the registered routes over HTTP
    Serve {
        /// Address and port to bind, overriding the configuration
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the route table and exit
    Routes,
    /// Print the effective configuration as YAML and exit
    Config,
}

/// Configuration after file, `BRRTD_*` and command-line overrides.
///
/// # Errors
///
/// Any [`crate::config::ConfigError`] from loading the file or environment.
pub fn effective_config(cli: &Cli) -> anyhow::Result<ServiceConfig> {
    let mut config = ServiceConfig::load(cli.config.as_deref())
        .with_context(|| match &cli.config {
            Some(path) => format!("loading configuration from {}", path.display()),
            None => "loading configuration".to_string(),
        })?;
    if let Commands::Serve {
        bind: Some(bind), ..
    } = &cli.command
    {
        config.http.bind = bind.clone();
    }
    Ok(config)
}

/// One line per route, in registration order.
#[must_use]
pub fn render_routes(dispatcher: &Dispatcher) -> String {
    let mut out = String::new();
    for line in dispatcher.router().route_summaries() {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Run the parsed command.
///
/// `build` registers the service's routes on a dispatcher created for the
/// effective configuration. `serve` drives all requests from one event loop.
///
/// # Errors
///
/// Configuration, logging, registration and server errors are returned.
pub fn run_cli<F>(cli: Cli, build: F) -> anyhow::Result<()>
where
    F: FnOnce(&ServiceConfig) -> anyhow::Result<Dispatcher>,
{
    let config = effective_config(&cli)?;
    match cli.command {
        Commands::Serve { .. } => {
            init_logging_with_config(&config.logging)?;
            let dispatcher = Arc::new(build(&config).context("registering routes")?);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("starting the async runtime")?;
            runtime
                .block_on(serve(dispatcher, &config.http))
                .with_context(|| format!("serving on {}", config.http.bind))?;
        }
        Commands::Routes => {
            let dispatcher = build(&config).context("registering routes")?;
            print!("{}", render_routes(&dispatcher));
        }
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }
    Ok(())
}
