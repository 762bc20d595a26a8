//! # CLI Module
//!
//! Command-line entry point shared by services built on brrtdispatch. A
//! service parses [`Cli`], then hands it to [`run_cli`] together with a
//! function that registers its routes.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Initialise logging and serve the routes until Ctrl-C:
//!
//! ```bash
//! items_service serve --config config/config.yaml --bind 0.0.0.0:8080
//! ```
//!
//! ### `routes`
//!
//! Print the route table in registration order and exit:
//!
//! ```bash
//! items_service routes
//! ```
//!
//! ### `config`
//!
//! Print the effective configuration (file plus `BRRTD_*` overrides) as YAML.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use brrtdispatch::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse(), |config| registry::build(config))?;
//! ```

mod commands;


pub use commands::{effective_config, render_routes, run_cli, Cli, Commands};
