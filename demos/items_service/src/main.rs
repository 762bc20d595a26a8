use brrtdispatch::cli::{run_cli, Cli};
use clap::Parser;

mod handlers;
mod registry;

fn main() -> anyhow::Result<()> {
    let store = handlers::Store::default();
    run_cli(Cli::parse(), |config| registry::build(config, store))
}
