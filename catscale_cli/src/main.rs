mod cli;
mod logging;
mod run;
mod simulate;

use std::fs;
use std::path::Path;

use clap::Parser;
use eyre::{Result, WrapErr};

use catscale_config::Config;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let config = load_config(&args.config)?;
    logging::init(&config.logging, &args.log_level, args.json);
    config.validate().wrap_err("invalid configuration")?;

    match args.cmd {
        Commands::Run {
            duration_s,
            cat_grams,
            seed,
            output,
        } => run::execute(&config, duration_s, cat_grams, seed, output.as_deref()),
        Commands::Simulate { input, output } => {
            simulate::execute(&config, &input, output.as_deref())
        }
    }
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        catscale_config::load_toml(&content)
            .wrap_err_with(|| format!("failed to parse config {}", path.display()))
    } else {
        // Built-in defaults match the reference cell and a 10 Hz loop.
        Ok(Config::default())
    }
}
