use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cfgdoc=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Keygen(args) => commands::keygen::run(args, cli.format),
        Commands::Show(args) => commands::show::run(args, cli.format),
        Commands::Get(args) => commands::get::run(args, cli.format),
        Commands::Protect(args) => commands::protect::run(args, false, cli.format),
        Commands::Unprotect(args) => commands::protect::run(args, true, cli.format),
    }
}
