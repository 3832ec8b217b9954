//! Bindings inspector
//!
//! Entry point for `bridge-inspect`. Parses CLI arguments, loads context
//! options and delegates to the Inspector.

use bindings::ContextOptions;
use bridge_cli::{Cli, CliError, Command, Inspector};
use clap::Parser as ClapParser;

fn run(cli: Cli) -> Result<(), CliError> {
    let options = match &cli.config {
        Some(path) => ContextOptions::from_file(path)?,
        None => ContextOptions::default(),
    };
    let mut inspector = Inspector::new(options)?;

    match cli.command {
        Command::Types => print!("{}", inspector.type_tree()),
        Command::Order { json: true } => {
            println!("{}", serde_json::to_string_pretty(&inspector.install_order_json())?)
        }
        Command::Order { json: false } => {
            for name in inspector.install_order() {
                println!("{}", name);
            }
        }
        Command::Convert { json } => println!("{}", inspector.convert(&json)?),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
