use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use modshift::{
    config::{
        Config, DEFAULT_BASE_UNIT, DEFAULT_MAX_IMPORT_ROUNDS, DEFAULT_NAMESPACE_PREFIX, Options,
    },
    graph::Orchestrator,
};

/// Migrate legacy namespace-notation sources to flat import/export modules.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Units to migrate, comma-delimited. Defaults to every unit in the
    /// repository.
    #[arg(short, long, value_delimiter = ',')]
    units: Vec<String>,

    /// Skip the import-resolution sweep.
    #[arg(long)]
    no_imports: bool,

    /// Skip adding export modifiers to top-level declarations.
    #[arg(long)]
    no_exports: bool,

    /// Namespace prefix bare unit names nest under.
    #[arg(long, default_value = DEFAULT_NAMESPACE_PREFIX)]
    namespace_prefix: String,

    /// The base unit every other unit ultimately depends on.
    #[arg(long, default_value = DEFAULT_BASE_UNIT)]
    base_unit: String,

    /// Upper bound on import-resolution rounds per unit.
    #[arg(long, default_value_t = DEFAULT_MAX_IMPORT_ROUNDS)]
    max_import_rounds: u32,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let options = Options {
        units: args.units,
        add_imports: !args.no_imports,
        add_exports: !args.no_exports,
        namespace_prefix: args.namespace_prefix,
        base_unit: args.base_unit,
        max_import_rounds: args.max_import_rounds,
    };
    let cwd = std::env::current_dir()?;
    let config = Config::detect(options, &cwd)?;
    let mut orchestrator = Orchestrator::new(config);
    orchestrator.run()?;
    Ok(())
}
