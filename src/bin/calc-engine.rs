use calc_engine::{
    config::{self, EngineConfig},
    CalculationEvaluator, Configuration, Error, InternalResult,
};
use clap::Parser;
use std::{
    io::{self, Read},
    path::PathBuf,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the calculation configuration (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Path to the input state (JSON); read from stdin when omitted
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Module identifier reported as `name`
    #[arg(short, long)]
    module_name: Option<String>,

    /// Path to engine settings (JSON)
    #[arg(short, long)]
    engine_config: Option<PathBuf>,

    /// Print the compiled script instead of evaluating
    #[arg(long)]
    emit_script: bool,

    /// Pretty-print the result record
    #[arg(short, long)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: &Cli) -> InternalResult<()> {
    let mut engine_config: EngineConfig = match &cli.engine_config {
        Some(path) => config::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(module_name) = &cli.module_name {
        engine_config.module_name = module_name.clone();
    }
    debug!("engine config: {:?}", engine_config);

    let configuration: Configuration = config::from_file(&cli.config)?;
    info!(
        segment = %configuration.name,
        variables = configuration.variables.len(),
        "configuration loaded."
    );

    let evaluator = CalculationEvaluator::create_with_config(&configuration, &engine_config)?;
    if cli.emit_script {
        println!("{}", evaluator.script());
        return Ok(());
    }

    let state: serde_json::Value = match &cli.state {
        Some(path) => config::from_file(path)?,
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .map_err(|source| Error::Io {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            config::from_str(&input)?
        }
    };

    let record = evaluator.evaluate_json(&state);
    let output = if cli.pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{}", output);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
