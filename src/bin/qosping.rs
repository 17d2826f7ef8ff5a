use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use qosping::experiment::{
    init_logging_with_config, Config, ExperimentError, ExperimentResult, Orchestrator, Reporter,
};
use qosping::probe::SystemExecutor;
use tracing::{error, info};

fn main() {
    // Parse CLI arguments
    let config = Config::parse();

    init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(2);
    }

    if let Err(e) = run(config) {
        error!(error = %e, "qosping failed");
        report_failure(&e);
        std::process::exit(1);
    }
}

fn report_failure(e: &anyhow::Error) {
    match e.downcast_ref::<ExperimentError>() {
        Some(ExperimentError::Probe { id, source }) => {
            eprintln!("{} {}", "No results for".red().bold(), id.bold());
            eprintln!("{}", source);
        }
        _ => eprintln!("Error: {:#}", e),
    }
}

fn run(config: Config) -> Result<()> {
    let result = match &config.read {
        Some(path) => ExperimentResult::load(path)
            .with_context(|| format!("Failed to read results from {}", path.display()))?,
        None => {
            println!("{}", "qosping".bold());
            for target in &config.targets {
                println!("  {} → {} (ToS {})", target.id, target.host, target.tos);
            }
            println!();

            let mut orchestrator =
                Orchestrator::new(config.settings(), SystemExecutor).with_progress(!config.quiet);
            orchestrator.run(&config.targets)?
        }
    };

    if let Some(path) = &config.write {
        result
            .save(path)
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
        info!(path = %path.display(), "Saved results");
    }

    Reporter.print_results(&result)?;
    Ok(())
}
