mod commands;
mod logging;
mod settings;

use clap::Parser;
use settings::Settings;
use std::process::ExitCode;

fn main() -> ExitCode {
    let settings = Settings::parse();
    logging::setup_logging(settings.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start the async runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(commands::run(&settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_network() => {
            tracing::error!(error = %e, "Catalogue unavailable");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}
