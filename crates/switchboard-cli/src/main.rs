use std::process::ExitCode;

use clap::Parser;
use switchboard_cli::{run, telemetry, Cli, CliConfig, ERROR_EXIT_CODE};
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = CliConfig::default().with_cli(&cli);
    telemetry::init(config.verbose);

    let mut stdout = std::io::stdout().lock();
    match run(&config, &cli.command, &mut stdout) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(ERROR_EXIT_CODE)
        }
    }
}
