use std::process;

use clap::Parser;
use storypost::{commands, config, error::AppError, telemetry};
use tracing::{Dispatch, Level, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    let cli_args = match config::CliArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            process::exit(code);
        }
    };

    if let Err(error) = run(cli_args).await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "command failed");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "command failed");
    });
}

async fn run(cli_args: config::CliArgs) -> Result<(), AppError> {
    let settings = config::load(&cli_args)?;
    telemetry::init(&settings.logging)?;

    commands::run(cli_args.command, settings).await
}
