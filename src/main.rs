use std::process::ExitCode;

use plistsync::PlistError;
use plistsync::cli::Cli;
use tracing_subscriber::fmt::SubscriberBuilder;

/// Exit status when sync mode finds no JSON file to read
const EXIT_MISSING_JSON: u8 = 2;

fn main() -> ExitCode {
    let matches = Cli::build_command().get_matches();

    let _ = SubscriberBuilder::default()
        .with_max_level(Cli::log_level(&matches))
        .with_writer(std::io::stderr)
        .try_init();

    match Cli::run_with_matches(matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ PlistError::MissingJsonFile(_)) => {
            tracing::debug!("{err:?}");
            println!("{err}");
            ExitCode::from(EXIT_MISSING_JSON)
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
