mod api;
mod cli;
mod config;
mod database;
mod error;
mod import;
mod ratings;
mod schema;
mod server;
#[cfg(test)]
mod test_utils;

use cli::Cli;
use config::Config;
use directories::ProjectDirs;
use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
};
use log::{debug, error};

const LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;
const LOG_FILES_KEPT: usize = 5;

fn main() {
    let Some(project_dirs) = ProjectDirs::from("", "", "sitly-ratings") else {
        eprintln!("Could not determine the application data directory");
        std::process::exit(1);
    };

    let config = Config::init(&project_dirs);

    let logger = setup_logging(&project_dirs, config)
        .map_err(|e| eprintln!("Failed to start logging: {}", e))
        .ok();

    debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());

    let result = Cli::handle_command_line(&project_dirs);

    if let Err(err) = &result {
        error!("{:?}", err);
        eprintln!("{}", err);
    }

    if let Some(logger) = logger {
        logger.flush();
    }

    if result.is_err() {
        std::process::exit(1);
    }
}

/// File logging under the app data directory at the configured level. Warnings and
/// errors are duplicated to stderr; other crates only log warnings and up.
fn setup_logging(
    project_dirs: &ProjectDirs,
    config: &Config,
) -> Result<LoggerHandle, FlexiLoggerError> {
    let log_dir = project_dirs.data_local_dir().join("logs");

    Logger::try_with_str(format!("warn, sitly_ratings={}", config.logging.sitly))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename("sitly-ratings"),
        )
        .rotate(
            Criterion::Size(LOG_FILE_SIZE),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(LOG_FILES_KEPT),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .format_for_files(flexi_logger::detailed_format)
        .start()
}
