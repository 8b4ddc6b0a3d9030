use ChemLogic::cli::cli_main::run_interactive_menu;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::str::FromStr;

/// environment variable with the log level: off|error|warn|info|debug|trace
const LOG_ENV: &str = "CHEMLOGIC_LOG";

pub fn main() {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|level| LevelFilter::from_str(level.trim()).ok())
        .unwrap_or(LevelFilter::Warn);
    if let Err(e) = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("logger was not initialised: {}", e);
    }
    run_interactive_menu();
}
