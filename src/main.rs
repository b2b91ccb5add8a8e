//! tpfan - zero-configuration ThinkPad fan daemon
//!
//! Reads the hottest hwmon sensor once per second and sets the
//! thinkpad_acpi fan level accordingly.

use tpfan::cli::Cli;
use tpfan::commands::run_control;
use tpfan::error::AppError;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    if Cli::wants_help(std::env::args_os()) {
        if let Err(e) = Cli::print_help() {
            log::error!("{}", e);
        }
        return;
    }

    let cli = Cli::from_env();

    if let Err(e) = run_control(&cli) {
        print_error(&e);
        if matches!(e, AppError::Internal(_)) {
            std::process::abort();
        }
        std::process::exit(1);
    }
}

fn print_error(err: &AppError) {
    match err.hint() {
        Some(hint) => eprintln!("Error: {} ({})", err, hint),
        None => eprintln!("Error: {}", err),
    }
}
