#![warn(clippy::pedantic)]

pub mod cli;
pub mod settings;

use anyhow::Result as AnyResult;
use clap::Parser;

fn main() -> AnyResult<()> {
    // Parse first, so `--help` and usage errors don't need logging or settings.
    let args = cli::Cli::parse();
    let settings = settings::Settings::get();

    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(settings.log_level())
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", settings.log_level());
    }

    if settings.did_fail_to_load() {
        match settings::Settings::path() {
            Some(path) if !path.exists() => {
                if let Err(e) = settings.save() {
                    log::warn!("Failed to write default settings:\n{e:?}");
                } else {
                    log::info!("wrote default settings to {}", path.display());
                }
            }
            Some(path) => log::warn!("couldn't read {}, using defaults", path.display()),
            None => log::debug!("no preferences directory, using default settings"),
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let result = runtime.block_on(cli::run(args, settings));
    if let Err(e) = &result {
        log::error!("{e:#}");
    }
    result
}
