use std::path::PathBuf;
use std::time::SystemTime;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// Console output goes to stderr with colored levels; the optional log file gets
/// plain lines at its own level.
pub fn setup_logging(
    console_level: LevelFilter,
    log_file: Option<PathBuf>,
    file_level: LevelFilter,
) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    let console = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} {:<5} {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                colors.color(record.level()),
                message
            ))
        })
        .level(console_level)
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new()
        // Dependencies are noisy at debug level
        .level_for("reqwest", LevelFilter::Info)
        .level_for("hyper_util", LevelFilter::Info)
        .chain(console);

    if let Some(path) = log_file {
        let file = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{} {:<5} [{}] {}",
                    humantime::format_rfc3339_seconds(SystemTime::now()),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(file_level)
            .chain(
                fern::log_file(&path)
                    .wrap_err(format!("Failed to open log file: {}", path.display()))?,
            );
        dispatch = dispatch.chain(file);
    }

    dispatch
        .apply()
        .wrap_err("Failed to initialize logging")?;

    Ok(())
}
