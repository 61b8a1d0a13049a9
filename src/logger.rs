//! Logging setup on top of `log4rs`.
//!
//! The compiler only logs through the `log` facade; embedding applications
//! either install their own logger or call one of the initialisers here.

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

use crate::config::CompilerConfig;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_RETENTION: u32 = 7;

/// Initializes logging from a `log4rs` YAML file.
///
/// # Errors
/// Returns an error if the file cannot be read or describes an invalid config.
pub fn init_path(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.map(str::to_ascii_lowercase).as_deref() {
        Some("trace") => LevelFilter::Trace,
        Some("debug") => LevelFilter::Debug,
        Some("warn") => LevelFilter::Warn,
        Some("error") => LevelFilter::Error,
        Some("off") => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// Builds the logging config: console output when `dir` is `None`, otherwise a
/// size-rolled `compile.log` in `dir` keeping `retention` old files.
///
/// # Errors
/// Returns an error if the directory or appenders cannot be created.
pub fn build_config(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
    dev6: bool,
) -> Result<Config, Box<dyn std::error::Error>> {
    let lvl = parse_level(level);
    let appender: Box<dyn log4rs::append::Append> = match dir {
        Some(base) => {
            std::fs::create_dir_all(base)?;
            let roller = FixedWindowRoller::builder().build(
                &format!("{}", base.join("compile.{}.log").display()),
                retention.unwrap_or(DEFAULT_RETENTION),
            )?;
            let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
            Box::new(
                RollingFileAppender::builder()
                    .encoder(Box::new(PatternEncoder::new(PATTERN)))
                    .build(base.join("compile.log"), Box::new(policy))?,
            )
        }
        None => Box::new(
            ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(PATTERN))).build(),
        ),
    };
    let dev6_level = if dev6 { LevelFilter::Trace } else { LevelFilter::Off };
    let config = Config::builder()
        .appender(Appender::builder().build("main", appender))
        .logger(
            Logger::builder()
                .appender("main")
                .additive(false)
                .build(crate::utils::devlog::DEV_TARGET, dev6_level),
        )
        .build(Root::builder().appender("main").build(lvl))?;
    Ok(config)
}

/// Installs the global logger. A second call is a no-op.
pub fn configure_logging(dir: Option<&Path>, level: Option<&str>, retention: Option<u32>) {
    configure_logging_with_dev(dir, level, retention, false);
}

pub fn configure_logging_with_dev(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
    dev6: bool,
) {
    match build_config(dir, level, retention, dev6) {
        Ok(config) => {
            let _ = log4rs::init_config(config);
        }
        Err(e) => eprintln!("nexusmap: logging disabled: {e}"),
    }
}

/// Builds the logging config from a compiler config's `log_dir` and `log_level`.
///
/// # Errors
/// See [`build_config`].
pub fn build_config_for(config: &CompilerConfig) -> Result<Config, Box<dyn std::error::Error>> {
    build_config(config.log_dir.as_deref(), config.log_level.as_deref(), env_retention(), env_dev6())
}

/// Installs the global logger from a loaded compiler config. Retention and the
/// dev trace switch still come from `NEXUSMAP_LOG_RETENTION` and `NEXUSMAP_DEV6`.
pub fn configure_from_config(config: &CompilerConfig) {
    match build_config_for(config) {
        Ok(config) => {
            let _ = log4rs::init_config(config);
        }
        Err(e) => eprintln!("nexusmap: logging disabled: {e}"),
    }
}

fn env_retention() -> Option<u32> {
    std::env::var("NEXUSMAP_LOG_RETENTION").ok().and_then(|s| s.parse::<u32>().ok())
}

fn env_dev6() -> bool {
    std::env::var("NEXUSMAP_DEV6")
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Configure logging from environment variables if present:
/// - `NEXUSMAP_LOG_DIR`
/// - `NEXUSMAP_LOG_LEVEL`
/// - `NEXUSMAP_LOG_RETENTION`
/// - `NEXUSMAP_DEV6`
pub fn configure_from_env() {
    configure_from_config(&CompilerConfig::from_env());
}
