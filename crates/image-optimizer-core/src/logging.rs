use log::LevelFilter;

use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::config::LogLevel;
use crate::error::{Error, Result};

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Initialize file-based logging with rotation.
///
/// Logs go to file only so they never interleave with the progress bar on
/// the console. Rotates at 10MB, keeping 5 archived files. The
/// `OPTIMIZER_LOG` environment variable overrides the configured level.
pub fn init_logger(log_dir: &str, level: LogLevel) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let log_file_path = format!("{}/optimizer.log", log_dir);
    let archived_pattern = format!("{}/optimizer.{{}}.log", log_dir);

    let trigger = SizeTrigger::new(10 * 1024 * 1024);
    let roller = FixedWindowRoller::builder()
        .build(&archived_pattern, 5)
        .map_err(|e| Error::Configuration(format!("failed to create log roller: {}", e)))?;
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    let rolling_file = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] [{M}:{L}] - {m}{n}",
        )))
        .build(&log_file_path, Box::new(policy))
        .map_err(|e| Error::Configuration(format!("failed to create log appender: {}", e)))?;

    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("file", Box::new(rolling_file)))
        .build(Root::builder().appender("file").build(level.into()))
        .map_err(|e| Error::Configuration(format!("failed to build log config: {}", e)))?;

    log4rs::init_config(config)
        .map_err(|e| Error::Configuration(format!("failed to initialize log4rs: {}", e)))?;

    if let Ok(level) = std::env::var("OPTIMIZER_LOG") {
        if let Ok(filter) = level.parse::<LevelFilter>() {
            log::set_max_level(filter);
        }
    }

    log::info!("logging to file: {}", log_file_path);
    Ok(())
}
