use chrono::{DateTime, Local};
use log::{LevelFilter, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

// File logger for the terminal viewer: the TUI owns stdout, so records go to
// a file whenever one is configured.

pub struct SimpleLogger {
    log_file: Option<Mutex<File>>,
}

impl SimpleLogger {
    pub fn new(log_file_path: Option<&Path>) -> std::io::Result<Self> {
        let log_file = match log_file_path {
            Some(path) => Some(Mutex::new(OpenOptions::new().create(true).append(true).open(path)?)),
            None => None,
        };

        Ok(SimpleLogger { log_file })
    }
}

pub fn format_record(now: DateTime<Local>, record: &Record) -> String {
    format!(
        "[{}] {} [{}:{}] {}\n",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.args()
    )
}

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let log_message = format_record(Local::now(), record);

        match &self.log_file {
            Some(file) => {
                let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
                let _ = file.write_all(log_message.as_bytes());
            }
            None => print!("{}", log_message),
        }
    }

    fn flush(&self) {
        match &self.log_file {
            Some(file) => {
                let _ = file.lock().unwrap_or_else(|e| e.into_inner()).flush();
            }
            None => {
                let _ = std::io::stdout().flush();
            }
        }
    }
}

pub fn setup_logging(log_file: Option<&Path>, level: LevelFilter) -> anyhow::Result<()> {
    let logger = SimpleLogger::new(log_file)?;
    log::set_boxed_logger(Box::new(logger)).map(|()| log::set_max_level(level))?;

    log::info!("Logging initialized at level: {}", level);
    log::info!("{} version {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Ok(())
}
