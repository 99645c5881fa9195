use crate::config::Config;
use crate::models::SeedMode;
use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

static STUDIO_LOGGER: Lazy<StudioLogger> = Lazy::new(StudioLogger::new);

pub fn init() -> Result<(), String> {
    init_with_config(LoggerConfig::default())
}

pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let level = config.min_level;
    STUDIO_LOGGER.update_config(config)?;

    // A second init (tests, embedding apps) keeps the first logger but
    // still applies the new config.
    if log::set_logger(&*STUDIO_LOGGER).is_err() {
        log::debug!("Logger already installed, configuration updated");
    }

    log::set_max_level(level.to_level_filter());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LogLevel::Trace => "🔍",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "💡",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn to_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::Trace,
            LogLevel::Debug => Level::Debug,
            LogLevel::Info => Level::Info,
            LogLevel::Warn => Level::Warn,
            LogLevel::Error => Level::Error,
        }
    }

    pub fn to_level_filter(&self) -> LevelFilter {
        self.to_level().to_level_filter()
    }

    pub fn from_level(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

/// One rendered log line, also the JSON shape written in production mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub module: String,
    pub file: String,
    pub line: u32,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level: LogLevel::from_level(record.level()),
            message: record.args().to_string(),
            module: record.module_path().unwrap_or("unknown").to_string(),
            file: record.file().unwrap_or("unknown").to_string(),
            line: record.line().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_module: bool,
    pub show_file_location: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file_path: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_emojis: true,
            show_module: true,
            show_file_location: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file_path: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_file_path = Some(path.to_string());
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: false,
            show_emojis: false,
            output_json: true,
            log_file_path: Some("rgen-studio.log".to_string()),
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_colors: true,
            show_emojis: true,
            show_file_location: true,
            output_json: false,
            ..Default::default()
        }
    }
}

struct LoggerState {
    config: LoggerConfig,
    file: Option<File>,
}

pub struct StudioLogger {
    state: Mutex<LoggerState>,
}

impl StudioLogger {
    fn new() -> Self {
        Self {
            state: Mutex::new(LoggerState {
                config: LoggerConfig::default(),
                file: None,
            }),
        }
    }

    fn update_config(&self, config: LoggerConfig) -> Result<(), String> {
        let file = match &config.log_file_path {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| format!("Failed to open log file {}: {}", path, e))?,
            ),
            None => None,
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| "Logger state poisoned".to_string())?;
        state.config = config;
        state.file = file;
        Ok(())
    }
}

fn paint(text: &str, config: &LoggerConfig, style: impl Fn(&str) -> ColoredString) -> String {
    if config.show_colors {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

fn format_line(entry: &LogEntry, config: &LoggerConfig) -> String {
    let mut output = String::new();

    let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
    output.push_str(&paint(&timestamp, config, |s| s.bright_black()));
    output.push(' ');

    let level = if config.show_emojis {
        format!("{} {}", entry.level.emoji(), entry.level.as_str())
    } else {
        entry.level.as_str().to_string()
    };
    let color = entry.level.color();
    output.push_str(&format!(
        "[{}] ",
        paint(&level, config, |s| s.color(color).bold())
    ));

    if config.show_module && !entry.module.is_empty() {
        output.push_str(&paint(&entry.module, config, |s| s.bright_blue()));
        output.push_str("::");
    }

    output.push_str(&paint(&entry.message, config, |s| s.white().bold()));

    if config.show_file_location {
        let location = format!("({}:{})", entry.file, entry.line);
        output.push(' ');
        output.push_str(&paint(&location, config, |s| s.bright_black()));
    }

    output
}

impl log::Log for StudioLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.state.lock() {
            Ok(state) => metadata.level() <= state.config.min_level.to_level(),
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record);

        if let Ok(mut state) = self.state.lock() {
            let line = if state.config.output_json {
                serde_json::to_string(&entry).unwrap_or_default()
            } else {
                format_line(&entry, &state.config)
            };
            // stderr keeps stdout free for command output
            eprintln!("{}", line);

            if let Some(file) = state.file.as_mut() {
                let _ = writeln!(file, "{}", line);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Ok(mut state) = self.state.lock() {
            if let Some(file) = state.file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Logs how long a scope took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  Starting timer: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!(
            "⏱️  {} completed in {}ms",
            self.name,
            self.elapsed().as_millis()
        );
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str) {
    log::info!("🚀 Starting {} v{}", app_name, version);
}

pub fn log_config_info(config: &Config) {
    log::info!("⚙️  Configuration loaded:");
    log::info!("   Region: {}", config.bedrock.region_or_default());
    log::info!(
        "   Static credentials: {}",
        if config.bedrock.access_key.is_some() { "✅" } else { "❌ (default chain)" }
    );
    log::info!("   Model: {}", config.generation.model_id);
    match config.generation.params.seed {
        SeedMode::Random => log::info!("   Seed: random per request"),
        SeedMode::Fixed(seed) => log::info!("   Seed: fixed at {} (reproducible)", seed),
    }
    log::info!("   Timeout: {}s", config.generation.timeout.as_secs());
}
