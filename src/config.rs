//! Configuration of the pixeltrack daemon.

use std::{env, error, fmt, io};
use std::fs::File;
use std::io::Read;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Arg, Command};
use log::{info, LevelFilter};
use serde::{de, Deserialize, Deserializer};
#[cfg(unix)]
use syslog::Facility;

use crate::commons::ext_serde;
use crate::constants::*;
use crate::eventlog::{EventFormat, EventLog, EventLogError};

//------------ ConfigDefaults ------------------------------------------------

pub struct ConfigDefaults;

impl ConfigDefaults {
    fn ip() -> Vec<IpAddr> {
        vec![IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))]
    }

    fn port() -> u16 {
        match env::var(PIXELTRACK_ENV_PORT) {
            Ok(port) => match u16::from_str(&port) {
                Ok(port) => port,
                Err(_) => {
                    eprintln!(
                        "Unrecognized value for port in env var {}",
                        PIXELTRACK_ENV_PORT
                    );
                    ::std::process::exit(1);
                }
            },
            _ => 3000,
        }
    }

    fn data_dir() -> PathBuf {
        PathBuf::from("./data")
    }

    fn logs_limit() -> usize {
        EVENTS_QUERY_LIMIT_DFLT
    }

    fn log_level() -> LevelFilter {
        match env::var(PIXELTRACK_ENV_LOG_LEVEL) {
            Ok(level) => match LevelFilter::from_str(&level) {
                Ok(level) => level,
                Err(_) => {
                    eprintln!(
                        "Unrecognized value for log level in env var {}",
                        PIXELTRACK_ENV_LOG_LEVEL
                    );
                    ::std::process::exit(1);
                }
            },
            _ => LevelFilter::Info,
        }
    }

    fn log_type() -> LogType {
        match env::var(PIXELTRACK_ENV_LOG_TYPE) {
            Ok(log_type) => match LogType::from_str(&log_type) {
                Ok(log_type) => log_type,
                Err(err) => {
                    eprintln!(
                        "Unrecognized value for log type in env var {}: {}",
                        PIXELTRACK_ENV_LOG_TYPE, err
                    );
                    ::std::process::exit(1);
                }
            },
            _ => LogType::Stderr,
        }
    }

    fn log_file() -> PathBuf {
        PathBuf::from("./pixeltrack.log")
    }

    fn syslog_facility() -> String {
        "daemon".to_string()
    }
}

//------------ Config --------------------------------------------------------

/// Global configuration for the pixeltrack daemon.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(
        default = "ConfigDefaults::ip",
        deserialize_with = "ext_serde::de_ip_addrs"
    )]
    ip: Vec<IpAddr>,

    #[serde(default = "ConfigDefaults::port")]
    pub port: u16,

    #[serde(default = "ConfigDefaults::data_dir")]
    pub data_dir: PathBuf,

    /// The event log file, defaults to `tracking.log` in the data dir.
    #[serde(default)]
    pub event_log: Option<PathBuf>,

    #[serde(default)]
    pub event_format: EventFormat,

    /// The number of events returned by the events query endpoint.
    #[serde(default = "ConfigDefaults::logs_limit")]
    pub logs_limit: usize,

    #[serde(default)]
    pub pid_file: Option<PathBuf>,

    #[serde(
        default = "ConfigDefaults::log_level",
        deserialize_with = "ext_serde::de_level_filter"
    )]
    pub log_level: LevelFilter,

    #[serde(default = "ConfigDefaults::log_type")]
    pub log_type: LogType,

    #[serde(default = "ConfigDefaults::log_file")]
    pub log_file: PathBuf,

    #[serde(default = "ConfigDefaults::syslog_facility")]
    pub syslog_facility: String,
}

/// # Accessors
impl Config {
    pub fn socket_addresses(&self) -> Vec<SocketAddr> {
        self.ip.iter().map(|ip| SocketAddr::new(*ip, self.port)).collect()
    }

    pub fn event_log_path(&self) -> PathBuf {
        match &self.event_log {
            Some(path) => path.clone(),
            None => self.data_dir.join(EVENT_LOG_FILE_NAME),
        }
    }

    /// Creates the event log described by this config.
    pub fn event_log(&self) -> Result<EventLog, EventLogError> {
        EventLog::create(self.event_log_path(), self.event_format)
    }
}

/// # Create
impl Config {
    /// Creates a config for testing.
    ///
    /// The server listens on localhost on the given port and keeps its
    /// event log in the given directory.
    pub fn test(data_dir: &Path, port: u16) -> Self {
        Config {
            ip: ConfigDefaults::ip(),
            port,
            data_dir: data_dir.to_path_buf(),
            event_log: None,
            event_format: EventFormat::Text,
            logs_limit: EVENTS_QUERY_LIMIT_DFLT,
            pid_file: None,
            log_level: LevelFilter::Debug,
            log_type: LogType::Stderr,
            log_file: data_dir.join("pixeltrack.log"),
            syslog_facility: ConfigDefaults::syslog_facility(),
        }
    }

    pub fn get_config_filename() -> String {
        let matches = Command::new(PIXELTRACK_SERVER_APP)
            .version(PIXELTRACK_VERSION)
            .about("Serves tracking pixels and records every fetch")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .env(PIXELTRACK_ENV_CONFIG)
                    .help(format!(
                        "Override the path to the config file \
                         (default: '{PIXELTRACK_DEFAULT_CONFIG_FILE}')"
                    ))
                    .required(false),
            )
            .get_matches();

        matches
            .get_one::<String>("config")
            .cloned()
            .unwrap_or_else(|| PIXELTRACK_DEFAULT_CONFIG_FILE.to_string())
    }

    /// Creates the config at startup.
    ///
    /// If no config file is given on the command line and the default file
    /// does not exist, the built-in defaults are used.
    pub fn create() -> Result<Self, ConfigError> {
        let config_file = Self::get_config_filename();

        let config = if config_file == PIXELTRACK_DEFAULT_CONFIG_FILE
            && !Path::new(&config_file).exists()
        {
            let config = Self::parse_str("")?;
            config.init_logging()?;
            info!(
                "{} found no configuration file, using defaults",
                PIXELTRACK_SERVER_APP
            );
            config
        }
        else {
            let config = Self::read_config(&config_file).map_err(|e| {
                ConfigError::Other(format!(
                    "Error parsing config file: {config_file}, error: {e}"
                ))
            })?;
            config.init_logging()?;
            info!(
                "{} uses configuration file: {}",
                PIXELTRACK_SERVER_APP, config_file
            );
            config
        };

        config.verify().map_err(|e| {
            ConfigError::Other(format!(
                "Error parsing config file: {config_file}, error: {e}"
            ))
        })?;
        Ok(config)
    }

    pub fn verify(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::other("port must not be 0"));
        }

        if self.logs_limit == 0 || self.logs_limit > EVENTS_QUERY_LIMIT_MAX {
            return Err(ConfigError::Other(format!(
                "logs_limit must be between 1 and {EVENTS_QUERY_LIMIT_MAX}"
            )));
        }

        if self.log_type == LogType::File
            && self.log_file.as_os_str().is_empty()
        {
            return Err(ConfigError::other(
                "log_file must be set with log_type = \"file\""
            ));
        }

        #[cfg(unix)]
        if self.log_type == LogType::Syslog
            && Facility::from_str(&self.syslog_facility).is_err()
        {
            return Err(ConfigError::Other(format!(
                "Unsupported syslog_facility: \"{}\"", self.syslog_facility
            )));
        }

        Ok(())
    }

    pub fn read_config(file: &str) -> Result<Self, ConfigError> {
        let mut v = String::new();
        let mut f = File::open(file)?;
        f.read_to_string(&mut v)?;
        Self::parse_str(&v)
    }

    pub fn parse_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::TomlError)
    }
}

/// # Logging
impl Config {
    pub fn init_logging(&self) -> Result<(), ConfigError> {
        match self.log_type {
            LogType::File => self.file_logger(&self.log_file),
            LogType::Stderr => self.stderr_logger(),
            #[cfg(unix)]
            LogType::Syslog => {
                let facility = Facility::from_str(&self.syslog_facility)
                    .map_err(|_| {
                        ConfigError::other("Invalid syslog_facility")
                    })?;
                self.syslog_logger(facility)
            }
            #[cfg(not(unix))]
            LogType::Syslog => {
                Err(ConfigError::other("syslog is only supported on unix"))
            }
        }
    }

    /// Creates a stderr logger.
    fn stderr_logger(&self) -> Result<(), ConfigError> {
        self.fern_logger()
            .chain(io::stderr())
            .apply()
            .map_err(|e| {
                ConfigError::Other(format!(
                    "Failed to init stderr logging: {e}"
                ))
            })
    }

    /// Creates a file logger using the file provided by `path`.
    fn file_logger(&self, path: &Path) -> Result<(), ConfigError> {
        let file = fern::log_file(path).map_err(|err| {
            ConfigError::Other(format!(
                "Failed to open log file '{}': {}", path.display(), err
            ))
        })?;
        self.fern_logger()
            .chain(file)
            .apply()
            .map_err(|e| {
                ConfigError::Other(format!("Failed to init file logging: {e}"))
            })
    }

    /// Creates a syslog logger and configures correctly.
    #[cfg(unix)]
    fn syslog_logger(&self, facility: Facility) -> Result<(), ConfigError> {
        let process = env::current_exe()
            .ok()
            .and_then(|path| {
                path.file_name()
                    .and_then(std::ffi::OsStr::to_str)
                    .map(ToString::to_string)
            })
            .unwrap_or_else(|| String::from("pixeltrack"));
        let formatter = syslog::Formatter3164 {
            facility,
            hostname: None,
            process,
            pid: std::process::id(),
        };
        let logger = syslog::unix(formatter.clone())
            .or_else(|_| syslog::tcp(formatter.clone(), ("127.0.0.1", 601)))
            .or_else(|_| {
                syslog::udp(formatter, ("127.0.0.1", 0), ("127.0.0.1", 514))
            });
        match logger {
            Ok(logger) => self
                .fern_logger()
                .chain(logger)
                .apply()
                .map_err(|e| {
                    ConfigError::Other(format!("Failed to init syslog: {e}"))
                }),
            Err(err) => {
                Err(ConfigError::Other(format!(
                    "Cannot connect to syslog: {err}"
                )))
            }
        }
    }

    /// Creates and returns a fern logger with log level tweaks
    fn fern_logger(&self) -> fern::Dispatch {
        // suppress overly noisy logging
        let framework_level = self.log_level.min(LevelFilter::Warn);

        let show_target = self.log_level == LevelFilter::Trace
            || self.log_level == LevelFilter::Debug;
        fern::Dispatch::new()
            .format(move |out, message, record| {
                if show_target {
                    out.finish(format_args!(
                        "{} [{}] [{}] {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        record.target(),
                        message
                    ))
                } else {
                    out.finish(format_args!(
                        "{} [{}] {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        message
                    ))
                }
            })
            .level(self.log_level)
            .level_for("hyper", framework_level)
            .level_for("hyper_util", framework_level)
            .level_for("mio", framework_level)
            .level_for("reqwest", framework_level)
            .level_for("want", framework_level)
            .level_for("tracing::span", framework_level)
            .level_for("h2", framework_level)
    }
}

//------------ ConfigError ---------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    IoError(io::Error),
    TomlError(toml::de::Error),
    Other(String),
}

impl ConfigError {
    pub fn other(s: &str) -> ConfigError {
        ConfigError::Other(s.to_string())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => e.fmt(f),
            ConfigError::TomlError(e) => e.fmt(f),
            ConfigError::Other(s) => s.fmt(f),
        }
    }
}

impl error::Error for ConfigError { }

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::TomlError(e)
    }
}

//------------ LogType -------------------------------------------------------

/// The target to log to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogType {
    Stderr,
    File,
    Syslog,
}

impl FromStr for LogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stderr" => Ok(LogType::Stderr),
            "file" => Ok(LogType::File),
            "syslog" => Ok(LogType::Syslog),
            _ => Err(format!(
                "expected \"stderr\", \"file\" or \"syslog\", found: \"{s}\""
            )),
        }
    }
}

impl<'de> Deserialize<'de> for LogType {
    fn deserialize<D>(d: D) -> Result<LogType, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(d)?;
        LogType::from_str(&string).map_err(de::Error::custom)
    }
}

//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_default_config() {
        let c = Config::parse_str("").unwrap();
        assert_eq!(c.data_dir, PathBuf::from("./data"));
        assert_eq!(c.event_format, EventFormat::Text);
        assert_eq!(c.logs_limit, EVENTS_QUERY_LIMIT_DFLT);
        assert_eq!(
            c.event_log_path(), PathBuf::from("./data").join("tracking.log")
        );
        assert_eq!(c.socket_addresses()[0].ip(), ConfigDefaults::ip()[0]);
        assert!(c.verify().is_ok());
    }

    #[test]
    fn should_parse_full_config() {
        let c = Config::parse_str(
            r#"
            ip = ["127.0.0.1", "::1"]
            port = 8080
            data_dir = "/var/lib/pixeltrack"
            event_log = "/var/log/pixeltrack/tracking.log"
            event_format = "json"
            logs_limit = 25
            log_level = "debug"
            log_type = "file"
            log_file = "/var/log/pixeltrack/pixeltrack.log"
            "#
        ).unwrap();

        let addrs: Vec<String> = c.socket_addresses().iter().map(|addr| {
            addr.to_string()
        }).collect();
        assert_eq!(addrs, ["127.0.0.1:8080", "[::1]:8080"]);
        assert_eq!(
            c.event_log_path(),
            PathBuf::from("/var/log/pixeltrack/tracking.log")
        );
        assert_eq!(c.event_format, EventFormat::Json);
        assert_eq!(c.logs_limit, 25);
        assert_eq!(c.log_level, LevelFilter::Debug);
        assert_eq!(c.log_type, LogType::File);
        assert!(c.verify().is_ok());
    }

    #[test]
    fn should_accept_single_ip() {
        let c = Config::parse_str(r#"ip = "0.0.0.0""#).unwrap();
        assert_eq!(c.socket_addresses().len(), 1);
        assert!(c.socket_addresses()[0].ip().is_unspecified());
    }

    #[test]
    fn should_reject_invalid_values() {
        assert!(Config::parse_str(r#"log_type = "console""#).is_err());
        assert!(Config::parse_str(r#"log_level = "loud""#).is_err());
        assert!(Config::parse_str(r#"event_format = "csv""#).is_err());
        assert!(Config::parse_str("ip = []").is_err());

        let c = Config::parse_str("logs_limit = 0").unwrap();
        assert!(c.verify().is_err());

        let c = Config::parse_str("logs_limit = 100000").unwrap();
        assert!(c.verify().is_err());
    }

    #[test]
    fn should_set_correct_log_levels() {
        use log::Level as LL;

        fn void_logger(config: &str) -> Box<dyn log::Log> {
            let c = Config::parse_str(config).unwrap();
            let void_output = fern::Output::writer(Box::new(io::sink()), "");
            let (_, void_logger) = c.fern_logger().chain(void_output).into_log();
            void_logger
        }

        fn enabled(log: &dyn log::Log, target: &str, level: LL) -> bool {
            log.enabled(
                &log::Metadata::builder().target(target).level(level).build()
            )
        }

        let log = void_logger(r#"log_level = "trace""#);
        assert!(enabled(log.as_ref(), "pixeltrack", LL::Trace));
        assert!(enabled(log.as_ref(), "hyper", LL::Warn));
        assert!(!enabled(log.as_ref(), "hyper", LL::Info));
        assert!(!enabled(log.as_ref(), "reqwest", LL::Debug));

        let log = void_logger(r#"log_level = "warn""#);
        assert!(enabled(log.as_ref(), "pixeltrack", LL::Warn));
        assert!(!enabled(log.as_ref(), "pixeltrack", LL::Info));
        assert!(enabled(log.as_ref(), "hyper", LL::Error));
    }
}
