//! Various pixeltrack-wide constants.


//------------ Binary Names -------------------------------------------------

/// The friendly name of the `pixeltrack` binary.
pub const PIXELTRACK_SERVER_APP: &str = "Pixeltrack";

/// The friendly name of the `pixeltrackc` binary.
pub const PIXELTRACK_CLIENT_APP: &str = "Pixeltrack Client";

/// The version of this crate.
pub const PIXELTRACK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The status reported by the health endpoint.
pub const PIXELTRACK_STATUS_RUNNING: &str = "Pixeltrack Server Running";


//------------ Config Files Paths -------------------------------------------

/// The default path to the pixeltrack config file.
pub const PIXELTRACK_DEFAULT_CONFIG_FILE: &str = "/etc/pixeltrack.conf";


//------------ Environment Variables ----------------------------------------

/// The environment variable with the path to the config file.
pub const PIXELTRACK_ENV_CONFIG: &str = "PIXELTRACK_CONFIG";

/// The environment variable with the log level.
///
/// The variable should contain the name of a [`log::LevelFilter`]. It will
/// be overwritten by the config file. The default is “info.”
pub const PIXELTRACK_ENV_LOG_LEVEL: &str = "PIXELTRACK_LOG_LEVEL";

/// The environment variable with the log target.
///
/// The variable should contain the name of a
/// [`LogType`][crate::config::LogType]. It will be overwritten by the config
/// file. The default is “stderr.”
pub const PIXELTRACK_ENV_LOG_TYPE: &str = "PIXELTRACK_LOG_TYPE";

/// The environment variable with the port to listen on.
///
/// Hosting platforms commonly hand the port to a service this way. It will
/// be overwritten by the config file.
pub const PIXELTRACK_ENV_PORT: &str = "PORT";

/// The environment variable with the server URI used by `pixeltrackc`.
pub const PIXELTRACK_ENV_SERVER: &str = "PIXELTRACK_SERVER";


//------------ Event Log Defaults -------------------------------------------

/// The name of the event log file inside the data directory.
pub const EVENT_LOG_FILE_NAME: &str = "tracking.log";

/// The default number of events returned by the `/logs` endpoint.
pub const EVENTS_QUERY_LIMIT_DFLT: usize = 10;

/// The maximum value for the `logs_limit` config value.
pub const EVENTS_QUERY_LIMIT_MAX: usize = 1000;


//------------ Tracking Pixel -----------------------------------------------

/// A transparent 1×1 GIF.
///
/// This is served unchanged for every pixel request.
pub const TRACKING_PIXEL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00,
    0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00,
    0x00, 0x02, 0x01, 0x44, 0x00, 0x3b,
];

/// The `Cache-Control` header value of the pixel response.
pub const TRACKING_PIXEL_CACHE_CONTROL: &str =
    "no-store, no-cache, must-revalidate, proxy-revalidate";

/// The length of the random part of a generated tracking ID.
pub const TRACKING_ID_SUFFIX_LEN: usize = 6;


//------------ HTTP Defaults ------------------------------------------------

/// The HTTP client request timeout.
pub const HTTP_CLIENT_TIMEOUT_SECS: u64 = 30;

/// The maximum length of a user agent string taken from HTTP requests.
///
/// If the user agent value in an incoming request is longer than this value,
/// it will be truncated before being logged.
pub const HTTP_USER_AGENT_TRUNCATE: usize = 256;
