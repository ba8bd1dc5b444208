use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// How the index of the first track layer relates to the image layer count.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TrackIndexing {
    /// `image_layers + 1 + i`: one index is left unused between the image and track layers.
    #[default]
    SkipOne,
    /// `image_layers + i`.
    Contiguous,
}

/// Zone used to turn a naive capture time into an epoch second.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TimeZonePolicy {
    #[default]
    Local,
    Utc,
}

/// What to do with a file whose mandatory tags are present but unreadable.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ParseErrorPolicy {
    #[default]
    Skip,
    Abort,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub image_extensions: Vec<String>,
    pub track_extensions: Vec<String>,
    pub session_file_name: String,
    pub josm_port: u16,
    pub remote_timeout_secs: u64,
    pub track_indexing: TrackIndexing,
    pub time_zone: TimeZonePolicy,
    pub parse_error_policy: ParseErrorPolicy,
    pub skip_empty_layers: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            image_extensions: vec!["jpg".into()],
            track_extensions: vec!["nmea".into(), "gpx".into()],
            session_file_name: "session.jos".into(),
            josm_port: 8111,
            remote_timeout_secs: 5,
            track_indexing: TrackIndexing::default(),
            time_zone: TimeZonePolicy::default(),
            parse_error_policy: ParseErrorPolicy::default(),
            skip_empty_layers: false,
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let defaults = AppConfig::default();

        let s = Config::builder()
            .set_default("log_level", defaults.log_level)?
            .set_default("image_extensions", defaults.image_extensions)?
            .set_default("track_extensions", defaults.track_extensions)?
            .set_default("session_file_name", defaults.session_file_name)?
            .set_default("josm_port", i64::from(defaults.josm_port))?
            .set_default("remote_timeout_secs", defaults.remote_timeout_secs as i64)?
            .set_default("track_indexing", "skip-one")?
            .set_default("time_zone", "local")?
            .set_default("parse_error_policy", "skip")?
            .set_default("skip_empty_layers", defaults.skip_empty_layers)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("JOSM_SESSION"))
            .build()?;

        s.try_deserialize()
    }
}
