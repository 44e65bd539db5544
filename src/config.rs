use crate::compositor::CompositeMode;
use crate::geometry::{SurfaceBounds, GEOMETRY_POLL_INTERVAL};
use crate::params::Profile;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const APP_NAME: &str = "lumascreen";
pub const DEFAULT_LOG_RETENTION: usize = 10;
pub const DEFAULT_SNAPSHOT_SIZE: (i32, i32) = (1920, 1080);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing value for {0}")]
    MissingValue(&'static str),
    #[error("invalid value {value:?} for {flag}: {reason}")]
    InvalidValue {
        flag: &'static str,
        value: String,
        reason: String,
    },
    #[error("unknown argument {0:?}")]
    UnknownArgument(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
    pub retention: usize,
    pub stream_to_stdout: bool,
    /// `tracing-subscriber` filter directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            retention: DEFAULT_LOG_RETENTION,
            stream_to_stdout: false,
            filter: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }
}

/// Render one frame to a PNG instead of opening windows.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRequest {
    pub path: PathBuf,
    pub bounds: SurfaceBounds,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub profile: Profile,
    /// Overrides the profile's compositing mode.
    pub mode: Option<CompositeMode>,
    pub poll_interval_ms: u64,
    pub logging: LoggingConfig,
    #[serde(skip)]
    pub snapshot: Option<SnapshotRequest>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            mode: None,
            poll_interval_ms: GEOMETRY_POLL_INTERVAL.as_millis() as u64,
            logging: LoggingConfig::default(),
            snapshot: None,
        }
    }
}

impl LaunchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses command line arguments (without the program name). A
    /// `--config <file>` is loaded first; every other flag overrides it.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();

        let mut config = match args.iter().position(|a| a == "--config") {
            Some(i) => {
                let path = args.get(i + 1).ok_or(ConfigError::MissingValue("--config"))?;
                Self::load(Path::new(path))?
            }
            None => Self::default(),
        };

        let mut snapshot_path: Option<PathBuf> = None;
        let mut snapshot_size = DEFAULT_SNAPSHOT_SIZE;

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => {
                    iter.next();
                }
                "--profile" => {
                    let value = iter.next().ok_or(ConfigError::MissingValue("--profile"))?;
                    config.profile = parse_profile(&value)?;
                }
                "--mode" => {
                    let value = iter.next().ok_or(ConfigError::MissingValue("--mode"))?;
                    let mode = value.parse::<CompositeMode>().map_err(|e| ConfigError::InvalidValue {
                        flag: "--mode",
                        value: value.clone(),
                        reason: e.to_string(),
                    })?;
                    config.mode = Some(mode);
                }
                "--stream-logs" => config.logging.stream_to_stdout = true,
                "--log-dir" => {
                    let value = iter.next().ok_or(ConfigError::MissingValue("--log-dir"))?;
                    config.logging.log_dir = Some(PathBuf::from(value));
                }
                "--snapshot" => {
                    let value = iter.next().ok_or(ConfigError::MissingValue("--snapshot"))?;
                    snapshot_path = Some(PathBuf::from(value));
                }
                "--size" => {
                    let value = iter.next().ok_or(ConfigError::MissingValue("--size"))?;
                    snapshot_size = parse_size(&value)?;
                }
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }

        config.snapshot = snapshot_path.map(|path| SnapshotRequest {
            path,
            bounds: SurfaceBounds::sized(snapshot_size.0, snapshot_size.1),
        });

        Ok(config)
    }

    pub fn mode(&self) -> CompositeMode {
        self.mode.unwrap_or_else(|| self.profile.default_mode())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

fn parse_profile(value: &str) -> Result<Profile, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "revised" => Ok(Profile::Revised),
        "original" => Ok(Profile::Original),
        _ => Err(ConfigError::InvalidValue {
            flag: "--profile",
            value: value.to_string(),
            reason: "expected \"revised\" or \"original\"".to_string(),
        }),
    }
}

fn parse_size(value: &str) -> Result<(i32, i32), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        flag: "--size",
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| invalid("expected WIDTHxHEIGHT"))?;
    let w: i32 = w.trim().parse().map_err(|_| invalid("width is not an integer"))?;
    let h: i32 = h.trim().parse().map_err(|_| invalid("height is not an integer"))?;
    if w <= 0 || h <= 0 {
        return Err(invalid("dimensions must be positive"));
    }
    Ok((w, h))
}

fn default_log_dir() -> PathBuf {
    if let Ok(app_data) = std::env::var("APPDATA") {
        return PathBuf::from(app_data).join("LumaScreen").join("logs");
    }
    if let Ok(state) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state).join(APP_NAME).join("logs");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("state").join(APP_NAME).join("logs");
    }
    std::env::temp_dir().join(APP_NAME).join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_gives_defaults() {
        let config = LaunchConfig::from_args(Vec::<String>::new()).unwrap();
        assert_eq!(config, LaunchConfig::default());
        assert_eq!(config.mode(), CompositeMode::RoundedFrame);
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn original_profile_defaults_to_bloom() {
        let config = LaunchConfig::from_args(args(&["--profile", "original"])).unwrap();
        assert_eq!(config.profile, Profile::Original);
        assert_eq!(config.mode(), CompositeMode::LayeredBloom);

        let config = LaunchConfig::from_args(args(&["--profile", "original", "--mode", "frame"])).unwrap();
        assert_eq!(config.mode(), CompositeMode::RoundedFrame);
    }

    #[test]
    fn logging_flags() {
        let config = LaunchConfig::from_args(args(&["--stream-logs", "--log-dir", "/tmp/luma"])).unwrap();
        assert!(config.logging.stream_to_stdout);
        assert_eq!(config.logging.resolved_log_dir(), PathBuf::from("/tmp/luma"));
    }

    #[test]
    fn snapshot_with_size() {
        let config = LaunchConfig::from_args(args(&["--snapshot", "out.png", "--size", "800x600"])).unwrap();
        let snapshot = config.snapshot.unwrap();
        assert_eq!(snapshot.path, PathBuf::from("out.png"));
        assert_eq!(snapshot.bounds, SurfaceBounds::sized(800, 600));

        let config = LaunchConfig::from_args(args(&["--snapshot", "out.png"])).unwrap();
        assert_eq!(config.snapshot.unwrap().bounds, SurfaceBounds::sized(1920, 1080));
    }

    #[test]
    fn bad_arguments_are_errors() {
        assert!(matches!(LaunchConfig::from_args(args(&["--mode"])), Err(ConfigError::MissingValue("--mode"))));
        assert!(matches!(LaunchConfig::from_args(args(&["--mode", "glow"])), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(LaunchConfig::from_args(args(&["--profile", "fancy"])), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(LaunchConfig::from_args(args(&["--size", "0x10", "--snapshot", "a.png"])), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(LaunchConfig::from_args(args(&["--verbose"])), Err(ConfigError::UnknownArgument(_))));
    }

    #[test]
    fn json_config_with_cli_override() {
        let dir = std::env::temp_dir().join(format!("lumascreen-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("launch.json");
        fs::write(
            &path,
            r#"{ "profile": "original", "poll_interval_ms": 250, "logging": { "retention": 3 } }"#,
        )
        .unwrap();

        let config = LaunchConfig::from_args(args(&["--config", path.to_str().unwrap(), "--mode", "frame"])).unwrap();
        assert_eq!(config.profile, Profile::Original);
        assert_eq!(config.mode(), CompositeMode::RoundedFrame);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.logging.retention, 3);
        assert_eq!(config.logging.filter, "info");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unreadable_or_malformed_config() {
        let missing = std::env::temp_dir().join("lumascreen-does-not-exist.json");
        assert!(matches!(LaunchConfig::load(&missing), Err(ConfigError::Read { .. })));

        let dir = std::env::temp_dir().join(format!("lumascreen-bad-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        fs::write(&path, "{ profile: ").unwrap();
        assert!(matches!(LaunchConfig::load(&path), Err(ConfigError::Parse { .. })));
        let _ = fs::remove_dir_all(&dir);
    }
}
