use crate::predictor::Thresholds;
use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "linkmon", "linkmon")
            .context("cannot locate config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(PathBuf::from).unwrap_or_else(|| {
            Config::default_path().unwrap_or_else(|_| PathBuf::from("./config.toml"))
        });
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading config at {:?}", path))?;
            let mut cfg: Config = toml::from_str(&content).context("parsing config")?;
            cfg.expand_paths();
            Ok(cfg)
        } else {
            let mut cfg = Config::default();
            cfg.expand_paths();
            Ok(cfg)
        }
    }

    pub fn expand_paths(&mut self) {
        if let Some(file) = &self.logging.file {
            self.logging.file = Some(expand_tilde(file));
        }
        if let Some(pid) = &self.feed.pid_file {
            self.feed.pid_file = Some(expand_tilde(pid));
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Address the feed daemon serves viewers on.
    #[serde(default = "FeedConfig::default_listen")]
    pub listen: String,
    /// Wireless interface to sample; autodetected when unset.
    #[serde(default)]
    pub interface: Option<String>,
    /// Address the RTT probe connects to, typically the gateway.
    #[serde(default)]
    pub probe: Option<String>,
    #[serde(default = "FeedConfig::default_interval", with = "humantime_serde")]
    pub interval: Duration,
    /// Emit synthetic measurements instead of sampling the kernel.
    #[serde(default)]
    pub simulate: bool,
    #[serde(default = "FeedConfig::default_pid_file")]
    pub pid_file: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            listen: Self::default_listen(),
            interface: None,
            probe: None,
            interval: Self::default_interval(),
            simulate: false,
            pid_file: Self::default_pid_file(),
        }
    }
}

impl FeedConfig {
    fn default_listen() -> String {
        "127.0.0.1:12346".into()
    }

    fn default_interval() -> Duration {
        Duration::from_secs(1)
    }

    fn default_pid_file() -> Option<PathBuf> {
        Some(PathBuf::from("~/.local/state/linkmon/linkmon-feed.pid"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Feed address the viewer connects to.
    #[serde(default = "ViewerConfig::default_feed_addr")]
    pub feed_addr: String,
    /// Points kept per chart channel.
    #[serde(default = "ViewerConfig::default_chart_capacity")]
    pub chart_capacity: usize,
    #[serde(default = "ViewerConfig::default_tick", with = "humantime_serde")]
    pub tick: Duration,
    /// Ring the terminal bell on warnings of caution level and above.
    #[serde(default = "ViewerConfig::default_bell")]
    pub bell: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            feed_addr: Self::default_feed_addr(),
            chart_capacity: Self::default_chart_capacity(),
            tick: Self::default_tick(),
            bell: Self::default_bell(),
        }
    }
}

impl ViewerConfig {
    fn default_feed_addr() -> String {
        "127.0.0.1:12346".into()
    }

    fn default_chart_capacity() -> usize {
        60
    }

    fn default_tick() -> Duration {
        Duration::from_millis(250)
    }

    fn default_bell() -> bool {
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: Some(PathBuf::from("~/.local/state/linkmon/feed.log")),
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".into()
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if !path_str.starts_with('~') {
        return path.to_path_buf();
    }

    let home = BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    if path_str == "~" {
        home
    } else {
        let mut expanded = home;
        expanded.push(path_str.trim_start_matches("~/"));
        expanded
    }
}
