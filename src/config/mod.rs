// src/config/mod.rs - Moderation settings, validation and hot-reload

use anyhow::Result;
use log::{debug, error, info, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use crate::moderation::classifier::normalize;
use crate::moderation::spam_rules::{default_rules, SpamRule};
use crate::moderation::ModerationGate;

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to write TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported configuration format '{0}' (expected yaml, toml or json)")]
    UnsupportedFormat(String),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Timing limits for the behavioral rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum spacing between two accepted messages from one sender
    pub min_message_interval_ms: u64,
    pub max_messages_per_window: u32,
    pub window_duration_ms: u64,
    /// Violations that trigger a timeout
    pub violation_threshold: u32,
    pub timeout_duration_ms: u64,
    /// Senders idle for this many windows are evicted by the sweep
    pub idle_eviction_factor: u32,
}

impl RateLimitConfig {
    pub fn min_message_interval(&self) -> Duration {
        Duration::from_millis(self.min_message_interval_ms)
    }

    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_duration_ms)
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout_duration_ms)
    }

    /// Saturates at `Duration::MAX` instead of overflowing
    pub fn idle_threshold(&self) -> Duration {
        self.window_duration()
            .checked_mul(self.idle_eviction_factor)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_message_interval_ms: 1000,
            max_messages_per_window: 5,
            window_duration_ms: 10_000,
            violation_threshold: 3,
            timeout_duration_ms: 30_000,
            idle_eviction_factor: 2,
        }
    }
}

/// One spam heuristic as written in a settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpamRuleConfig {
    RepeatedToken { min_repeats: usize },
    RepeatedChar { min_run: usize },
    PromotionalKeywords { keywords: Vec<String> },
    Url,
    Pattern { regex: String },
}

/// Content rules applied after the rate limiter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Maximum length in characters after trimming
    pub max_message_length: usize,
    pub banned_terms: Vec<String>,
    /// Evaluated in order; the first match flags the message
    pub spam_rules: Vec<SpamRuleConfig>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_message_length: 500,
            banned_terms: [
                "fuck", "shit", "ass", "bitch", "dick", "pussy", "cock", "whore", "bastard", "cunt",
                "piss", "slut", "wanker", "damn", "hell",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            spam_rules: default_rules(),
        }
    }
}

/// Everything the gate and its host need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationSettings {
    /// How often the host should sweep idle senders
    pub sweep_interval_secs: u64,
    pub rate_limits: RateLimitConfig,
    pub content: ContentConfig,
}

impl Default for ModerationSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
            rate_limits: RateLimitConfig::default(),
            content: ContentConfig::default(),
        }
    }
}

/// Supported settings file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl ModerationSettings {
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let settings = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Ok(settings)
    }

    pub fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        let content = match format {
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        };
        Ok(content)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Rejects settings the gate cannot run with
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, settings: &ModerationSettings) -> Result<(), ConfigError> {
        if settings.sweep_interval_secs == 0 {
            return Err(invalid("sweep_interval_secs", "must be greater than zero"));
        }
        self.validate_rate_limits(&settings.rate_limits)?;
        self.validate_content(&settings.content)
    }

    pub fn validate_rate_limits(&self, limits: &RateLimitConfig) -> Result<(), ConfigError> {
        if limits.window_duration_ms == 0 {
            return Err(invalid("rate_limits.window_duration_ms", "must be greater than zero"));
        }
        if limits.timeout_duration_ms == 0 {
            return Err(invalid("rate_limits.timeout_duration_ms", "must be greater than zero"));
        }
        if limits.max_messages_per_window == 0 {
            return Err(invalid("rate_limits.max_messages_per_window", "must be at least 1"));
        }
        if limits.violation_threshold == 0 {
            return Err(invalid("rate_limits.violation_threshold", "must be at least 1"));
        }
        if limits.idle_eviction_factor == 0 {
            return Err(invalid("rate_limits.idle_eviction_factor", "must be at least 1"));
        }
        Ok(())
    }

    pub fn validate_content(&self, content: &ContentConfig) -> Result<(), ConfigError> {
        if content.max_message_length == 0 {
            return Err(invalid("content.max_message_length", "must be at least 1"));
        }

        for term in &content.banned_terms {
            if normalize(term).trim().is_empty() {
                return Err(invalid(
                    "content.banned_terms",
                    format!("'{}' is empty after normalization", term),
                ));
            }
        }

        for rule in &content.spam_rules {
            match rule {
                SpamRuleConfig::RepeatedToken { min_repeats } if *min_repeats < 2 => {
                    return Err(invalid("content.spam_rules.min_repeats", "must be at least 2"));
                }
                SpamRuleConfig::RepeatedChar { min_run } if *min_run < 2 => {
                    return Err(invalid("content.spam_rules.min_run", "must be at least 2"));
                }
                _ => {}
            }
            SpamRule::compile(rule)?;
        }

        Ok(())
    }
}

const RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

/// Events broadcast when the settings file changes
#[derive(Debug, Clone)]
pub enum ConfigChangeEvent {
    SettingsUpdated { file: String },
    ValidationError { file: String, error: String },
}

/// Loads, caches and watches the moderation settings file
#[derive(Clone)]
pub struct ConfigurationManager {
    config_path: PathBuf,
    settings: Arc<RwLock<ModerationSettings>>,
    watchers: Arc<RwLock<Vec<RecommendedWatcher>>>,
    change_notifier: broadcast::Sender<ConfigChangeEvent>,
    validator: Arc<ConfigValidator>,
}

impl ConfigurationManager {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Self {
        let (tx, _) = broadcast::channel(32);

        Self {
            config_path: config_path.as_ref().to_path_buf(),
            settings: Arc::new(RwLock::new(ModerationSettings::default())),
            watchers: Arc::new(RwLock::new(Vec::new())),
            change_notifier: tx,
            validator: Arc::new(ConfigValidator::new()),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the settings file, writing the defaults first if it does not exist
    pub async fn initialize(&self) -> Result<()> {
        if !self.config_path.exists() {
            warn!(
                "Settings file {} not found, writing defaults",
                self.config_path.display()
            );
            self.create_default_config().await?;
        }

        let settings = Self::read_settings(&self.config_path, &self.validator).await?;
        *self.settings.write().await = settings;

        info!("Loaded moderation settings from {}", self.config_path.display());
        Ok(())
    }

    async fn create_default_config(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
                info!("Created configuration directory: {}", parent.display());
            }
        }

        let format = ConfigFormat::from_path(&self.config_path)?;
        let content = ModerationSettings::default().render(format)?;
        fs::write(&self.config_path, content)
            .await
            .map_err(|source| ConfigError::Io {
                path: self.config_path.clone(),
                source,
            })?;

        info!("Created default settings: {}", self.config_path.display());
        Ok(())
    }

    async fn read_settings(path: &Path, validator: &ConfigValidator) -> Result<ModerationSettings, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let settings = ModerationSettings::parse(&content, format)?;
        validator.validate(&settings)?;
        Ok(settings)
    }

    /// Re-read the file. Invalid content leaves the cached settings untouched.
    pub async fn reload(&self) -> Result<()> {
        Self::reload_settings(
            &self.config_path,
            &self.settings,
            &self.validator,
            &self.change_notifier,
        )
        .await
    }

    async fn reload_settings(
        path: &Path,
        settings: &Arc<RwLock<ModerationSettings>>,
        validator: &ConfigValidator,
        change_notifier: &broadcast::Sender<ConfigChangeEvent>,
    ) -> Result<()> {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match Self::read_settings(path, validator).await {
            Ok(updated) => {
                *settings.write().await = updated;
                debug!("Reloaded moderation settings from {}", path.display());
                let _ = change_notifier.send(ConfigChangeEvent::SettingsUpdated { file });
                Ok(())
            }
            Err(e) => {
                error!("Failed to reload {}: {}", path.display(), e);
                let _ = change_notifier.send(ConfigChangeEvent::ValidationError {
                    file,
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Watch the settings file and reload it when it changes
    pub async fn watch(&self) -> Result<()> {
        let watch_dir = match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let target = self.config_path.file_name().map(|n| n.to_os_string());

        let config_path = self.config_path.clone();
        let settings = self.settings.clone();
        let validator = self.validator.clone();
        let change_notifier = self.change_notifier.clone();

        let (tx, mut rx) = tokio::sync::mpsc::channel(64);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if let Err(e) = tx.blocking_send(event) {
                    error!("Failed to forward file watch event: {}", e);
                }
            }
            Err(e) => error!("File watcher error: {}", e),
        })?;

        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
        self.watchers.write().await.push(watcher);

        tokio::spawn(async move {
            let touches_config = |event: &Event| {
                matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                    && event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == target)
            };

            while let Some(event) = rx.recv().await {
                if !touches_config(&event) {
                    continue;
                }

                // Reload once the file has been quiet for the debounce period
                let quiet = tokio::time::sleep(RELOAD_DEBOUNCE);
                tokio::pin!(quiet);
                let mut closed = false;
                loop {
                    tokio::select! {
                        _ = &mut quiet => break,
                        next = rx.recv() => match next {
                            Some(event) if touches_config(&event) => {
                                quiet.as_mut().reset(tokio::time::Instant::now() + RELOAD_DEBOUNCE);
                            }
                            Some(_) => {}
                            None => {
                                closed = true;
                                break;
                            }
                        },
                    }
                }

                info!("Settings file changed, reloading...");
                let _ = Self::reload_settings(&config_path, &settings, &validator, &change_notifier).await;
                if closed {
                    break;
                }
            }
            debug!("Stopped watching {}", config_path.display());
        });

        info!("Watching {} for changes", self.config_path.display());
        Ok(())
    }

    /// Apply every successful reload to `gate`
    pub fn bind_gate(&self, gate: Arc<ModerationGate>) -> JoinHandle<()> {
        let mut rx = self.subscribe_to_changes();
        let settings = self.settings.clone();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ConfigChangeEvent::SettingsUpdated { file }) => {
                        let current = settings.read().await.clone();
                        match gate.apply_settings(&current) {
                            Ok(()) => info!("Applied updated moderation settings from {}", file),
                            Err(e) => error!("Could not apply settings from {}: {}", file, e),
                        }
                    }
                    Ok(ConfigChangeEvent::ValidationError { file, error }) => {
                        warn!("Keeping previous settings, {} is invalid: {}", file, error);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Missed {} configuration events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    pub async fn get_settings(&self) -> ModerationSettings {
        self.settings.read().await.clone()
    }

    pub fn subscribe_to_changes(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.change_notifier.subscribe()
    }

    /// Validate and persist new settings
    pub async fn save_settings(&self, settings: ModerationSettings) -> Result<()> {
        self.validator.validate(&settings)?;

        let format = ConfigFormat::from_path(&self.config_path)?;
        let content = settings.render(format)?;
        fs::write(&self.config_path, content)
            .await
            .map_err(|source| ConfigError::Io {
                path: self.config_path.clone(),
                source,
            })?;

        *self.settings.write().await = settings;
        info!("Saved moderation settings to {}", self.config_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::clock::MockClock;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let settings = ModerationSettings::default();
        assert!(ConfigValidator::new().validate(&settings).is_ok());
        assert_eq!(settings.rate_limits.idle_threshold(), Duration::from_secs(20));
        assert_eq!(settings.sweep_interval(), Duration::from_secs(60));
        assert_eq!(settings.content.spam_rules.len(), 4);
    }

    #[test]
    fn test_idle_threshold_saturates() {
        let limits = RateLimitConfig {
            window_duration_ms: 10_000_000_000_000_000,
            idle_eviction_factor: 2000,
            ..RateLimitConfig::default()
        };
        assert!(ConfigValidator::new().validate_rate_limits(&limits).is_ok());
        assert_eq!(limits.idle_threshold(), Duration::MAX);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
rate_limits:
  min_message_interval_ms: 50
content:
  banned_terms: [scam]
  spam_rules:
    - type: url
    - type: pattern
      regex: "moon\\s*soon"
"#;
        let settings = ModerationSettings::parse(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(settings.rate_limits.min_message_interval_ms, 50);
        assert_eq!(settings.rate_limits.max_messages_per_window, 5);
        assert_eq!(settings.content.max_message_length, 500);
        assert_eq!(settings.content.banned_terms, vec!["scam".to_string()]);
        assert_eq!(
            settings.content.spam_rules[1],
            SpamRuleConfig::Pattern {
                regex: "moon\\s*soon".to_string()
            }
        );
        assert_eq!(settings.sweep_interval_secs, 60);
    }

    #[test]
    fn test_toml_and_json_formats() {
        let settings = ModerationSettings::default();

        let toml_text = settings.render(ConfigFormat::Toml).unwrap();
        assert_eq!(ModerationSettings::parse(&toml_text, ConfigFormat::Toml).unwrap(), settings);

        let json_text = settings.render(ConfigFormat::Json).unwrap();
        assert!(json_text.contains("\"promotional_keywords\""));
        assert_eq!(ModerationSettings::parse(&json_text, ConfigFormat::Json).unwrap(), settings);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/b.yml")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("x.TOML")).unwrap(), ConfigFormat::Toml);
        assert!(matches!(
            ConfigFormat::from_path(Path::new("settings.ini")),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let validator = ConfigValidator::new();

        let mut settings = ModerationSettings::default();
        settings.rate_limits.window_duration_ms = 0;
        assert!(matches!(
            validator.validate(&settings),
            Err(ConfigError::Invalid { field: "rate_limits.window_duration_ms", .. })
        ));

        let mut settings = ModerationSettings::default();
        settings.content.banned_terms.push("!!!".to_string());
        assert!(matches!(
            validator.validate(&settings),
            Err(ConfigError::Invalid { field: "content.banned_terms", .. })
        ));

        let mut settings = ModerationSettings::default();
        settings.content.spam_rules.push(SpamRuleConfig::RepeatedChar { min_run: 1 });
        assert!(validator.validate(&settings).is_err());

        let mut settings = ModerationSettings::default();
        settings.content.spam_rules.push(SpamRuleConfig::Pattern {
            regex: "[unclosed".to_string(),
        });
        assert!(matches!(
            validator.validate(&settings),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[tokio::test]
    async fn test_initialize_writes_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("moderation.yaml");
        let manager = ConfigurationManager::new(&path);

        manager.initialize().await.unwrap();
        assert!(path.exists());
        assert_eq!(manager.get_settings().await, ModerationSettings::default());
    }

    #[tokio::test]
    async fn test_reload_keeps_previous_settings_on_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("moderation.toml");
        let manager = ConfigurationManager::new(&path);
        manager.initialize().await.unwrap();
        let mut events = manager.subscribe_to_changes();

        let mut updated = ModerationSettings::default();
        updated.rate_limits.max_messages_per_window = 9;
        fs::write(&path, updated.render(ConfigFormat::Toml).unwrap()).await.unwrap();
        manager.reload().await.unwrap();
        assert_eq!(manager.get_settings().await.rate_limits.max_messages_per_window, 9);
        assert!(matches!(
            events.recv().await.unwrap(),
            ConfigChangeEvent::SettingsUpdated { .. }
        ));

        fs::write(&path, "rate_limits = \"nonsense\"").await.unwrap();
        assert!(manager.reload().await.is_err());
        assert_eq!(manager.get_settings().await.rate_limits.max_messages_per_window, 9);
        assert!(matches!(
            events.recv().await.unwrap(),
            ConfigChangeEvent::ValidationError { .. }
        ));
    }

    #[tokio::test]
    async fn test_save_settings_validates() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("moderation.json");
        let manager = ConfigurationManager::new(&path);
        manager.initialize().await.unwrap();

        let mut bad = ModerationSettings::default();
        bad.sweep_interval_secs = 0;
        assert!(manager.save_settings(bad).await.is_err());

        let mut good = ModerationSettings::default();
        good.sweep_interval_secs = 15;
        manager.save_settings(good.clone()).await.unwrap();

        let on_disk = fs::read_to_string(&path).await.unwrap();
        assert_eq!(ModerationSettings::parse(&on_disk, ConfigFormat::Json).unwrap(), good);
    }

    #[test_log::test(tokio::test)]
    async fn test_watch_reloads_final_write_of_a_burst() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("moderation.yaml");
        let manager = ConfigurationManager::new(&path);
        manager.initialize().await.unwrap();
        manager.watch().await.unwrap();
        let mut events = manager.subscribe_to_changes();

        // A half-written file followed quickly by the finished one
        fs::write(&path, "rate_limits: [").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut updated = ModerationSettings::default();
        updated.rate_limits.max_messages_per_window = 9;
        fs::write(&path, updated.render(ConfigFormat::Yaml).unwrap()).await.unwrap();

        for _ in 0..300 {
            if manager.get_settings().await.rate_limits.max_messages_per_window == 9 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(manager.get_settings().await.rate_limits.max_messages_per_window, 9);

        // The burst settles into a single successful reload
        assert!(matches!(
            events.recv().await.unwrap(),
            ConfigChangeEvent::SettingsUpdated { .. }
        ));
    }

    #[tokio::test]
    async fn test_bound_gate_follows_reloads() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("moderation.yaml");
        let manager = ConfigurationManager::new(&path);
        manager.initialize().await.unwrap();

        let gate = Arc::new(ModerationGate::with_clock(
            &manager.get_settings().await,
            Arc::new(MockClock::default()),
        ).unwrap());
        let _binding = manager.bind_gate(gate.clone());

        let mut updated = ModerationSettings::default();
        updated.rate_limits.min_message_interval_ms = 5;
        updated.content.banned_terms = vec!["rugpull".to_string()];
        manager.save_settings(updated.clone()).await.unwrap();
        manager.reload().await.unwrap();

        for _ in 0..50 {
            if gate.rate_limits().min_message_interval_ms == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(gate.rate_limits().min_message_interval_ms, 5);
        assert!(!gate.validate("rugpull incoming", "alice").is_valid());
    }
}
