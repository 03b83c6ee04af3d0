use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::judge::{DEFAULT_API_URL, DEFAULT_MODEL, OpenAiConfig, ReviewSettings};
use crate::prompt::PromptLimits;

/// Name of the project config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".mdaccess.toml";

/// Project configuration loaded from `.mdaccess.toml`.
/// Every key is optional; CLI flags override what the file sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Chat completions endpoint.
    pub api_url: String,
    /// Most characters of a document sent to the judge.
    pub max_document_chars: usize,
    /// Most characters of the rules sent to the judge.
    pub max_rules_chars: usize,
    /// Reply token cap.
    pub max_tokens: u32,
    /// Model name.
    pub model: String,
    /// Where the report is written.
    pub output: PathBuf,
    /// Custom accessibility rules file.
    pub rules: Option<PathBuf>,
    /// Sampling temperature of the first attempt.
    pub temperature: f32,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Raw TOML structure for `.mdaccess.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct MdaccessTomlConfig {
    api_url: Option<String>,
    max_document_chars: Option<usize>,
    max_rules_chars: Option<usize>,
    max_tokens: Option<u32>,
    model: Option<String>,
    output: Option<PathBuf>,
    rules: Option<PathBuf>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            api_url: DEFAULT_API_URL.to_string(),
            max_document_chars: PromptLimits::default().max_document_chars,
            max_rules_chars: PromptLimits::default().max_rules_chars,
            max_tokens: 4096,
            model: DEFAULT_MODEL.to_string(),
            output: PathBuf::from("report.md"),
            rules: None,
            temperature: ReviewSettings::default().temperature,
            timeout_secs: 120,
        };
    }
}

impl Config {
    /// Load `.mdaccess.toml` from `root`, or defaults if the file doesn't exist.
    /// A file that exists but is malformed is an error, never a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed, or `Error::InvalidConfig`.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(&content);
    }

    /// Load an explicitly named config file, which must exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigNotFound` if the file is missing, otherwise as `load`.
    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(&content);
    }

    /// Parse config TOML, filling unset keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys,
    /// or `Error::InvalidConfig` if a value is out of range.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: MdaccessTomlConfig = toml::from_str(content)?;
        let defaults = Self::default();
        let config = Self {
            api_url: raw.api_url.unwrap_or(defaults.api_url),
            max_document_chars: raw.max_document_chars.unwrap_or(defaults.max_document_chars),
            max_rules_chars: raw.max_rules_chars.unwrap_or(defaults.max_rules_chars),
            max_tokens: raw.max_tokens.unwrap_or(defaults.max_tokens),
            model: raw.model.unwrap_or(defaults.model),
            output: raw.output.unwrap_or(defaults.output),
            rules: raw.rules,
            temperature: raw.temperature.unwrap_or(defaults.temperature),
            timeout_secs: raw.timeout_secs.unwrap_or(defaults.timeout_secs),
        };
        config.validate()?;
        return Ok(config);
    }

    /// Reject values the judge adapter cannot use.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` naming the offending key.
    fn validate(&self) -> Result<(), Error> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::InvalidConfig {
                key: "temperature",
                reason: format!("must be between 0 and 2, got {}", self.temperature),
            });
        }
        if self.model.trim().is_empty() {
            return Err(Error::InvalidConfig { key: "model", reason: "must not be empty".to_string() });
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig { key: "timeout_secs", reason: "must be positive".to_string() });
        }
        return Ok(());
    }

    /// Review settings derived from this config.
    pub fn review_settings(&self) -> ReviewSettings {
        return ReviewSettings {
            limits: PromptLimits {
                max_document_chars: self.max_document_chars,
                max_rules_chars: self.max_rules_chars,
            },
            temperature: self.temperature,
        };
    }

    /// Judge connection settings with an explicitly supplied API key.
    pub fn judge_config(&self, api_key: Option<String>) -> OpenAiConfig {
        return OpenAiConfig {
            api_key,
            api_url: self.api_url.clone(),
            max_tokens: self.max_tokens,
            model: self.model.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        };
    }
}
