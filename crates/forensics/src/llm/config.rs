use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Candidate models, newest first.
pub const DEFAULT_MODELS: &[&str] = &[
    "gemini-3-flash-preview",
    "gemini-3-pro-preview",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.0-flash",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelConfig {
    pub provider: ProviderConfig,

    #[serde(default)]
    pub vision: VisionSettings,

    #[serde(default)]
    pub limits: Limits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "openai")]
    OpenAI {
        #[serde(default = "default_models")]
        models: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        api_key: Option<String>, // falls back to GEMINI_API_KEY
        #[serde(skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    #[serde(rename = "simulated")]
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionSettings {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_timeout_seconds() -> u64 {
    60
}
fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::OpenAI {
                models: default_models(),
                api_key: None,
                base_url: None,
            },
            vision: VisionSettings::default(),
            limits: Limits::default(),
        }
    }
}

impl SentinelConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Reads a file by extension (`.json`, anything else as YAML), or the
    /// defaults when no path is given, then layers the environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let is_json = path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false);
                let loaded = if is_json {
                    Self::from_json_file(path)
                } else {
                    Self::from_yaml_file(path)
                };
                loaded.with_context(|| format!("Failed to load config from {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let ProviderConfig::OpenAI {
            models,
            api_key,
            base_url,
        } = &mut self.provider
        {
            if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("SENTINEL_API_KEY")) {
                *api_key = Some(key.trim().to_string());
            }

            if let Some(list) = non_empty("SENTINEL_MODELS") {
                *models = list
                    .split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect();
            }

            if let Some(url) = non_empty("SENTINEL_BASE_URL") {
                *base_url = Some(url.trim().to_string());
            }
        }

        if let Some(temp) = non_empty("SENTINEL_TEMPERATURE") {
            if let Ok(t) = temp.trim().parse::<f32>() {
                self.vision.temperature = t;
            }
        }

        if let Some(limit) = non_empty("SENTINEL_MAX_IMAGE_BYTES") {
            if let Ok(bytes) = limit.trim().parse::<usize>() {
                self.limits.max_image_bytes = bytes;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let ProviderConfig::OpenAI { models, .. } = &self.provider {
            if models.is_empty() {
                bail!("provider.models must list at least one model");
            }
        }
        if !(0.0..=2.0).contains(&self.vision.temperature) {
            bail!(
                "vision.temperature must be between 0.0 and 2.0, got {}",
                self.vision.temperature
            );
        }
        if self.vision.max_tokens == 0 {
            bail!("vision.max_tokens must be positive");
        }
        if self.vision.max_tokens > u32::from(u16::MAX) {
            bail!(
                "vision.max_tokens must be at most {}, got {}",
                u16::MAX,
                self.vision.max_tokens
            );
        }
        if self.limits.max_image_bytes == 0 {
            bail!("limits.max_image_bytes must be positive");
        }
        Ok(())
    }

    pub fn api_key(&self) -> Option<&str> {
        match &self.provider {
            ProviderConfig::OpenAI { api_key, .. } => api_key.as_deref(),
            ProviderConfig::Simulated => None,
        }
    }

    /// Copy safe to print: the API key is reduced to its last four characters.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let ProviderConfig::OpenAI { api_key, .. } = &mut copy.provider {
            if let Some(key) = api_key.as_mut() {
                *key = mask_secret(key);
            }
        }
        copy
    }
}

pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("...{}", tail)
}

pub const EXAMPLE_CONFIG: &str = r#"
# Receipt Sentinel Configuration

provider:
  type: openai
  # Tried in order; rate-limited or failing models fall through to the next
  models:
    - gemini-3-flash-preview
    - gemini-3-pro-preview
    - gemini-2.5-flash
    - gemini-2.5-flash-lite
    - gemini-2.0-flash
    - gemini-1.5-pro
    - gemini-1.5-flash
  # api_key: ...  # Optional, defaults to GEMINI_API_KEY env var
  # base_url: https://generativelanguage.googleapis.com/v1beta/openai

vision:
  temperature: 0.2
  max_tokens: 2048
  timeout_seconds: 60

limits:
  max_image_bytes: 10485760
"#;
