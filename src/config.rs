use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::session::digest::DigestOptions;
use crate::summarizer::{HttpSummarizer, SummarizerOptions, SummaryShape};

/// Tool configuration, stored as TOML under the user config directory
/// (`confy` manages the file). Every field has a serde default so partial
/// files keep working across upgrades.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub vault: VaultConfig,
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Vault directory the daily note is written into; `~` is expanded.
    pub path: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        VaultConfig {
            path: "~/recap".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub enabled: bool,
    /// OpenAI-compatible endpoint root (the `/v1/chat/completions` suffix is
    /// appended).
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key. No key in the
    /// environment means external summarization stays off.
    pub api_key_env: String,
    /// Optional plain-text instructions file; unset falls back to
    /// `instructions.md` next to the config file, then the embedded default.
    pub instructions_path: Option<String>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        SummarizerConfig {
            enabled: true,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "RECAP_API_KEY".to_string(),
            instructions_path: None,
        }
    }
}

pub fn load_config() -> Result<Config> {
    confy::load("recap", None).context("Failed to load configuration")
}

impl Config {
    /// Digest caps, resolved once here at the program boundary and threaded
    /// into every extractor.
    pub fn digest_options(&self) -> DigestOptions {
        DigestOptions::from_env()
    }

    pub fn summarizer_options(&self) -> SummarizerOptions {
        SummarizerOptions {
            instructions_path: self.instructions_file(),
            shape: SummaryShape::Prose,
            ..SummarizerOptions::default()
        }
        .with_env_overrides()
    }

    /// External backend, or `None` when summarization is disabled or no API
    /// key is present.
    pub fn summarizer_backend(&self) -> Option<HttpSummarizer> {
        if !self.summarizer.enabled {
            return None;
        }
        let api_key = std::env::var(&self.summarizer.api_key_env).ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        Some(HttpSummarizer::new(
            &self.summarizer.base_url,
            &api_key,
            &self.summarizer.model,
        ))
    }

    fn instructions_file(&self) -> Option<PathBuf> {
        if let Some(configured) = &self.summarizer.instructions_path {
            return Some(PathBuf::from(shellexpand::tilde(configured).to_string()));
        }
        dirs::config_dir().map(|dir| dir.join("recap").join("instructions.md"))
    }

    pub fn vault_dir(&self) -> PathBuf {
        crate::vault::resolve_vault_dir(&self.vault.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.summarizer.enabled);
        assert_eq!(config.summarizer.api_key_env, "RECAP_API_KEY");
        assert_eq!(config.vault.path, "~/recap");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [summarizer]
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        assert_eq!(config.summarizer.model, "gpt-4o");
        assert_eq!(config.summarizer.base_url, "https://api.openai.com");
        assert_eq!(config.vault.path, "~/recap");
    }

    #[test]
    fn test_instructions_path_expansion() {
        let mut config = Config::default();
        config.summarizer.instructions_path = Some("/etc/recap/inst.md".to_string());
        assert_eq!(
            config.instructions_file(),
            Some(PathBuf::from("/etc/recap/inst.md"))
        );
    }
}
