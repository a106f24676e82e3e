use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::context::{ContextParams, ContextStyle};
use crate::embeddings::EmbeddingSettings;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "KGCTX_CONFIG";

/// Main configuration structure. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub expansion: ExpansionConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

/// Embeddings configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    /// "hashing" (local, seeded) or "openai"
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Query embedding LRU size; 0 disables the cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            dimensions: default_dimensions(),
            seed: default_seed(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Similarity retrieval configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            threshold: default_threshold(),
        }
    }
}

/// Subgraph expansion configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExpansionConfig {
    #[serde(default = "default_hops")]
    pub hops: usize,
    #[serde(default = "default_max_neighbors")]
    pub max_neighbors_per_hop: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            hops: default_hops(),
            max_neighbors_per_hop: default_max_neighbors(),
        }
    }
}

/// Context rendering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_style")]
    pub style: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            style: default_style(),
        }
    }
}

fn default_provider() -> String {
    "hashing".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_dimensions() -> usize {
    EmbeddingSettings::default().dimensions
}

fn default_seed() -> u64 {
    EmbeddingSettings::default().seed
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_top_k() -> usize {
    ContextParams::default().top_k
}

fn default_threshold() -> f32 {
    ContextParams::default().threshold
}

fn default_hops() -> usize {
    ContextParams::default().hops
}

fn default_max_neighbors() -> usize {
    ContextParams::default().max_neighbors_per_hop
}

fn default_style() -> String {
    ContextStyle::Natural.to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in KGCTX_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = config_path();
        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Like [`Config::load`], but falls back to defaults when no KGCTX_CONFIG is
    /// set and ./config.toml does not exist.
    pub fn load_or_default() -> Result<Self> {
        let _ = dotenv::dotenv();

        if std::env::var_os(CONFIG_ENV).is_none() && !PathBuf::from("config.toml").exists() {
            log::debug!("No config file found, using defaults");
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load()
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        match self.embeddings.provider.as_str() {
            "hashing" => {}
            "openai" => {
                std::env::var(&self.embeddings.api_key_env).with_context(|| {
                    format!(
                        "Environment variable {} not set. Set it in your .env file or as an environment variable with your OpenAI API key.",
                        self.embeddings.api_key_env
                    )
                })?;
            }
            other => anyhow::bail!(
                "embeddings.provider must be \"hashing\" or \"openai\", got \"{}\"",
                other
            ),
        }

        if self.embeddings.dimensions == 0 {
            anyhow::bail!("embeddings.dimensions must be greater than 0");
        }

        if self.retrieval.top_k == 0 {
            anyhow::bail!("retrieval.top_k must be greater than 0");
        }

        if !(-1.0..=1.0).contains(&self.retrieval.threshold) {
            anyhow::bail!("retrieval.threshold must be between -1.0 and 1.0");
        }

        self.style()?;

        Ok(())
    }

    /// Determinism configuration for the embedding backend
    pub fn embedding_settings(&self) -> EmbeddingSettings {
        EmbeddingSettings {
            dimensions: self.embeddings.dimensions,
            seed: self.embeddings.seed,
        }
    }

    /// Retrieval and expansion parameters
    pub fn context_params(&self) -> ContextParams {
        ContextParams {
            top_k: self.retrieval.top_k,
            threshold: self.retrieval.threshold,
            hops: self.expansion.hops,
            max_neighbors_per_hop: self.expansion.max_neighbors_per_hop,
        }
    }

    pub fn style(&self) -> Result<ContextStyle> {
        self.context
            .style
            .parse()
            .context("context.style must be \"natural\" or \"structured\"")
    }
}

fn config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide cwd and env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const FULL_CONFIG: &str = r#"
[embeddings]
provider = "hashing"
dimensions = 64
seed = 7
cache_capacity = 10

[retrieval]
top_k = 3
threshold = 0.25

[expansion]
hops = 2
max_neighbors_per_hop = 4

[context]
style = "structured"
"#;

    /// Restores cwd when dropped (e.g. on panic).
    struct CwdGuard(std::path::PathBuf);
    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    fn with_config_env(config_path: Option<&std::path::Path>, f: impl FnOnce()) {
        let original = std::env::var(CONFIG_ENV).ok();
        match config_path {
            Some(p) => std::env::set_var(CONFIG_ENV, p),
            None => std::env::remove_var(CONFIG_ENV),
        }
        f();
        std::env::remove_var(CONFIG_ENV);
        if let Some(val) = original {
            std::env::set_var(CONFIG_ENV, val);
        }
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(FULL_CONFIG).unwrap();
        assert_eq!(
            config.embedding_settings(),
            EmbeddingSettings {
                dimensions: 64,
                seed: 7
            }
        );
        assert_eq!(config.embeddings.cache_capacity, 10);
        assert_eq!(
            config.context_params(),
            ContextParams {
                top_k: 3,
                threshold: 0.25,
                hops: 2,
                max_neighbors_per_hop: 4,
            }
        );
        assert_eq!(config.style().unwrap(), ContextStyle::Structured);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.embeddings.provider, "hashing");
        assert_eq!(config.embedding_settings(), EmbeddingSettings::default());
        assert_eq!(config.context_params(), ContextParams::default());
        assert_eq!(config.style().unwrap(), ContextStyle::Natural);
    }

    #[test]
    fn test_rejects_invalid_values() {
        for bad in [
            "[embeddings]\nprovider = \"word2vec\"",
            "[embeddings]\ndimensions = 0",
            "[retrieval]\ntop_k = 0",
            "[retrieval]\nthreshold = 1.5",
            "[context]\nstyle = \"tabular\"",
        ] {
            assert!(Config::from_toml_str(bad).is_err(), "accepted: {}", bad);
        }
    }

    #[test]
    fn test_openai_requires_api_key() {
        let content = r#"
[embeddings]
provider = "openai"
api_key_env = "KGCTX_TEST_KEY_THAT_IS_NEVER_SET"
"#;
        let err = Config::from_toml_str(content).unwrap_err();
        assert!(format!("{:#}", err).contains("KGCTX_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_config_load_from_env_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("kgctx.toml");
        fs::write(&config_path, FULL_CONFIG).unwrap();

        with_config_env(Some(&config_path), || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            assert_eq!(config.unwrap().retrieval.top_k, 3);
        });
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nonexistent.toml");

        with_config_env(Some(&missing), || {
            assert!(Config::load().is_err());
            // An explicit path must exist even for load_or_default
            assert!(Config::load_or_default().is_err());
        });
    }

    #[test]
    fn test_load_or_default_without_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let _cwd = CwdGuard(std::env::current_dir().unwrap());
        std::env::set_current_dir(temp_dir.path()).unwrap();

        with_config_env(None, || {
            let config = Config::load_or_default().unwrap();
            assert_eq!(config.context_params(), ContextParams::default());
        });
    }
}
