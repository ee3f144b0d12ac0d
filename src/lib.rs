//! Graphscribe
//!
//! Turns natural-language documents into a Kuzu property graph:
//! - LLM completion gateway over several vendor APIs
//! - Staged schema / node / relationship generation with validation and retries
//! - Transactional execution against the graph store with a cached schema
//! - Projection of arbitrary query results into a renderable node/edge model

pub mod graph;
pub mod llm;
pub mod pipeline;
pub mod store;
pub mod validator;


use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use llm::{CompletionGateway, LlmConfig};
use pipeline::{Generator, Importer, SchemaDiffPlanner};
use store::{GraphEngine, KuzuHttpEngine, TransactionalExecutor};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub store: StoreYamlConfig,
    pub llm: LlmYamlConfig,
    pub pipeline: PipelineYamlConfig,
}

/// Graph store section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreYamlConfig {
    /// Base URL of the Kuzu API server
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for StoreYamlConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".into(),
            timeout_secs: 30,
        }
    }
}

/// LLM section: request timeout plus the provider table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmYamlConfig {
    pub timeout_secs: u64,
    #[serde(flatten)]
    pub providers: LlmConfig,
}

impl Default for LlmYamlConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            providers: LlmConfig::default(),
        }
    }
}

/// Generation pipeline section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineYamlConfig {
    pub max_attempts: usize,
    pub existing_rows_per_table: usize,
}

impl Default for PipelineYamlConfig {
    fn default() -> Self {
        Self {
            max_attempts: pipeline::generator::DEFAULT_MAX_ATTEMPTS,
            existing_rows_per_table: pipeline::session::DEFAULT_ROWS_PER_TABLE,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub store_url: String,
    pub store_timeout_secs: u64,
    pub llm: LlmConfig,
    pub llm_timeout_secs: u64,
    pub max_attempts: usize,
    pub existing_rows_per_table: usize,
    /// File the YAML layer was read from, if any
    pub config_yaml_path: Option<String>,
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. A missing file falls
    /// back to env vars / defaults; a file that exists but does not parse is an
    /// error.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let (yaml, loaded_from) = Self::load_yaml(yaml_path)?;

        let mut llm = yaml.llm.providers;
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_URL") {
            llm.active_mut().url = Some(url);
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            llm.active_mut().model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            llm.active_mut().api_key = Some(key);
        }

        Ok(Self {
            store_url: std::env::var("GRAPHSCRIBE_STORE_URL").unwrap_or(yaml.store.url),
            store_timeout_secs: env_parse("GRAPHSCRIBE_STORE_TIMEOUT_SECS")
                .unwrap_or(yaml.store.timeout_secs),
            llm,
            llm_timeout_secs: env_parse("LLM_TIMEOUT_SECS").unwrap_or(yaml.llm.timeout_secs),
            max_attempts: env_parse("PIPELINE_MAX_ATTEMPTS").unwrap_or(yaml.pipeline.max_attempts),
            existing_rows_per_table: env_parse("PIPELINE_EXISTING_ROWS_PER_TABLE")
                .unwrap_or(yaml.pipeline.existing_rows_per_table),
            config_yaml_path: loaded_from,
        })
    }

    fn load_yaml(yaml_path: Option<&Path>) -> Result<(YamlConfig, Option<String>)> {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config: YamlConfig = serde_yaml::from_str(&contents)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                tracing::info!("Loaded config from {}", path.display());
                Ok((config, Some(path.display().to_string())))
            }
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                Ok((YamlConfig::default(), None))
            }
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<TransactionalExecutor>,
    pub gateway: Arc<CompletionGateway>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the HTTP store client and the built-in LLM backends. No
    /// connection is opened until the first statement.
    pub fn new(config: Config) -> Self {
        let engine = Arc::new(KuzuHttpEngine::new(
            config.store_url.clone(),
            Duration::from_secs(config.store_timeout_secs),
        ));
        let gateway = Arc::new(CompletionGateway::with_default_backends(
            Duration::from_secs(config.llm_timeout_secs),
        ));
        Self::from_parts(config, engine, gateway)
    }

    pub fn from_parts(
        config: Config,
        engine: Arc<dyn GraphEngine>,
        gateway: Arc<CompletionGateway>,
    ) -> Self {
        Self {
            executor: Arc::new(TransactionalExecutor::new(engine)),
            gateway,
            config: Arc::new(config),
        }
    }

    pub fn importer(&self) -> Importer {
        let generator = Generator::new(self.gateway.clone(), self.config.llm.clone())
            .with_max_attempts(self.config.max_attempts);
        let planner = SchemaDiffPlanner::new(self.gateway.clone(), self.config.llm.clone());
        Importer::new(generator, planner, self.executor.clone())
            .with_rows_per_table(self.config.existing_rows_per_table)
    }
}

// ============================================================================
// Tests
// ============================================================================
