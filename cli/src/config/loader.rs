//! CLI configuration loader for CalcBot
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./calcbot.json or ./.calcbot/config.json
//! 3. Git repository root: <repo_root>/.calcbot/config.json
//! 4. User config dir: $XDG_CONFIG_HOME/calcbot/config.json or the platform equivalent
//! 5. Environment variables only (no files)
//! 6. The offline rule-based planner when nothing else is configured

use anyhow::{anyhow, Context, Result};
use calcbot_core::{ModelParams, Protocol, ResolvedLlmConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Name of the per-project config file
pub const CONFIG_FILE_NAME: &str = "calcbot.json";

/// Name of the per-project config directory
pub const CONFIG_DIR_NAME: &str = ".calcbot";

/// Environment variables naming an API key, per protocol, in detection order
const PROTOCOL_KEYS: &[(&str, &[&str])] = &[
    ("google_ai", &["GOOGLE_API_KEY", "GEMINI_API_KEY"]),
    ("openai", &["OPENAI_API_KEY"]),
    ("anthropic", &["ANTHROPIC_API_KEY"]),
    ("azure_openai", &["AZURE_OPENAI_API_KEY"]),
];

/// Raw configuration file format (simple single-file schema)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConfig {
    /// Protocol to use
    pub protocol: String,
    /// API key (can be "env:VAR_NAME" for environment variable)
    #[serde(default)]
    pub api_key: String,
    /// Base URL (optional, uses protocol default if not specified)
    pub base_url: Option<String>,
    /// Model name (optional, uses protocol default if not specified)
    #[serde(default)]
    pub model: String,
    /// Model parameters (optional)
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers (optional)
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl RawConfig {
    fn offline() -> Self {
        Self {
            protocol: Protocol::Offline.as_str().to_string(),
            api_key: String::new(),
            base_url: None,
            model: String::new(),
            params: ModelParams::default(),
            headers: HashMap::new(),
        }
    }
}

/// CLI configuration loader
#[derive(Default)]
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    protocol_override: Option<String>,
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
    /// Directory to start the search from instead of the working directory
    search_dir: Option<PathBuf>,
    /// User config directory instead of the platform one
    config_home: Option<PathBuf>,
    /// Environment snapshot instead of the process environment
    env: Option<HashMap<String, String>>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set protocol override
    pub fn with_protocol_override(mut self, protocol: String) -> Self {
        self.protocol_override = Some(protocol);
        self
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Search for config files from this directory
    pub fn with_search_dir(mut self, dir: PathBuf) -> Self {
        self.search_dir = Some(dir);
        self
    }

    /// Use this directory as the user config directory
    pub fn with_config_home(mut self, dir: PathBuf) -> Self {
        self.config_home = Some(dir);
        self
    }

    /// Read environment variables from this map only
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<ResolvedLlmConfig> {
        // Step 1: Find and load base configuration
        let mut config = if self.protocol_override_is_offline() {
            tracing::debug!("Offline protocol requested, skipping config discovery");
            RawConfig::offline()
        } else if let Some(override_path) = &self.config_override {
            let expanded = expand_path(override_path)?;
            self.load_from_path(&expanded).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    expanded.display()
                )
            })?
        } else {
            // Search in priority order
            self.search_and_load().await?
        };

        // Step 2: Apply flag overrides
        if let Some(protocol) = &self.protocol_override {
            config.protocol = protocol.clone();
        }
        if let Some(api_key) = &self.api_key_override {
            config.api_key = api_key.clone();
        }
        if let Some(base_url) = &self.base_url_override {
            config.base_url = Some(base_url.clone());
        }
        if let Some(model) = &self.model_override {
            config.model = model.clone();
        }

        // Step 3: Resolve to final LLM config
        self.resolve_config(config)
    }

    fn protocol_override_is_offline(&self) -> bool {
        self.protocol_override
            .as_deref()
            .map(parse_protocol)
            .is_some_and(|protocol| protocol == Protocol::Offline)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        let value = match &self.env {
            Some(env) => env.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        value.filter(|value| !value.is_empty())
    }

    fn search_root(&self) -> Result<PathBuf> {
        match &self.search_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to determine working directory"),
        }
    }

    /// Search for config in priority order
    async fn search_and_load(&self) -> Result<RawConfig> {
        let root = self.search_root()?;

        // 1. Current working directory
        if let Some(config) = self.try_load_dir(&root).await? {
            return Ok(config);
        }

        // 2. Git repository root
        if let Some(config) = self.try_load_git_root(&root).await? {
            return Ok(config);
        }

        // 3. User config directory
        if let Some(config) = self.try_load_config_home().await? {
            return Ok(config);
        }

        // 4. Environment variables only
        self.try_load_env_only()
    }

    /// Try loading from a project directory
    async fn try_load_dir(&self, dir: &Path) -> Result<Option<RawConfig>> {
        let calcbot_json = dir.join(CONFIG_FILE_NAME);
        if calcbot_json.is_file() {
            return Ok(Some(self.load_file(&calcbot_json).await?));
        }

        let calcbot_dir_config = dir.join(CONFIG_DIR_NAME).join("config.json");
        if calcbot_dir_config.is_file() {
            return Ok(Some(self.load_file(&calcbot_dir_config).await?));
        }

        Ok(None)
    }

    /// Try loading from git repository root
    async fn try_load_git_root(&self, start: &Path) -> Result<Option<RawConfig>> {
        if let Some(git_root) = find_git_root(start) {
            let config_path = git_root.join(CONFIG_DIR_NAME).join("config.json");
            if config_path.is_file() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }
        Ok(None)
    }

    /// Try loading from the user config directory
    async fn try_load_config_home(&self) -> Result<Option<RawConfig>> {
        if let Some(config_dir) = self.config_home_dir() {
            let config_path = config_dir.join("calcbot").join("config.json");
            if config_path.is_file() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }
        Ok(None)
    }

    fn config_home_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.config_home {
            return Some(dir.clone());
        }
        self.env_var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
    }

    /// Try loading from environment variables only
    fn try_load_env_only(&self) -> Result<RawConfig> {
        let available: Vec<(&str, String)> = PROTOCOL_KEYS
            .iter()
            .filter_map(|(protocol, vars)| {
                vars.iter()
                    .find_map(|var| self.env_var(var))
                    .map(|key| (*protocol, key))
            })
            .collect();
        let available_names: Vec<&str> = available.iter().map(|(name, _)| *name).collect();

        let env_protocol = self.env_var("CALCBOT_PROTOCOL");
        let protocol_preference = self.protocol_override.clone().or(env_protocol);

        let (protocol, api_key) = if let Some(preferred) = protocol_preference {
            let preferred = parse_protocol(&preferred);
            if preferred == Protocol::Offline {
                return Ok(RawConfig::offline());
            }
            match available
                .iter()
                .find(|(name, _)| *name == preferred.as_str())
            {
                Some((name, key)) => (name.to_string(), key.clone()),
                None => {
                    return Err(anyhow!(
                        "Protocol '{}' specified but no corresponding API key found. Available keys: {}",
                        preferred,
                        available_names.join(", ")
                    ))
                }
            }
        } else {
            match available.as_slice() {
                [] => {
                    tracing::warn!(
                        "No planner configuration found, using the offline rule-based planner"
                    );
                    return Ok(RawConfig::offline());
                }
                [(name, key)] => (name.to_string(), key.clone()),
                _ => {
                    return Err(anyhow!(
                        "Multiple API keys detected: {}. Please specify which protocol to use with CALCBOT_PROTOCOL or --protocol",
                        available_names.join(", ")
                    ))
                }
            }
        };

        let prefix = match protocol.as_str() {
            "google_ai" => "GOOGLE",
            "openai" => "OPENAI",
            "anthropic" => "ANTHROPIC",
            _ => "AZURE_OPENAI",
        };

        // Priority: protocol-specific env > generic env > protocol default
        let base_url = self
            .env_var(&format!("{prefix}_BASE_URL"))
            .or_else(|| self.env_var("CALCBOT_BASE_URL"));
        let model = self
            .env_var(&format!("{prefix}_MODEL"))
            .or_else(|| self.env_var("CALCBOT_MODEL"))
            .unwrap_or_default();

        tracing::info!("Using {} planner from environment", protocol);
        Ok(RawConfig {
            protocol,
            api_key,
            base_url,
            model,
            params: ModelParams::default(),
            headers: HashMap::new(),
        })
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            // Try config.json in the directory
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        tracing::debug!("Loading config file {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Resolve raw config to ResolvedLlmConfig
    fn resolve_config(&self, config: RawConfig) -> Result<ResolvedLlmConfig> {
        let protocol = parse_protocol(&config.protocol);

        // Resolve API key (handle env: prefix)
        let api_key = match config.api_key.strip_prefix("env:") {
            Some(var_name) => self
                .env_var(var_name)
                .ok_or_else(|| anyhow!("Environment variable not found: {}", var_name))?,
            None => config.api_key,
        };

        let base_url = config
            .base_url
            .or_else(|| protocol.default_base_url().map(str::to_string))
            .unwrap_or_default();

        let model = if config.model.is_empty() {
            protocol.default_model().to_string()
        } else {
            config.model
        };

        let resolved = ResolvedLlmConfig::new(protocol, base_url, api_key, model)
            .with_params(config.params)
            .with_headers(config.headers);

        resolved
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        tracing::info!(
            protocol = resolved.protocol.as_str(),
            model = %resolved.model,
            "Resolved planner configuration"
        );
        Ok(resolved)
    }
}

fn parse_protocol(name: &str) -> Protocol {
    match name.parse::<Protocol>() {
        Ok(protocol) => protocol,
        Err(never) => match never {},
    }
}

/// Expand `~` and environment variables in a user-supplied path
fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand config path: {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Find the enclosing git repository root
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}
