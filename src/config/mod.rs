pub mod local_storage;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path_segment, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(feature = "cli")]
use crate::domain::model::SortOrder;
#[cfg(feature = "cli")]
use crate::utils::output::OutputFormat;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const MAX_TIMEOUT_SECONDS: u64 = 600;

/// Fully resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    pub base_url: String,
    pub app_id: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub timeout_seconds: u64,
}

impl BackendSettings {
    pub fn new(base_url: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            app_id: app_id.into(),
            api_key: None,
            access_token: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}

impl ConfigProvider for BackendSettings {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn app_id(&self) -> &str {
        &self.app_id
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Validate for BackendSettings {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_path_segment("app_id", &self.app_id)?;
        validate_range(
            "timeout_seconds",
            self.timeout_seconds,
            1,
            MAX_TIMEOUT_SECONDS,
        )?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "entity-client")]
#[command(about = "Command-line access to a hosted entity storage backend")]
pub struct CliConfig {
    #[arg(long, global = true, env = "ENTITY_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, global = true, env = "ENTITY_APP_ID")]
    pub app_id: Option<String>,

    #[arg(long, global = true, env = "ENTITY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true, env = "ENTITY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, global = true)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, short = 'c', global = true, help = "TOML file with a [backend] table")]
    pub config: Option<String>,

    #[arg(long, global = true, help = "json or csv")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'o', global = true, help = "Write output to a file instead of stdout")]
    pub output: Option<String>,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// JSON arguments accept inline JSON or `@path/to/file.json`.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List records of a collection
    List {
        entity: String,
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<SortOrder>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List records matching a JSON condition object
    Filter {
        entity: String,
        query: String,
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<SortOrder>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Fetch one record by id
    Get { entity: String, id: String },
    /// Create a record from a JSON object
    Create { entity: String, data: String },
    /// Update a record with a JSON patch object
    Update {
        entity: String,
        id: String,
        data: String,
    },
    /// Delete a record by id
    Delete { entity: String, id: String },
    /// Create every object of a JSON array in parallel
    BulkCreate { entity: String, data: String },
    /// Upload a local file
    Upload { path: String },
    /// Extract structured data from an uploaded file
    Extract {
        file_url: String,
        #[arg(long)]
        schema: String,
    },
}

/// What one CLI run needs, resolved from flags, env and the TOML file.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub settings: BackendSettings,
    pub format: OutputFormat,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Reads the `--config` file (if any) once and resolves everything from it.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let file = match &self.config {
            Some(path) => Some(toml_config::TomlConfig::from_file(path)?),
            None => None,
        };
        self.resolve_with(file.as_ref())
    }

    /// Flags override the TOML file; the TOML file fills the gaps.
    pub fn resolve_with(&self, file: Option<&toml_config::TomlConfig>) -> Result<ResolvedConfig> {
        if let Some(output) = &self.output {
            crate::utils::validation::validate_path("output", output)?;
        }

        let backend = file.map(|f| f.backend.clone()).unwrap_or_default();
        let merged = toml_config::BackendSection {
            base_url: self.base_url.clone().or(backend.base_url),
            app_id: self.app_id.clone().or(backend.app_id),
            api_key: self.api_key.clone().or(backend.api_key),
            access_token: self.access_token.clone().or(backend.access_token),
            timeout_seconds: self.timeout_seconds.or(backend.timeout_seconds),
        };

        let settings = merged.into_settings()?;
        settings.validate()?;

        let format = self
            .format
            .or_else(|| file.map(|f| f.output_format()))
            .unwrap_or_default();

        Ok(ResolvedConfig { settings, format })
    }
}
