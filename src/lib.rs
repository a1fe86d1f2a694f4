//! Thin client for a hosted backend that stores named entity collections
//! and offers file upload and data extraction integrations.
//!
//! ```no_run
//! use entity_client::{BackendSettings, EntityClient, ListQuery, SortOrder};
//!
//! # async fn run() -> entity_client::Result<()> {
//! let settings = BackendSettings::new("https://backend.example.com", "my-app")
//!     .with_api_key("secret");
//! let client = EntityClient::new(&settings)?;
//!
//! let recent = client
//!     .entity("Product")?
//!     .list(&ListQuery::new().sort(SortOrder::descending("created_date")).limit(20))
//!     .await?;
//! println!("{} products", recent.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, Command, ResolvedConfig};

pub use crate::config::{local_storage::LocalStorage, toml_config::TomlConfig, BackendSettings};
pub use crate::core::{backend::HttpBackend, client::EntityClient, entities::EntityCollection};
pub use crate::domain::model::{
    EntityName, ExtractionResult, ListQuery, Record, SortOrder, UploadedFile,
};
pub use crate::utils::error::{EntityError, Result};
pub use crate::utils::output::OutputFormat;
