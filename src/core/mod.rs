pub mod backend;
pub mod client;
pub mod entities;

pub use crate::domain::model::{EntityName, ExtractionResult, ListQuery, Record, UploadedFile};
pub use crate::domain::ports::{ConfigProvider, EntityStore, Integrations, Storage};
pub use crate::utils::error::Result;
