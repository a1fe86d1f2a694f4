use crate::domain::model::Record;
use crate::utils::error::{EntityError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(EntityError::InvalidConfigValueError {
                field: "format".to_string(),
                value: other.to_string(),
                reason: "Valid formats: json, csv".to_string(),
            }),
        }
    }
}

/// Renders a single response body. CSV only applies to arrays of objects;
/// anything else falls back to JSON.
pub fn render_value(value: &Value, format: OutputFormat) -> Result<String> {
    match (format, value) {
        (OutputFormat::Csv, Value::Array(items)) => {
            let records = items
                .iter()
                .map(|item| serde_json::from_value::<Record>(item.clone()))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            render_csv(&records)
        }
        _ => Ok(serde_json::to_string_pretty(value)?),
    }
}

pub fn render_records(records: &[Record], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Csv => render_csv(records),
    }
}

fn render_csv(records: &[Record]) -> Result<String> {
    let columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.data.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    if columns.is_empty() {
        return Ok(String::new());
    }
    writer.write_record(&columns)?;

    for record in records {
        let row = columns.iter().map(|column| match record.data.get(*column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        });
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EntityError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        EntityError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}
