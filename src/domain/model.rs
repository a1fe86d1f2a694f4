use crate::utils::error::{EntityError, Result};
use crate::utils::validation::validate_path_segment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A record exactly as the remote service returns it, keys in response order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Record {
    pub fn id(&self) -> Option<&str> {
        self.data.get("id").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl TryFrom<Value> for Record {
    type Error = EntityError;

    fn try_from(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityName(String);

impl EntityName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_path_segment("entity", &name).map_err(|e| EntityError::InvalidEntityName {
            reason: match e {
                EntityError::InvalidConfigValueError { reason, .. } => reason,
                other => other.to_string(),
            },
            name: name.clone(),
        })?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityName {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// `-created_date` sorts descending, `created_date` ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub descending: bool,
}

impl SortOrder {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}

impl FromStr for SortOrder {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self> {
        let (field, descending) = match s.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (s.strip_prefix('+').unwrap_or(s), false),
        };
        if field.trim().is_empty() {
            return Err(EntityError::InvalidConfigValueError {
                field: "sort".to_string(),
                value: s.to_string(),
                reason: "Sort field cannot be empty".to_string(),
            });
        }
        Ok(Self {
            field: field.to_string(),
            descending,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub sort: Option<SortOrder>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub status: String,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub details: Option<String>,
}

impl ExtractionResult {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_passes_fields_through() {
        let value = json!({"id": "p1", "name": "Widget", "tags": ["a", "b"]});
        let record = Record::try_from(value.clone()).unwrap();

        assert_eq!(record.id(), Some("p1"));
        assert_eq!(record.get("tags"), Some(&json!(["a", "b"])));
        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }

    #[test]
    fn test_record_keeps_response_key_order() {
        let body = r#"{"zeta":1,"id":"p1","alpha":{"y":2,"b":3},"mid":null}"#;
        let record: Record = serde_json::from_str(body).unwrap();

        let keys: Vec<&str> = record.data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "id", "alpha", "mid"]);
        assert_eq!(serde_json::to_string(&record).unwrap(), body);
    }

    #[test]
    fn test_record_rejects_non_object() {
        assert!(Record::try_from(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_entity_name_rejects_url_breaking_characters() {
        assert!(EntityName::new("Product").is_ok());
        assert!(matches!(
            EntityName::new("Product/../Sale"),
            Err(EntityError::InvalidEntityName { .. })
        ));
        assert!(EntityName::new("").is_err());
        assert!(EntityName::new("Sale Item").is_err());
    }

    #[test]
    fn test_sort_order_parsing() {
        let desc: SortOrder = "-created_date".parse().unwrap();
        assert_eq!(desc, SortOrder::descending("created_date"));
        assert_eq!(desc.to_string(), "-created_date");

        let asc: SortOrder = "name".parse().unwrap();
        assert_eq!(asc, SortOrder::ascending("name"));
        assert_eq!(asc.to_string(), "name");

        assert!("-".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_list_query_pairs() {
        assert!(ListQuery::new().to_query_pairs().is_empty());

        let query = ListQuery::new()
            .sort(SortOrder::descending("created_date"))
            .limit(50);
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("sort", "-created_date".to_string()),
                ("limit", "50".to_string())
            ]
        );
    }

    #[test]
    fn test_extraction_result_status() {
        let result: ExtractionResult =
            serde_json::from_value(json!({"status": "success", "output": {"total": 3}})).unwrap();
        assert!(result.is_success());
        assert_eq!(result.details, None);

        let failed: ExtractionResult =
            serde_json::from_value(json!({"status": "error", "details": "unreadable"})).unwrap();
        assert!(!failed.is_success());
        assert_eq!(failed.output, None);
    }
}
