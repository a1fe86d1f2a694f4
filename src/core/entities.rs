use crate::core::EntityStore;
use crate::domain::model::{EntityName, ListQuery, Record};
use crate::utils::error::Result;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Handle to one named collection. All calls go straight to the store.
pub struct EntityCollection<B: EntityStore> {
    name: EntityName,
    store: Arc<B>,
}

impl<B: EntityStore + fmt::Debug> fmt::Debug for EntityCollection<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCollection")
            .field("name", &self.name)
            .field("store", &self.store)
            .finish()
    }
}

impl<B: EntityStore> Clone for EntityCollection<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<B: EntityStore + 'static> EntityCollection<B> {
    pub fn new(name: EntityName, store: Arc<B>) -> Self {
        Self { name, store }
    }

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Record>> {
        let records = self.store.list(&self.name, query).await?;
        tracing::debug!("Listed {} {} records", records.len(), self.name);
        Ok(records)
    }

    pub async fn filter(&self, conditions: &Value, query: &ListQuery) -> Result<Vec<Record>> {
        let records = self.store.filter(&self.name, conditions, query).await?;
        tracing::debug!("Filter on {} matched {} records", self.name, records.len());
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<Record> {
        self.store.get(&self.name, id).await
    }

    pub async fn create(&self, record: &Value) -> Result<Record> {
        self.store.create(&self.name, record).await
    }

    pub async fn update(&self, id: &str, patch: &Value) -> Result<Record> {
        self.store.update(&self.name, id, patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<Value> {
        self.store.delete(&self.name, id).await
    }

    /// Issues one `create` per record concurrently. Results arrive in
    /// completion order. The first failure observed is returned; creates
    /// already issued keep running to completion and their results are dropped.
    pub async fn bulk_create(&self, records: Vec<Value>) -> Result<Vec<Record>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let total = records.len();
        tracing::info!("Creating {} {} records in parallel", total, self.name);

        let mut tasks = JoinSet::new();
        for record in records {
            let store = Arc::clone(&self.store);
            let name = self.name.clone();
            tasks.spawn(async move { store.create(&name, &record).await });
        }

        let mut created = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    if join_error.is_panic() {
                        std::panic::resume_unwind(join_error.into_panic());
                    }
                    continue;
                }
            };

            match outcome {
                Ok(record) => created.push(record),
                Err(e) => {
                    tracing::error!(
                        "Bulk create on {} failed after {}/{} records: {}",
                        self.name,
                        created.len(),
                        total,
                        e
                    );
                    tasks.detach_all();
                    return Err(e);
                }
            }
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EntityError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MockStore {
        rows: Mutex<HashMap<String, Vec<Record>>>,
        create_calls: AtomicUsize,
        reject_name: Option<String>,
        slow_name: Option<String>,
    }

    impl MockStore {
        fn rejecting(name: &str) -> Self {
            Self {
                reject_name: Some(name.to_string()),
                ..Self::default()
            }
        }

        fn with_slow(mut self, name: &str) -> Self {
            self.slow_name = Some(name.to_string());
            self
        }
    }

    #[async_trait]
    impl EntityStore for MockStore {
        async fn list(&self, entity: &EntityName, query: &ListQuery) -> Result<Vec<Record>> {
            let rows = self.rows.lock().await;
            let mut records = rows.get(entity.as_str()).cloned().unwrap_or_default();
            if let Some(limit) = query.limit {
                records.truncate(limit);
            }
            Ok(records)
        }

        async fn filter(
            &self,
            entity: &EntityName,
            conditions: &Value,
            _query: &ListQuery,
        ) -> Result<Vec<Record>> {
            let rows = self.rows.lock().await;
            let wanted = conditions.as_object().cloned().unwrap_or_default();
            Ok(rows
                .get(entity.as_str())
                .map(|records| {
                    records
                        .iter()
                        .filter(|r| wanted.iter().all(|(k, v)| r.get(k) == Some(v)))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn get(&self, entity: &EntityName, id: &str) -> Result<Record> {
            let rows = self.rows.lock().await;
            rows.get(entity.as_str())
                .and_then(|records| records.iter().find(|r| r.id() == Some(id)).cloned())
                .ok_or_else(|| EntityError::api(404, "not found"))
        }

        async fn create(&self, entity: &EntityName, record: &Value) -> Result<Record> {
            let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(reject) = &self.reject_name {
                if record.get("name").and_then(Value::as_str) == Some(reject.as_str()) {
                    return Err(EntityError::api(422, "rejected"));
                }
            }
            if let Some(slow) = &self.slow_name {
                if record.get("name").and_then(Value::as_str) == Some(slow.as_str()) {
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                }
            }
            let mut created = Record::try_from(record.clone())?;
            created
                .data
                .insert("id".to_string(), Value::String(format!("id-{}", n)));
            let mut rows = self.rows.lock().await;
            rows.entry(entity.as_str().to_string())
                .or_default()
                .push(created.clone());
            Ok(created)
        }

        async fn update(&self, entity: &EntityName, id: &str, patch: &Value) -> Result<Record> {
            let mut rows = self.rows.lock().await;
            let record = rows
                .get_mut(entity.as_str())
                .and_then(|records| records.iter_mut().find(|r| r.id() == Some(id)))
                .ok_or_else(|| EntityError::api(404, "not found"))?;
            if let Some(fields) = patch.as_object() {
                for (k, v) in fields {
                    record.data.insert(k.clone(), v.clone());
                }
            }
            Ok(record.clone())
        }

        async fn delete(&self, entity: &EntityName, id: &str) -> Result<Value> {
            let mut rows = self.rows.lock().await;
            if let Some(records) = rows.get_mut(entity.as_str()) {
                records.retain(|r| r.id() != Some(id));
            }
            Ok(Value::Null)
        }
    }

    fn collection(store: MockStore) -> EntityCollection<MockStore> {
        EntityCollection::new(EntityName::new("Product").unwrap(), Arc::new(store))
    }

    #[tokio::test]
    async fn test_crud_forwards_to_store() {
        let products = collection(MockStore::default());

        let created = products
            .create(&json!({"name": "Widget", "price": 5}))
            .await
            .unwrap();
        let id = created.id().unwrap().to_string();

        let updated = products.update(&id, &json!({"price": 7})).await.unwrap();
        assert_eq!(updated.get("price"), Some(&json!(7)));
        assert_eq!(updated.get("name"), Some(&json!("Widget")));

        let fetched = products.get(&id).await.unwrap();
        assert_eq!(fetched, updated);

        products.delete(&id).await.unwrap();
        assert!(products.list(&ListQuery::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_forwards_conditions() {
        let products = collection(MockStore::default());
        products
            .bulk_create(vec![
                json!({"name": "A", "category": "tools"}),
                json!({"name": "B", "category": "food"}),
                json!({"name": "C", "category": "tools"}),
            ])
            .await
            .unwrap();

        let tools = products
            .filter(&json!({"category": "tools"}), &ListQuery::new())
            .await
            .unwrap();
        assert_eq!(tools.len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_create_returns_every_record() {
        let products = collection(MockStore::default());
        let input: Vec<Value> = (1..=10).map(|i| json!({"name": format!("P{}", i)})).collect();

        let created = products.bulk_create(input).await.unwrap();

        assert_eq!(created.len(), 10);
        let mut names: Vec<&str> = created
            .iter()
            .filter_map(|r| r.get("name").and_then(Value::as_str))
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[tokio::test]
    async fn test_bulk_create_empty_input_makes_no_calls() {
        let store = Arc::new(MockStore::default());
        let products = EntityCollection::new(EntityName::new("Product").unwrap(), store.clone());

        let created = products.bulk_create(Vec::new()).await.unwrap();

        assert!(created.is_empty());
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bulk_create_propagates_first_failure() {
        let products = collection(MockStore::rejecting("bad"));
        let input = vec![
            json!({"name": "good-1"}),
            json!({"name": "bad"}),
            json!({"name": "good-2"}),
        ];

        let err = products.bulk_create(input).await.unwrap_err();

        assert_eq!(err.status(), Some(422));
    }

    #[tokio::test]
    async fn test_bulk_create_failure_lets_issued_creates_finish() {
        let store = Arc::new(MockStore::rejecting("bad").with_slow("slow"));
        let products = EntityCollection::new(EntityName::new("Product").unwrap(), store.clone());

        let err = products
            .bulk_create(vec![json!({"name": "bad"}), json!({"name": "slow"})])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(422));

        tokio::time::sleep(std::time::Duration::from_millis(400)).await;

        let stored = products.list(&ListQuery::new()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].get("name"), Some(&json!("slow")));
    }
}
