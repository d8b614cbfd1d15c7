use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::entity::{EntityRecord, EntityStatus};
use crate::error::PortalError;
use crate::latency::SimulatedLatency;

/// Keys the service owns; a draft or patch cannot overwrite them.
const PROTECTED_FIELDS: [&str; 3] = ["id", "ownerId", "createdAt"];

/// Backing collection for one entity type. A real backend client implements
/// this seam; callers only ever talk to [`EntityService`].
#[async_trait]
pub trait EntityStore<T: EntityRecord>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>, PortalError>;

    async fn get(&self, id: &str) -> Result<Option<T>, PortalError>;

    async fn insert(&self, record: T) -> Result<T, PortalError>;

    async fn replace(&self, record: T) -> Result<T, PortalError>;

    /// Returns whether a record was removed.
    async fn remove(&self, id: &str) -> Result<bool, PortalError>;
}

pub fn memory<T: EntityRecord>(records: Vec<T>) -> Arc<dyn EntityStore<T>> {
    Arc::new(MemoryEntityStore::new(records))
}

/// Insertion-ordered in-process collection.
pub struct MemoryEntityStore<T> {
    inner: Mutex<MemoryCollection<T>>,
}

struct MemoryCollection<T> {
    records: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: EntityRecord> MemoryCollection<T> {
    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.id().to_string(), position))
            .collect();
    }
}

impl<T: EntityRecord> MemoryEntityStore<T> {
    pub fn new(records: Vec<T>) -> Self {
        let mut collection = MemoryCollection {
            records,
            index: HashMap::new(),
        };
        collection.reindex();
        Self {
            inner: Mutex::new(collection),
        }
    }
}

#[async_trait]
impl<T: EntityRecord> EntityStore<T> for MemoryEntityStore<T> {
    async fn list(&self) -> Result<Vec<T>, PortalError> {
        Ok(self.inner.lock().await.records.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<T>, PortalError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .index
            .get(id)
            .and_then(|position| inner.records.get(*position))
            .cloned())
    }

    async fn insert(&self, record: T) -> Result<T, PortalError> {
        let mut inner = self.inner.lock().await;
        if inner.index.contains_key(record.id()) {
            return Err(PortalError::Conflict(format!(
                "{} {} already exists",
                T::SCHEMA.kind.as_str(),
                record.id()
            )));
        }
        let position = inner.records.len();
        inner.index.insert(record.id().to_string(), position);
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn replace(&self, record: T) -> Result<T, PortalError> {
        let mut inner = self.inner.lock().await;
        let Some(position) = inner.index.get(record.id()).copied() else {
            return Err(PortalError::NotFound(format!(
                "{} {}",
                T::SCHEMA.kind.as_str(),
                record.id()
            )));
        };
        inner.records[position] = record.clone();
        Ok(record)
    }

    async fn remove(&self, id: &str) -> Result<bool, PortalError> {
        let mut inner = self.inner.lock().await;
        let Some(position) = inner.index.get(id).copied() else {
            return Ok(false);
        };
        inner.records.remove(position);
        inner.reindex();
        Ok(true)
    }
}

/// Uniform CRUD facade over one entity collection. Every call suspends for
/// the configured latency before touching the store.
pub struct EntityService<T: EntityRecord> {
    store: Arc<dyn EntityStore<T>>,
    clock: Arc<dyn Clock>,
    latency: SimulatedLatency,
}

impl<T: EntityRecord> Clone for EntityService<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            latency: self.latency,
        }
    }
}

impl<T: EntityRecord> EntityService<T> {
    pub fn new(
        store: Arc<dyn EntityStore<T>>,
        clock: Arc<dyn Clock>,
        latency: SimulatedLatency,
    ) -> Self {
        Self {
            store,
            clock,
            latency,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Full snapshot. Scoping is the caller's job.
    pub async fn list_all(&self) -> Result<Vec<T>, PortalError> {
        self.latency.pause().await;
        self.store.list().await
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<T>, PortalError> {
        self.latency.pause().await;
        let records = self.store.list().await?;
        Ok(records
            .into_iter()
            .filter(|record| record.owner_id() == owner_id)
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<T>, PortalError> {
        self.latency.pause().await;
        self.store.get(id).await
    }

    /// Stores a new record owned by `owner_id`. Missing fields take the
    /// entity's service defaults; an `id` or `createdAt` in the draft is kept.
    pub async fn create(&self, owner_id: &str, draft: Map<String, Value>) -> Result<T, PortalError> {
        self.latency.pause().await;
        let now = self.clock.now();

        let mut fields = T::service_defaults(now);
        for (key, value) in draft {
            if !value.is_null() {
                fields.insert(key, value);
            }
        }

        let id = match fields.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
            _ => generate_id(T::SCHEMA.id_prefix),
        };
        fields.insert("id".to_string(), Value::String(id));
        fields.insert("ownerId".to_string(), Value::String(owner_id.to_string()));
        fields
            .entry("createdAt".to_string())
            .or_insert_with(|| timestamp(now));
        fields.insert("updatedAt".to_string(), timestamp(now));

        let record = decode::<T>(fields)?;
        let stored = self.store.insert(record).await?;
        tracing::debug!(
            target: "medtracker.service",
            kind = T::SCHEMA.kind.as_str(),
            id = stored.id(),
            owner_id,
            "created record",
        );
        Ok(stored)
    }

    /// Merges `patch` into the stored record and refreshes `updatedAt`. Null
    /// values leave the stored field alone, as in `create`.
    pub async fn update(&self, id: &str, patch: Map<String, Value>) -> Result<T, PortalError> {
        self.latency.pause().await;
        let Some(existing) = self.store.get(id).await? else {
            return Err(PortalError::NotFound(format!(
                "{} {id}",
                T::SCHEMA.kind.as_str()
            )));
        };

        let mut fields = encode(&existing)?;
        for (key, value) in patch {
            if value.is_null() || PROTECTED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            fields.insert(key, value);
        }
        fields.insert("updatedAt".to_string(), timestamp(self.clock.now()));

        let merged = self.store.replace(decode::<T>(fields)?).await?;
        tracing::debug!(
            target: "medtracker.service",
            kind = T::SCHEMA.kind.as_str(),
            id,
            "updated record",
        );
        Ok(merged)
    }

    /// Removing an unknown id succeeds without effect.
    pub async fn delete(&self, id: &str) -> Result<(), PortalError> {
        self.latency.pause().await;
        let removed = self.store.remove(id).await?;
        tracing::debug!(
            target: "medtracker.service",
            kind = T::SCHEMA.kind.as_str(),
            id,
            removed,
            "delete call completed",
        );
        Ok(())
    }
}

fn generate_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::now_v7().simple())
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339())
}

fn encode<T: EntityRecord>(record: &T) -> Result<Map<String, Value>, PortalError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(PortalError::Transport(format!(
            "{} did not encode as an object",
            T::SCHEMA.kind.as_str()
        ))),
        Err(error) => Err(PortalError::Transport(error.to_string())),
    }
}

fn decode<T: EntityRecord>(fields: Map<String, Value>) -> Result<T, PortalError> {
    let status_field = T::SCHEMA.status_field;
    let unknown_status = fields
        .get(status_field)
        .and_then(Value::as_str)
        .filter(|raw| <T::Status as EntityStatus>::parse(raw).is_none());
    if let Some(raw) = unknown_status {
        return Err(PortalError::invalid_field(
            status_field,
            format!("unknown {} status `{raw}`", T::SCHEMA.kind.as_str()),
        ));
    }
    serde_json::from_value(Value::Object(fields))
        .map_err(|error| PortalError::invalid_field(T::SCHEMA.kind.as_str(), error.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::clock::FixedClock;
    use crate::entity::{Declaration, MedicalRecord, MedicalRecordStatus};

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn service<T: EntityRecord>() -> (EntityService<T>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap(),
        ));
        (
            EntityService::new(memory(Vec::new()), clock.clone(), SimulatedLatency::none()),
            clock,
        )
    }

    #[tokio::test]
    async fn create_assigns_id_and_keeps_draft_fields() {
        let (records, _) = service::<MedicalRecord>();
        let created = records
            .create(
                "user-3",
                fields(json!({
                    "title": "Annual Checkup",
                    "date": "2025-01-10",
                    "doctor": "Dr. Smith",
                    "status": "completed",
                })),
            )
            .await
            .expect("create");

        assert!(created.id.starts_with("rec-"));
        assert_eq!(created.title, "Annual Checkup");
        assert_eq!(created.date, "2025-01-10");
        assert_eq!(created.doctor, "Dr. Smith");
        assert_eq!(created.status, MedicalRecordStatus::Completed);
        assert!(created.record_id.starts_with("REC-"));
        assert_eq!(created.created_at, created.updated_at);

        let owned = records.list_by_owner("user-3").await.expect("list");
        assert_eq!(owned, vec![created]);
        assert!(records.list_by_owner("user-4").await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn create_fills_defaults_and_ignores_draft_owner() {
        let (records, _) = service::<MedicalRecord>();
        let created = records
            .create("user-3", fields(json!({ "title": "X", "ownerId": "user-9" })))
            .await
            .expect("create");
        assert_eq!(created.owner_id, "user-3");
        assert_eq!(created.status, MedicalRecordStatus::Pending);
        assert_eq!(created.date, "2025-01-10");
    }

    #[tokio::test]
    async fn create_rejects_unknown_status() {
        let (declarations, _) = service::<Declaration>();
        let error = declarations
            .create("user-3", fields(json!({ "statut": "Archivé" })))
            .await
            .expect_err("invalid status");
        assert_eq!(error.code(), "validation_failed");
        assert!(matches!(
            &error,
            PortalError::Validation { fields, .. } if fields == &["statut".to_string()]
        ));
        assert!(declarations.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn create_with_taken_id_conflicts() {
        let (records, _) = service::<MedicalRecord>();
        records
            .create("user-3", fields(json!({ "id": "rec-1", "title": "A" })))
            .await
            .expect("first");
        let error = records
            .create("user-3", fields(json!({ "id": "rec-1", "title": "B" })))
            .await
            .expect_err("duplicate id");
        assert!(matches!(error, PortalError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_merges_and_refreshes_timestamp() {
        let (records, clock) = service::<MedicalRecord>();
        let created = records
            .create("user-3", fields(json!({ "title": "A", "doctor": "Dr. Leroy" })))
            .await
            .expect("create");

        clock.advance(chrono::Duration::minutes(5));
        let updated = records
            .update(
                &created.id,
                fields(json!({ "status": "Scheduled", "id": "rec-other", "ownerId": "user-9" })),
            )
            .await
            .expect("update");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.owner_id, "user-3");
        assert_eq!(updated.doctor, "Dr. Leroy");
        assert_eq!(updated.status, MedicalRecordStatus::Scheduled);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(
            records.get_by_id(&created.id).await.expect("get"),
            Some(updated)
        );
    }

    #[tokio::test]
    async fn update_ignores_null_patch_values_like_create() {
        let (records, _) = service::<MedicalRecord>();
        let created = records
            .create(
                "user-3",
                fields(json!({ "title": "A", "doctor": "Dr. Leroy", "status": null })),
            )
            .await
            .expect("create");

        let updated = records
            .update(
                &created.id,
                fields(json!({ "doctor": null, "status": null, "title": "B" })),
            )
            .await
            .expect("nulls are skipped");
        assert_eq!(updated.title, "B");
        assert_eq!(updated.doctor, "Dr. Leroy");
        assert_eq!(updated.status, created.status);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let (records, _) = service::<MedicalRecord>();
        let error = records
            .update("rec-missing", Map::new())
            .await
            .expect_err("missing");
        assert!(matches!(error, PortalError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_a_no_op_for_unknown_ids() {
        let (records, _) = service::<MedicalRecord>();
        let kept = records
            .create("user-3", fields(json!({ "title": "A" })))
            .await
            .expect("create");
        let gone = records
            .create("user-3", fields(json!({ "title": "B" })))
            .await
            .expect("create");

        records.delete("rec-missing").await.expect("no-op delete");
        assert_eq!(records.list_all().await.expect("list").len(), 2);

        records.delete(&gone.id).await.expect("delete");
        assert_eq!(records.list_all().await.expect("list"), vec![kept]);
        assert_eq!(records.get_by_id(&gone.id).await.expect("get"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn every_call_waits_for_the_simulated_latency() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let records: EntityService<MedicalRecord> = EntityService::new(
            memory(Vec::new()),
            clock,
            SimulatedLatency::new(std::time::Duration::from_millis(500)),
        );
        let started = tokio::time::Instant::now();
        records.list_all().await.expect("list");
        records.get_by_id("rec-1").await.expect("get");
        assert!(started.elapsed() >= std::time::Duration::from_millis(1000));
    }
}
