//! Record service coordinating the store, the external adapters, and metrics.

use crate::{
    keys::{Namespace, next_sequence},
    metrics::{MetricsSnapshot, RecordMetrics},
    naming::NameGenerator,
    quiz::QuizGenerator,
    records::types::{CreatedRecord, FIELD_TIMESTAMP, RecordError, now_timestamp},
    store::{HashFields, RecordStore},
    vector::VectorIndex,
};
use std::sync::Arc;
use std::time::Duration;

/// How many times and how often a record is looked up by content after an ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatePolicy {
    /// Number of scans before giving up.
    pub attempts: u32,
    /// Pause between scans.
    pub delay: Duration,
}

impl Default for LocatePolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

/// Owns the long-lived handles used by every record manager.
///
/// Construct once at startup and share it through an `Arc`; the HTTP surface and the
/// maintenance CLI drive the same instance type.
pub struct RecordService {
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) namer: Arc<dyn NameGenerator>,
    pub(crate) vectors: Arc<dyn VectorIndex>,
    pub(crate) quizzes: Arc<dyn QuizGenerator>,
    pub(crate) metrics: Arc<RecordMetrics>,
    pub(crate) locate: LocatePolicy,
}

impl RecordService {
    /// Assemble a service from its collaborators.
    pub fn new(
        store: Arc<dyn RecordStore>,
        namer: Arc<dyn NameGenerator>,
        vectors: Arc<dyn VectorIndex>,
        quizzes: Arc<dyn QuizGenerator>,
    ) -> Self {
        Self {
            store,
            namer,
            vectors,
            quizzes,
            metrics: Arc::new(RecordMetrics::new()),
            locate: LocatePolicy::default(),
        }
    }

    /// Override the content lookup policy used by ingests.
    pub fn with_locate_policy(mut self, policy: LocatePolicy) -> Self {
        self.locate = policy;
        self
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Create a record under the next free sequence of `namespace`.
    ///
    /// The sequence is `max(existing) + 1`. Two concurrent creates in the same namespace can
    /// compute the same sequence; the later write wins.
    pub(crate) async fn create_record(
        &self,
        namespace: Namespace,
        mut fields: Vec<(&'static str, Vec<u8>)>,
    ) -> Result<CreatedRecord, RecordError> {
        let existing = self.store.scan_keys(&namespace.pattern()).await?;
        tracing::debug!(%namespace, existing = existing.len(), "Computing next sequence");
        let sequence = next_sequence(namespace, existing.iter().map(String::as_str));
        let key = namespace.key(sequence).to_string();

        fields.push((FIELD_TIMESTAMP, now_timestamp().to_string().into_bytes()));
        self.store.write_hash(&key, &fields).await?;
        self.metrics.record_created();
        tracing::info!(key, %namespace, "Record created");

        Ok(CreatedRecord {
            key,
            index: sequence,
        })
    }

    /// Load every non-empty hash of `namespace`.
    pub(crate) async fn load_namespace(
        &self,
        namespace: Namespace,
    ) -> Result<Vec<(String, HashFields)>, RecordError> {
        let keys = self.store.scan_keys(&namespace.pattern()).await?;
        tracing::info!(%namespace, count = keys.len(), "Loading records");
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let fields = self.store.read_hash(&key).await?;
            if fields.is_empty() {
                tracing::warn!(key, "Skipping empty hash");
                continue;
            }
            records.push((key, fields));
        }
        Ok(records)
    }

    /// Delete a record addressed by a full key or a bare sequence.
    ///
    /// Namespaces with a legacy prefix also try `<legacy>:<sequence>` before reporting
    /// not-found. Keys belonging to another namespace are rejected before the store is touched.
    /// Returns the key that was removed.
    pub async fn delete_record(
        &self,
        namespace: Namespace,
        identifier: &str,
    ) -> Result<String, RecordError> {
        if identifier.trim().is_empty() {
            return Err(RecordError::Validation("'key' must not be empty".into()));
        }
        let key = namespace.normalize(identifier)?;

        if self.store.exists(&key).await? {
            return self.remove(key).await;
        }

        if let Some(legacy) = namespace.legacy_prefix() {
            let suffix = key.rsplit(':').next().unwrap_or_default();
            let legacy_key = format!("{legacy}:{suffix}");
            if self.store.exists(&legacy_key).await? {
                tracing::info!(key, legacy_key, "Deleting record under legacy key");
                return self.remove(legacy_key).await;
            }
        }

        tracing::warn!(key, "Record not found for deletion");
        Err(RecordError::NotFound(format!("Record not found: {}", identifier.trim())))
    }

    async fn remove(&self, key: String) -> Result<String, RecordError> {
        self.store.delete(&key).await?;
        self.metrics.record_deleted();
        tracing::info!(key, "Record deleted");
        Ok(key)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn create_assigns_next_sequence_after_gaps() {
        let store = Arc::new(MemoryStore::new());
        store.seed("assignments:2", &[("xml", b"<a/>")]).await;
        store.seed("assignments:9", &[("xml", b"<b/>")]).await;
        let (service, _, _) =
            service_with(store.clone(), ScriptedNamer::default(), FakeVectors::default());

        let created = service
            .create_record(Namespace::Assignments, vec![("xml", b"<c/>".to_vec())])
            .await
            .expect("created");

        assert_eq!(created.key, "assignments:10");
        assert_eq!(created.index, 10);
        assert!(store.field_exists("assignments:10", "timestamp").await.expect("hexists"));
    }

    #[tokio::test]
    async fn delete_missing_record_is_not_found_without_mutation() {
        let store = Arc::new(MemoryStore::new());
        let (service, _, _) =
            service_with(store.clone(), ScriptedNamer::default(), FakeVectors::default());

        let error = service
            .delete_record(Namespace::Materials, "courses:4")
            .await
            .expect_err("missing");

        assert!(matches!(error, RecordError::NotFound(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn delete_normalizes_bare_identifier() {
        let store = Arc::new(MemoryStore::new());
        store.seed("assignments:3", &[("xml", b"<a/>"), ("topic", b"T")]).await;
        let (service, _, _) =
            service_with(store.clone(), ScriptedNamer::default(), FakeVectors::default());

        let removed = service
            .delete_record(Namespace::Assignments, "3")
            .await
            .expect("deleted");

        assert_eq!(removed, "assignments:3");
        assert!(!store.exists("assignments:3").await.expect("exists"));
        assert_eq!(service.metrics_snapshot().records_deleted, 1);
    }

    #[tokio::test]
    async fn delete_refuses_keys_from_another_namespace() {
        let store = Arc::new(MemoryStore::new());
        store.seed("courses:3", &[("content", b"Photosynthesis basics")]).await;
        let (service, _, _) =
            service_with(store.clone(), ScriptedNamer::default(), FakeVectors::default());

        let error = service
            .delete_record(Namespace::Quizzes, "courses:3")
            .await
            .expect_err("foreign key");

        assert!(matches!(error, RecordError::Validation(_)));
        assert!(store.exists("courses:3").await.expect("exists"));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn delete_quiz_falls_back_to_legacy_key() {
        let store = Arc::new(MemoryStore::new());
        store.seed("quizzes:5", &[("xml", b"<t/>")]).await;
        let (service, _, _) =
            service_with(store.clone(), ScriptedNamer::default(), FakeVectors::default());

        let removed = service
            .delete_record(Namespace::Quizzes, "tests:5")
            .await
            .expect("deleted");

        assert_eq!(removed, "quizzes:5");
        assert!(!store.exists("quizzes:5").await.expect("exists"));
    }

    #[tokio::test]
    async fn store_outage_surfaces_as_store_error() {
        let store = Arc::new(MemoryStore::new());
        store.set_offline(true);
        let (service, _, _) = service_with(store, ScriptedNamer::default(), FakeVectors::default());

        let error = service
            .delete_record(Namespace::Quizzes, "1")
            .await
            .expect_err("offline");
        assert!(matches!(error, RecordError::Store(_)));
    }
}
