//! Naming workflow for materials: single-record naming and the bulk sync pass.

use crate::{
    keys::Namespace,
    records::{
        service::RecordService,
        types::{
            DeletedEntry, FIELD_CONTENT, FIELD_NAME, NamedEntry, NamingAction, RecordError,
            SyncReport,
        },
    },
    store::{StoreError, decode_lossy},
};

/// Content shorter than this many characters is treated as junk by the bulk pass.
pub const MIN_CONTENT_CHARS: usize = 5;
const NAMED_PREVIEW_WORDS: usize = 10;
const DELETED_PREVIEW_CHARS: usize = 30;

/// Whether `content` is too short to be a real document.
pub fn is_junk_content(content: &str) -> bool {
    content == "#" || content.chars().count() < MIN_CONTENT_CHARS
}

enum SyncStep {
    Deleted(DeletedEntry),
    Skipped,
    Named(NamedEntry),
    Failed,
}

impl RecordService {
    /// Ask the name generator for a title and persist it under `key`.
    ///
    /// `Ok(None)` means no title was produced and the record was left untouched.
    pub async fn generate_and_store(
        &self,
        key: &str,
        content: &str,
    ) -> Result<Option<String>, RecordError> {
        match self.namer.generate_name(content).await {
            Some(name) => {
                self.store
                    .write_hash(key, &[(FIELD_NAME, name.as_bytes().to_vec())])
                    .await?;
                self.metrics.record_named();
                tracing::info!(key, name, "Stored generated name");
                Ok(Some(name))
            }
            None => {
                self.metrics.record_naming_failure();
                tracing::warn!(key, "No name produced; record left unchanged");
                Ok(None)
            }
        }
    }

    /// Rename a single material unconditionally.
    pub async fn sync_name(&self, identifier: &str) -> Result<String, RecordError> {
        if identifier.trim().is_empty() {
            return Err(RecordError::Validation("'key' must not be empty".into()));
        }
        let key = Namespace::Materials.normalize(identifier)?;
        if !self.store.exists(&key).await? {
            return Err(RecordError::NotFound(format!("Record not found: {key}")));
        }
        let content = self
            .store
            .read_field(&key, FIELD_CONTENT)
            .await?
            .map(|raw| decode_lossy(&raw))
            .filter(|content| !content.is_empty())
            .ok_or_else(|| RecordError::NotFound(format!("Record {key} has no content")))?;

        self.generate_and_store(&key, &content)
            .await?
            .ok_or_else(|| RecordError::Upstream(format!("Name generation failed for {key}")))
    }

    /// Name every unnamed material, deleting junk records along the way.
    ///
    /// With `force` set, already-named records are renamed too. Failures on individual
    /// records are counted in the report; only the initial key scan can fail the pass.
    pub async fn sync_all(&self, force: bool) -> Result<SyncReport, RecordError> {
        let keys = self.store.scan_keys(&Namespace::Materials.pattern()).await?;
        tracing::info!(keys = keys.len(), force, "Starting bulk naming pass");

        let mut report = SyncReport {
            total_keys_scanned: keys.len(),
            ..SyncReport::default()
        };

        for key in keys {
            match self.sync_one(&key, force, &mut report).await {
                Ok(SyncStep::Deleted(entry)) => {
                    report.deleted_short += 1;
                    report.deleted_documents_log.push(entry);
                }
                Ok(SyncStep::Skipped) => report.already_named_skipped += 1,
                Ok(SyncStep::Named(entry)) => {
                    match entry.action {
                        NamingAction::Named => report.named += 1,
                        NamingAction::Renamed => report.renamed += 1,
                    }
                    report.named_documents_log.push(entry);
                }
                Ok(SyncStep::Failed) => report.errors += 1,
                Err(error) => {
                    tracing::error!(key, %error, "Store error during bulk naming");
                    report.errors += 1;
                }
            }
        }

        report.summary = format!(
            "Named {} documents, deleted {} short documents.",
            report.named, report.deleted_short
        );
        tracing::info!(summary = report.summary, "Bulk naming pass complete");
        Ok(report)
    }

    async fn sync_one(
        &self,
        key: &str,
        force: bool,
        report: &mut SyncReport,
    ) -> Result<SyncStep, StoreError> {
        let content = match self.store.read_field(key, FIELD_CONTENT).await? {
            Some(raw) if !raw.is_empty() => decode_lossy(&raw),
            _ => {
                tracing::warn!(key, "Material has no content; skipping");
                return Ok(SyncStep::Failed);
            }
        };

        if is_junk_content(&content) {
            self.store.delete(key).await?;
            self.metrics.record_deleted();
            tracing::info!(key, "Deleted material with junk content");
            return Ok(SyncStep::Deleted(DeletedEntry {
                key: key.to_string(),
                preview: content.chars().take(DELETED_PREVIEW_CHARS).collect(),
            }));
        }

        let had_name = self.store.field_exists(key, FIELD_NAME).await?;
        if had_name && !force {
            tracing::debug!(key, "Already named; skipping");
            return Ok(SyncStep::Skipped);
        }

        report.processed_for_naming_or_rename += 1;
        let Some(name) = self.namer.generate_name(&content).await else {
            self.metrics.record_naming_failure();
            tracing::error!(key, "Name generation failed during bulk pass");
            return Ok(SyncStep::Failed);
        };
        self.store
            .write_hash(key, &[(FIELD_NAME, name.as_bytes().to_vec())])
            .await?;
        self.metrics.record_named();

        let action = if had_name {
            NamingAction::Renamed
        } else {
            NamingAction::Named
        };
        tracing::info!(key, name, ?action, "Material named");
        Ok(SyncStep::Named(NamedEntry {
            key: key.to_string(),
            name,
            action,
            preview: content
                .split_whitespace()
                .take(NAMED_PREVIEW_WORDS)
                .collect::<Vec<_>>()
                .join(" "),
        }))
    }
}
