//! Course materials: upload, ingest, listing, attachments, search and range slices.

use crate::{
    keys::{Namespace, sequence_suffix, sorted_keys},
    records::{
        service::RecordService,
        types::{
            Attachment, FIELD_CONTENT, FIELD_NAME, FIELD_PDF, FIELD_TITLE, MaterialItem,
            RecordError, SearchResult, SliceEntry, UploadOutcome, require_text, text_field,
            timestamp_field,
        },
    },
    store::decode_lossy,
};

/// Placeholder returned by range listings for keys without content.
pub const MISSING_CONTENT: &str = "<content field missing or null>";
/// Search limit applied when the caller supplies none.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Largest accepted search limit.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Parse a `start`/`stop` pair for a range listing.
///
/// Both bounds must be integers with `0 <= start <= stop`.
pub fn parse_range(start: &str, stop: &str) -> Result<(usize, usize), RecordError> {
    let parse = |name: &str, raw: &str| {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| RecordError::Validation(format!("'{name}' must be an integer")))
    };
    let start = parse("start", start)?;
    let stop = parse("stop", stop)?;
    if start < 0 {
        return Err(RecordError::Validation("'start' must not be negative".into()));
    }
    if stop < start {
        return Err(RecordError::Validation("'stop' must not be less than 'start'".into()));
    }
    let to_index = |value: i64| {
        usize::try_from(value).map_err(|_| RecordError::Validation("range is out of bounds".into()))
    };
    Ok((to_index(start)?, to_index(stop)?))
}

impl RecordService {
    /// List every material, newest first.
    pub async fn list_materials(&self) -> Result<Vec<MaterialItem>, RecordError> {
        let mut items: Vec<MaterialItem> = self
            .load_namespace(Namespace::Materials)
            .await?
            .into_iter()
            .map(|(key, fields)| MaterialItem {
                content: text_field(&fields, FIELD_CONTENT).unwrap_or_default(),
                name: text_field(&fields, FIELD_NAME).unwrap_or_default(),
                has_pdf: fields.get(FIELD_PDF).is_some_and(|bytes| !bytes.is_empty()),
                timestamp: timestamp_field(&fields),
                id: key,
            })
            .collect();
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    /// Store a new material, index it for search, then try to name it.
    ///
    /// Indexing and naming are best effort; the record exists once this returns `Ok`.
    pub async fn upload_material(
        &self,
        text: &str,
        pdf: Option<Vec<u8>>,
    ) -> Result<UploadOutcome, RecordError> {
        let text = require_text("text", text)?;
        let mut fields = vec![(FIELD_CONTENT, text.as_bytes().to_vec())];
        if let Some(bytes) = pdf.filter(|bytes| !bytes.is_empty()) {
            tracing::info!(size = bytes.len(), "Attaching PDF to material");
            fields.push((FIELD_PDF, bytes));
        }
        let created = self.create_record(Namespace::Materials, fields).await?;

        let indexed = self.vectors.store_text(text, Some(&created.key)).await.is_some();
        if !indexed {
            tracing::warn!(key = created.key, "Material stored but not indexed for search");
        }
        let name = self.name_best_effort(&created.key, text).await;

        Ok(UploadOutcome {
            key: created.key,
            index: created.index,
            name,
            indexed,
        })
    }

    /// Hand `text` to the vector service, which persists it, then find and name the record.
    pub async fn ingest_material(&self, text: &str) -> Result<UploadOutcome, RecordError> {
        let text = require_text("text", text)?;
        if self.vectors.store_text(text, None).await.is_none() {
            return Err(RecordError::Upstream(
                "Vector service did not accept the document".into(),
            ));
        }

        let key = self.locate_by_content(text).await?.ok_or_else(|| {
            RecordError::NotFound("Ingested document was not found in the record store".into())
        })?;
        let name = self.name_best_effort(&key, text).await;

        Ok(UploadOutcome {
            index: sequence_suffix(&key).unwrap_or_default(),
            key,
            name,
            indexed: true,
        })
    }

    /// Name a freshly stored material; a failed name write leaves the record unnamed.
    async fn name_best_effort(&self, key: &str, text: &str) -> Option<String> {
        match self.generate_and_store(key, text).await {
            Ok(name) => name,
            Err(error) => {
                tracing::warn!(key, %error, "Material stored but its name could not be saved");
                None
            }
        }
    }

    /// Scan the materials for a record whose content equals `text`.
    ///
    /// Retries according to the configured [`LocatePolicy`](super::LocatePolicy), since the
    /// vector service writes the record asynchronously.
    pub(crate) async fn locate_by_content(
        &self,
        text: &str,
    ) -> Result<Option<String>, RecordError> {
        let attempts = self.locate.attempts.max(1);
        for attempt in 1..=attempts {
            let keys = self.store.scan_keys(&Namespace::Materials.pattern()).await?;
            let contents = self.store.read_field_many(&keys, FIELD_CONTENT).await?;
            if let Some((key, _)) = keys
                .into_iter()
                .zip(contents)
                .find(|(_, content)| content.as_deref() == Some(text))
            {
                tracing::info!(key, attempt, "Located ingested material");
                return Ok(Some(key));
            }
            tracing::debug!(attempt, attempts, "Ingested material not visible yet");
            if attempt < attempts {
                tokio::time::sleep(self.locate.delay).await;
            }
        }
        tracing::warn!(attempts, "Gave up locating ingested material");
        Ok(None)
    }

    /// Load the PDF attached to the material at `key`.
    pub async fn fetch_attachment(&self, key: &str) -> Result<Attachment, RecordError> {
        let key = key.trim();
        if !self.store.exists(key).await? {
            return Err(RecordError::NotFound(format!("Record not found: {key}")));
        }
        let bytes = match self.store.read_field(key, FIELD_PDF).await? {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                tracing::warn!(key, "Record has no PDF attachment");
                return Err(RecordError::NotFound(format!("No PDF stored for {key}")));
            }
        };

        let name = self
            .store
            .read_field(key, FIELD_NAME)
            .await?
            .map(|raw| decode_lossy(&raw).trim().to_string())
            .filter(|name| !name.is_empty());
        let stem = name.unwrap_or_else(|| key.rsplit(':').next().unwrap_or(key).to_string());

        Ok(Attachment {
            file_name: format!("{stem}.pdf"),
            bytes,
        })
    }

    /// Load a PDF by short id; the id is always resolved under `courses:`.
    pub async fn fetch_attachment_by_id(&self, id: &str) -> Result<Attachment, RecordError> {
        let id = require_text("id", id)?;
        let key = format!("{}:{}", Namespace::Materials.prefix(), id.trim());
        self.fetch_attachment(&key).await
    }

    /// Semantic search over materials.
    ///
    /// Matches without a key, or whose key no longer resolves, are skipped.
    pub async fn search_materials(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SearchResult>, RecordError> {
        let query = require_text("query", query)?;
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
            return Err(RecordError::Validation(format!(
                "'limit' must be between 1 and {MAX_SEARCH_LIMIT}"
            )));
        }

        let matches = self
            .vectors
            .search(query, limit)
            .await
            .ok_or_else(|| RecordError::Upstream("Vector search failed".into()))?;

        let mut results = Vec::with_capacity(matches.len());
        for hit in matches {
            let Some(key) = hit.key else {
                tracing::warn!(score = hit.score, "Search match carries no record key");
                continue;
            };
            let fields = self.store.read_hash(&key).await?;
            if fields.is_empty() {
                tracing::warn!(key, "Search match points at a missing record");
                continue;
            }
            let name = text_field(&fields, FIELD_NAME).unwrap_or_default();
            results.push(SearchResult {
                text: text_field(&fields, FIELD_CONTENT).unwrap_or_default(),
                title: text_field(&fields, FIELD_TITLE)
                    .filter(|title| !title.is_empty())
                    .unwrap_or_else(|| name.clone()),
                timestamp: timestamp_field(&fields),
                has_pdf: fields.get(FIELD_PDF).is_some_and(|bytes| !bytes.is_empty()),
                name,
                key,
                score: hit.score,
            });
        }
        tracing::info!(query, results = results.len(), "Search completed");
        Ok(results)
    }

    /// Materials in `[start, stop)` of the ascending sequence order, content fetched in one
    /// pipelined round trip.
    pub async fn slice_materials(
        &self,
        start: usize,
        stop: usize,
    ) -> Result<Vec<SliceEntry>, RecordError> {
        let raw = self.store.scan_keys(&Namespace::Materials.pattern()).await?;
        let ordered: Vec<String> = sorted_keys(Namespace::Materials, raw.iter().map(String::as_str))
            .into_iter()
            .skip(start)
            .take(stop.saturating_sub(start))
            .map(|key| key.to_string())
            .collect();
        if ordered.is_empty() {
            return Ok(Vec::new());
        }

        let contents = self.store.read_field_many(&ordered, FIELD_CONTENT).await?;
        Ok(ordered
            .into_iter()
            .zip(contents)
            .map(|(key, content)| SliceEntry {
                content: content.unwrap_or_else(|| MISSING_CONTENT.to_string()),
                key,
            })
            .collect())
    }
}
