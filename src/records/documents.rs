//! Quizzes and assignments: XML documents labelled with a topic.

use crate::{
    keys::Namespace,
    quiz::{ParsedQuiz, QuizError, parse_quiz_xml},
    records::{
        service::RecordService,
        types::{
            CreatedRecord, FIELD_TOPIC, FIELD_XML, RecordError, XmlRecordItem, require_text,
            text_field, timestamp_field,
        },
    },
};

/// Topic stored when a quiz is saved without one.
pub const DEFAULT_QUIZ_TOPIC: &str = "Unnamed Quiz";
/// Topic stored when an assignment is saved without one.
pub const DEFAULT_ASSIGNMENT_TOPIC: &str = "Unnamed Assignment";

/// Generated quiz, raw and parsed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GeneratedQuiz {
    /// XML exactly as returned by the generator.
    pub raw_xml: String,
    /// Parsed structure.
    pub quiz: ParsedQuiz,
}

const fn default_topic(namespace: Namespace) -> &'static str {
    match namespace {
        Namespace::Assignments => DEFAULT_ASSIGNMENT_TOPIC,
        Namespace::Quizzes | Namespace::Materials => DEFAULT_QUIZ_TOPIC,
    }
}

impl RecordService {
    /// Save an XML document under the next key of `namespace`.
    pub async fn save_document(
        &self,
        namespace: Namespace,
        xml: &str,
        topic: Option<&str>,
    ) -> Result<CreatedRecord, RecordError> {
        let xml = require_text("xml", xml)?;
        let topic = topic
            .map(str::trim)
            .filter(|topic| !topic.is_empty())
            .unwrap_or(default_topic(namespace));
        self.create_record(
            namespace,
            vec![
                (FIELD_XML, xml.as_bytes().to_vec()),
                (FIELD_TOPIC, topic.as_bytes().to_vec()),
            ],
        )
        .await
    }

    /// List every document of `namespace`, newest first.
    pub async fn list_documents(
        &self,
        namespace: Namespace,
    ) -> Result<Vec<XmlRecordItem>, RecordError> {
        let mut items: Vec<XmlRecordItem> = self
            .load_namespace(namespace)
            .await?
            .into_iter()
            .map(|(key, fields)| XmlRecordItem {
                topic: text_field(&fields, FIELD_TOPIC)
                    .unwrap_or_else(|| default_topic(namespace).to_string()),
                timestamp: timestamp_field(&fields),
                xml: text_field(&fields, FIELD_XML).unwrap_or_default(),
                key,
            })
            .collect();
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.key.cmp(&b.key)));
        Ok(items)
    }

    /// Ask the quiz generator for a quiz on `topic` and parse it.
    pub async fn generate_quiz(&self, topic: &str) -> Result<GeneratedQuiz, QuizError> {
        let raw_xml = self.quizzes.generate(topic).await?;
        let quiz = parse_quiz_xml(&raw_xml)?;
        Ok(GeneratedQuiz { raw_xml, quiz })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::service::{LocatePolicy, test_support::*};
    use crate::records::types::now_timestamp;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn saved_document_round_trips_through_listing() {
        let store = Arc::new(MemoryStore::new());
        let (service, _, _) = service_with(store, ScriptedNamer::default(), FakeVectors::default());
        let before = now_timestamp();

        let created = service
            .save_document(Namespace::Quizzes, "<t/>", Some("T"))
            .await
            .expect("saved");
        let items = service.list_documents(Namespace::Quizzes).await.expect("list");

        assert_eq!(created.key, "tests:1");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key, created.key);
        assert_eq!(items[0].xml, "<t/>");
        assert_eq!(items[0].topic, "T");
        assert!(items[0].timestamp >= before);
    }

    #[tokio::test]
    async fn blank_topic_falls_back_to_namespace_default() {
        let store = Arc::new(MemoryStore::new());
        let (service, _, _) = service_with(store, ScriptedNamer::default(), FakeVectors::default());

        service
            .save_document(Namespace::Assignments, "<a/>", Some("  "))
            .await
            .expect("assignment");
        service
            .save_document(Namespace::Quizzes, "<q/>", None)
            .await
            .expect("quiz");

        let assignments = service.list_documents(Namespace::Assignments).await.expect("list");
        assert_eq!(assignments[0].topic, DEFAULT_ASSIGNMENT_TOPIC);
        let quizzes = service.list_documents(Namespace::Quizzes).await.expect("list");
        assert_eq!(quizzes[0].topic, DEFAULT_QUIZ_TOPIC);
    }

    #[tokio::test]
    async fn empty_xml_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let (service, _, _) =
            service_with(store.clone(), ScriptedNamer::default(), FakeVectors::default());

        let error = service
            .save_document(Namespace::Quizzes, "", Some("T"))
            .await
            .expect_err("empty");
        assert!(matches!(error, RecordError::Validation(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let store = Arc::new(MemoryStore::new());
        store.seed("tests:1", &[("xml", b"<a/>"), ("timestamp", b"10")]).await;
        store.seed("tests:2", &[("xml", b"<b/>"), ("timestamp", b"30")]).await;
        store.seed("tests:3", &[("xml", b"<c/>"), ("timestamp", b"20")]).await;
        let (service, _, _) = service_with(store, ScriptedNamer::default(), FakeVectors::default());

        let keys: Vec<String> = service
            .list_documents(Namespace::Quizzes)
            .await
            .expect("list")
            .into_iter()
            .map(|item| item.key)
            .collect();
        assert_eq!(keys, vec!["tests:2", "tests:3", "tests:1"]);
    }

    #[tokio::test]
    async fn generate_quiz_parses_generator_output() {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let reply = "Sure!\n<quiz><topic>Cells</topic>\
                     <question><text>What?</text></question></quiz>";
        let service = RecordService::new(
            store,
            Arc::new(ScriptedNamer::default()),
            Arc::new(FakeVectors::default()),
            Arc::new(FixedQuiz(Ok(reply.into()))),
        )
        .with_locate_policy(LocatePolicy::default());

        let generated = service.generate_quiz("Cells").await.expect("quiz");
        assert_eq!(generated.quiz.topic, "Cells");
        assert_eq!(generated.quiz.questions.len(), 1);
        assert!(generated.raw_xml.starts_with("Sure!"));
    }

    #[tokio::test]
    async fn generate_quiz_propagates_timeouts() {
        let service = RecordService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedNamer::default()),
            Arc::new(FakeVectors::default()),
            Arc::new(FixedQuiz(Err(|| QuizError::Timeout))),
        );

        assert!(matches!(service.generate_quiz("x").await, Err(QuizError::Timeout)));
    }
}
