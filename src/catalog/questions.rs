use super::{parse_document, CatalogResult, DataSource};
use crate::types::{AnswerRecord, Participant, Question, QuestionType, RawAnswer};
use rand::seq::SliceRandom;
use serde::Deserialize;

#[derive(Deserialize)]
struct QuestionsDocument {
    questions: Vec<Question>,
}

/// Settings for the comfort-object question, whose missing media falls
/// back to the participant's dedicated photo
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub comfort_question_id: String,
    pub comfort_photo_slot: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            comfort_question_id: "8".to_string(),
            comfort_photo_slot: "doudou".to_string(),
        }
    }
}

async fn fetch_questions(source: &dyn DataSource) -> CatalogResult<Vec<Question>> {
    let raw = source.fetch().await?;
    Ok(parse_document::<QuestionsDocument>(&raw)?.questions)
}

/// Questions of the quiz, plus derivation of their answer lists
#[derive(Debug, Default)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
    options: NormalizeOptions,
    error: Option<String>,
}

impl QuestionCatalog {
    pub fn new(options: NormalizeOptions) -> Self {
        Self {
            questions: Vec::new(),
            options,
            error: None,
        }
    }

    pub fn from_questions(questions: Vec<Question>, options: NormalizeOptions) -> Self {
        Self {
            questions,
            options,
            error: None,
        }
    }

    /// Load questions from the data source, replacing any previous list
    pub async fn load(&mut self, source: &dyn DataSource) -> CatalogResult<&[Question]> {
        self.error = None;

        match fetch_questions(source).await {
            Ok(questions) => {
                tracing::info!(
                    "Loaded {} questions from {}",
                    questions.len(),
                    source.describe()
                );
                self.questions = questions;
                Ok(&self.questions)
            }
            Err(e) => {
                tracing::error!("Failed to load questions: {}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn all(&self) -> &[Question] {
        &self.questions
    }

    pub fn count(&self) -> usize {
        self.questions.len()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn photo_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(|q| q.kind == QuestionType::Photo)
    }

    pub fn regular_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(|q| q.kind != QuestionType::Photo)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// One answer record per participant who answered `question_id`,
    /// in participant order
    pub fn derive_answers(
        &self,
        question_id: &str,
        participants: &[Participant],
    ) -> Vec<AnswerRecord> {
        participants
            .iter()
            .filter_map(|p| {
                let raw = p.answers.get(question_id)?;
                normalize_answer(p, question_id, raw, &self.options)
            })
            .collect()
    }
}

/// Turn a participant's raw answer into a displayable record.
/// Returns None for blank answers (the participant did not respond).
pub fn normalize_answer(
    participant: &Participant,
    question_id: &str,
    raw: &RawAnswer,
    options: &NormalizeOptions,
) -> Option<AnswerRecord> {
    let record = |text: String, media: Option<String>, media_list: Option<Vec<String>>| {
        AnswerRecord {
            owner_id: participant.id.clone(),
            owner_name: participant.name.clone(),
            is_multiple: media_list.is_some(),
            text,
            media,
            media_list,
        }
    };

    let normalized = match raw {
        RawAnswer::Blank => return None,
        RawAnswer::LabeledList(items) => {
            let text = items
                .iter()
                .enumerate()
                .map(|(idx, item)| format!("{}. {}", idx + 1, item.label))
                .collect::<Vec<_>>()
                .join("\n");
            let medias = items.iter().filter_map(|item| item.media.clone()).collect();
            record(text, None, Some(medias))
        }
        RawAnswer::MediaList(files) => {
            record(participant.name.clone(), None, Some(files.clone()))
        }
        RawAnswer::Labeled(item) => {
            let media = match &item.media {
                None if question_id == options.comfort_question_id => participant
                    .photo(&options.comfort_photo_slot)
                    .map(str::to_string),
                media => media.clone(),
            };
            record(item.label.clone(), media, None)
        }
        RawAnswer::Image(file) => record(participant.name.clone(), Some(file.clone()), None),
        RawAnswer::Text(text) => record(text.clone(), None, None),
        RawAnswer::Other(value) => record(value.to_string(), None, None),
    };

    Some(normalized)
}

/// A uniformly random permutation of `items`, leaving the input untouched
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(&mut rand::rng());
    shuffled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogError, StaticSource};
    use serde_json::json;

    fn participant(value: serde_json::Value) -> Participant {
        serde_json::from_value(value).unwrap()
    }

    fn catalog() -> QuestionCatalog {
        QuestionCatalog::new(NormalizeOptions::default())
    }

    #[tokio::test]
    async fn test_load_questions() {
        let doc = r#"{
            "users": [],
            "questions": [
                {"id": "1", "text": "Ville préférée ?"},
                {"id": "14", "text": "Photo d'enfance", "type": "photo"}
            ]
        }"#;
        let mut catalog = catalog();
        catalog.load(&StaticSource(Ok(doc.to_string()))).await.unwrap();

        assert_eq!(catalog.count(), 2);
        assert_eq!(catalog.find_by_id("14").unwrap().kind, QuestionType::Photo);
        assert_eq!(catalog.photo_questions().count(), 1);
        assert_eq!(catalog.regular_questions().next().unwrap().id, "1");
    }

    #[tokio::test]
    async fn test_load_error_keeps_message() {
        let mut catalog = catalog();
        let result = catalog.load(&StaticSource(Ok("not json".to_string()))).await;
        assert!(matches!(result, Err(CatalogError::Parse(_))));
        assert!(catalog.error().is_some());
    }

    #[test]
    fn test_plain_text_answer() {
        let p = participant(json!({"id": "a", "name": "Ana", "answers": {"1": "Paris"}}));
        let answers = catalog().derive_answers("1", &[p]);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].text, "Paris");
        assert_eq!(answers[0].owner_id, "a");
        assert_eq!(answers[0].owner_name, "Ana");
        assert!(answers[0].media.is_none());
        assert!(!answers[0].is_multiple);
    }

    #[test]
    fn test_participants_without_answer_are_skipped() {
        let participants = vec![
            participant(json!({"id": "a", "name": "Ana", "answers": {"1": "Paris"}})),
            participant(json!({"id": "b", "name": "Bruno", "answers": {}})),
            participant(json!({"id": "c", "name": "Chloé", "answers": {"1": null}})),
        ];
        let answers = catalog().derive_answers("1", &participants);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].owner_id, "a");
    }

    #[test]
    fn test_labeled_list_is_combined() {
        let p = participant(json!({
            "id": "a",
            "name": "Ana",
            "answers": {"2": [
                {"label": "Alien", "media": "alien.jpg"},
                {"label": "Heat", "media": ""},
                {"label": "Ran", "media": "ran.jpg"}
            ]}
        }));
        let answers = catalog().derive_answers("2", &[p]);
        assert_eq!(answers[0].text, "1. Alien\n2. Heat\n3. Ran");
        assert_eq!(
            answers[0].media_list,
            Some(vec!["alien.jpg".to_string(), "ran.jpg".to_string()])
        );
        assert!(answers[0].media.is_none());
        assert!(answers[0].is_multiple);
    }

    #[test]
    fn test_plain_media_list() {
        let p = participant(json!({
            "id": "a",
            "name": "Ana",
            "answers": {"13": ["photo1.jpg", "photo2.jpg"]}
        }));
        let answers = catalog().derive_answers("13", &[p]);
        assert_eq!(answers[0].text, "Ana");
        assert_eq!(
            answers[0].media_list,
            Some(vec!["photo1.jpg".to_string(), "photo2.jpg".to_string()])
        );
        assert!(answers[0].is_multiple);
    }

    #[test]
    fn test_labeled_object_keeps_media() {
        let p = participant(json!({
            "id": "a",
            "name": "Ana",
            "answers": {"7": {"label": "Paris", "media": "paris.jpg"}}
        }));
        let answers = catalog().derive_answers("7", &[p]);
        assert_eq!(answers[0].text, "Paris");
        assert_eq!(answers[0].media.as_deref(), Some("paris.jpg"));
        assert!(!answers[0].is_multiple);
    }

    #[test]
    fn test_comfort_question_falls_back_to_photo() {
        let p = participant(json!({
            "id": "a",
            "name": "Ana",
            "photos": {"doudou": "bear.png"},
            "answers": {
                "7": {"label": "Paris", "media": ""},
                "8": {"label": "Nounours", "media": ""}
            }
        }));
        let catalog = catalog();
        let comfort = catalog.derive_answers("8", std::slice::from_ref(&p));
        assert_eq!(comfort[0].text, "Nounours");
        assert_eq!(comfort[0].media.as_deref(), Some("bear.png"));

        // Other questions don't get the fallback
        let other = catalog.derive_answers("7", &[p]);
        assert!(other[0].media.is_none());
    }

    #[test]
    fn test_comfort_question_with_blank_photo() {
        let p = participant(json!({
            "id": "a",
            "name": "Ana",
            "photos": {"doudou": "   "},
            "answers": {"8": {"label": "Nounours"}}
        }));
        let answers = catalog().derive_answers("8", &[p]);
        assert!(answers[0].media.is_none());
    }

    #[test]
    fn test_image_string_answer() {
        let p = participant(json!({"id": "a", "name": "Ana", "answers": {"14": "baby.png"}}));
        let answers = catalog().derive_answers("14", &[p]);
        assert_eq!(answers[0].text, "Ana");
        assert_eq!(answers[0].media.as_deref(), Some("baby.png"));
    }

    #[test]
    fn test_other_value_is_displayed_verbatim() {
        let p = participant(json!({"id": "a", "name": "Ana", "answers": {"5": 42}}));
        let answers = catalog().derive_answers("5", &[p]);
        assert_eq!(answers[0].text, "42");
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let items: Vec<u32> = (0..50).collect();
        let snapshot = items.clone();

        let first = shuffle(&items);
        let second = shuffle(&items);

        assert_eq!(items, snapshot);
        for shuffled in [first, second] {
            assert_eq!(shuffled.len(), items.len());
            let mut sorted = shuffled.clone();
            sorted.sort();
            assert_eq!(sorted, snapshot);
        }
    }

    #[test]
    fn test_shuffle_empty() {
        let empty: Vec<AnswerRecord> = Vec::new();
        assert!(shuffle(&empty).is_empty());
    }
}
