use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Opaque ID types for readability
pub type ParticipantId = String;
pub type QuestionId = String;

/// Guesses per question: answer position -> guessed participant
pub type QuestionGuesses = BTreeMap<usize, ParticipantId>;
pub type GuessMap = BTreeMap<QuestionId, QuestionGuesses>;

/// Shuffled answer order per question, fixed once generated
pub type ShuffledOrders = BTreeMap<QuestionId, Vec<AnswerRecord>>;

/// Validation per question: answer position -> outcome
pub type QuestionValidation = BTreeMap<usize, ValidationEntry>;
pub type ValidationMap = BTreeMap<QuestionId, QuestionValidation>;

/// Scores keyed by the participant who owned the answers
pub type ScoreBoard = BTreeMap<ParticipantId, Score>;

/// Ids show up both as JSON strings and numbers in the data file
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(s) => s,
        IdRepr::Number(n) => n.to_string(),
    })
}

fn deserialize_question_type<'de, D>(deserializer: D) -> Result<QuestionType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<QuestionType>::deserialize(deserializer)?.unwrap_or_default())
}

/// Photo slots keep only string values; a null map or null slot means no photo
fn deserialize_photos<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let slots = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(slots
        .into_iter()
        .filter_map(|(slot, value)| match value {
            Value::String(photo) => Some((slot, photo)),
            _ => None,
        })
        .collect())
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Text,
    Photo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: QuestionId,
    pub text: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_question_type"
    )]
    pub kind: QuestionType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: ParticipantId,
    pub name: String,
    /// Named photo slots (e.g. "doudou" for the comfort object)
    #[serde(default, deserialize_with = "deserialize_photos")]
    pub photos: BTreeMap<String, String>,
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, RawAnswer>,
}

impl Participant {
    /// Photo reference for a slot, ignoring blank entries
    pub fn photo(&self, slot: &str) -> Option<&str> {
        self.photos
            .get(slot)
            .map(String::as_str)
            .filter(|p| !p.trim().is_empty())
    }
}

/// A text label with an optional media reference, e.g. a film and its poster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledMedia {
    pub label: String,
    pub media: Option<String>,
}

impl LabeledMedia {
    fn from_object(map: &serde_json::Map<String, Value>) -> Self {
        Self {
            label: label_text(map.get("label")).unwrap_or_default(),
            media: non_empty_str(map.get("media")),
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Display text of a label: non-empty strings, non-zero numbers and `true`
fn label_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Some(Value::Bool(true)) => Some("true".to_string()),
        other => non_empty_str(other),
    }
}

fn labeled_object(value: &Value) -> Option<&serde_json::Map<String, Value>> {
    value
        .as_object()
        .filter(|map| label_text(map.get("label")).is_some())
}

/// File name that should be displayed as an image
pub fn is_image_file(s: &str) -> bool {
    s.ends_with(".jpg") || s.ends_with(".jpeg") || s.ends_with(".png")
}

/// A participant's answer as found in the data file.
///
/// The data file mixes several shapes; they are classified once when the
/// participant is loaded so that normalization can match on the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum RawAnswer {
    /// null, "", false or 0: the participant did not respond
    Blank,
    /// List whose first element is an object with a label
    LabeledList(Vec<LabeledMedia>),
    /// List of plain file references (an empty list lands here too)
    MediaList(Vec<String>),
    /// Single object with a label
    Labeled(LabeledMedia),
    /// String naming an image file
    Image(String),
    /// Plain text answer
    Text(String),
    /// Anything else, displayed as its JSON text
    Other(Value),
}

impl RawAnswer {
    pub fn is_blank(&self) -> bool {
        matches!(self, RawAnswer::Blank)
    }
}

impl From<Value> for RawAnswer {
    fn from(value: Value) -> Self {
        match value {
            Value::Null | Value::Bool(false) => RawAnswer::Blank,
            Value::Number(ref n) if n.as_f64() == Some(0.0) => RawAnswer::Blank,
            Value::String(s) if s.is_empty() => RawAnswer::Blank,
            Value::String(s) if is_image_file(&s) => RawAnswer::Image(s),
            Value::String(s) => RawAnswer::Text(s),
            Value::Array(items) => {
                if items.first().and_then(labeled_object).is_some() {
                    let labeled = items
                        .iter()
                        .map(|item| match item.as_object() {
                            Some(map) => LabeledMedia::from_object(map),
                            None => LabeledMedia {
                                label: String::new(),
                                media: None,
                            },
                        })
                        .collect();
                    RawAnswer::LabeledList(labeled)
                } else {
                    let files = items
                        .into_iter()
                        .map(|item| match item {
                            Value::String(s) => s,
                            other => other.to_string(),
                        })
                        .collect();
                    RawAnswer::MediaList(files)
                }
            }
            Value::Object(ref map) if label_text(map.get("label")).is_some() => {
                RawAnswer::Labeled(LabeledMedia::from_object(map))
            }
            other => RawAnswer::Other(other),
        }
    }
}

fn labeled_to_value(item: LabeledMedia) -> Value {
    serde_json::json!({
        "label": item.label,
        "media": item.media.unwrap_or_default(),
    })
}

impl From<RawAnswer> for Value {
    fn from(answer: RawAnswer) -> Self {
        match answer {
            RawAnswer::Blank => Value::Null,
            RawAnswer::LabeledList(items) => {
                Value::Array(items.into_iter().map(labeled_to_value).collect())
            }
            RawAnswer::MediaList(files) => {
                Value::Array(files.into_iter().map(Value::String).collect())
            }
            RawAnswer::Labeled(item) => labeled_to_value(item),
            RawAnswer::Image(s) | RawAnswer::Text(s) => Value::String(s),
            RawAnswer::Other(v) => v,
        }
    }
}

/// One displayable answer for a question, derived from a participant's raw answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerRecord {
    pub owner_id: ParticipantId,
    pub owner_name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_list: Option<Vec<String>>,
    #[serde(default)]
    pub is_multiple: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationEntry {
    pub is_correct: bool,
    /// Owner of the answer at this position (None if the position had no owner)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_participant_id: Option<ParticipantId>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

impl Score {
    /// round(correct / total * 100), or 0 without any answers
    pub fn percentage_of(correct: u32, total: u32) -> u32 {
        if total == 0 {
            return 0;
        }
        let (correct, total) = (u64::from(correct), u64::from(total));
        ((200 * correct + total) / (2 * total)) as u32
    }
}
