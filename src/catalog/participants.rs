use super::{parse_document, CatalogResult, DataSource};
use crate::types::{Participant, RawAnswer};
use serde::Deserialize;

#[derive(Deserialize)]
struct UsersDocument {
    users: Vec<Participant>,
}

async fn fetch_users(source: &dyn DataSource) -> CatalogResult<Vec<Participant>> {
    let raw = source.fetch().await?;
    Ok(parse_document::<UsersDocument>(&raw)?.users)
}

/// Participants whose answers are being guessed
#[derive(Debug, Default)]
pub struct ParticipantCatalog {
    participants: Vec<Participant>,
    error: Option<String>,
}

impl ParticipantCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_participants(participants: Vec<Participant>) -> Self {
        Self {
            participants,
            error: None,
        }
    }

    /// Load participants from the data source, replacing any previous list.
    /// On failure the message is kept in `error()` and the previous list stays.
    pub async fn load(&mut self, source: &dyn DataSource) -> CatalogResult<&[Participant]> {
        self.error = None;

        match fetch_users(source).await {
            Ok(users) => {
                tracing::info!(
                    "Loaded {} participants from {}",
                    users.len(),
                    source.describe()
                );
                self.participants = users;
                Ok(&self.participants)
            }
            Err(e) => {
                tracing::error!("Failed to load participants: {}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn all(&self) -> &[Participant] {
        &self.participants
    }

    pub fn count(&self) -> usize {
        self.participants.len()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// The participant's answer to a question, if they gave one
    pub fn answer_for(&self, participant_id: &str, question_id: &str) -> Option<&RawAnswer> {
        self.find_by_id(participant_id)?
            .answers
            .get(question_id)
            .filter(|a| !a.is_blank())
    }

    /// Message of the last failed load
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
