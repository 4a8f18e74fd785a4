//! Game session state: progression, guesses, validation and scores.
//!
//! The session is an explicit object owning its blob store. Every mutation
//! of guesses, shuffled orders, validation results or the completion flag
//! is written through to the store; navigation (current question and
//! answer index) lives in memory only.

mod guess;
mod persist;
mod progress;
mod score;
mod validation;

use crate::store::{BlobStore, StoreError};
use crate::types::*;

/// Question the session starts on
pub const FIRST_QUESTION: u32 = 1;

/// Errors that can occur while mutating or restoring a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Question {0} already has a shuffled answer order")]
    ShuffleAlreadyFixed(QuestionId),

    #[error("Question {0} has no shuffled answer order yet")]
    NoShuffledOrder(QuestionId),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// The player's run through the quiz
pub struct GameSession {
    current_question: u32,
    current_answer_index: usize,
    guesses: GuessMap,
    shuffled_orders: ShuffledOrders,
    validation_results: ValidationMap,
    is_complete: bool,
    store: Box<dyn BlobStore>,
}

impl GameSession {
    /// Fresh session on question 1; nothing is read from the store
    pub fn new(store: Box<dyn BlobStore>) -> Self {
        Self {
            current_question: FIRST_QUESTION,
            current_answer_index: 0,
            guesses: GuessMap::new(),
            shuffled_orders: ShuffledOrders::new(),
            validation_results: ValidationMap::new(),
            is_complete: false,
            store,
        }
    }

    /// Fresh session with whatever the store holds restored into it
    pub fn restored(store: Box<dyn BlobStore>) -> SessionResult<Self> {
        let mut session = Self::new(store);
        session.restore()?;
        Ok(session)
    }

    pub fn current_question(&self) -> u32 {
        self.current_question
    }

    /// Current question as a catalog id
    pub fn current_question_id(&self) -> QuestionId {
        self.current_question.to_string()
    }

    pub fn current_answer_index(&self) -> usize {
        self.current_answer_index
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn guesses(&self) -> &GuessMap {
        &self.guesses
    }

    pub fn shuffled_orders(&self) -> &ShuffledOrders {
        &self.shuffled_orders
    }

    pub fn validation_results(&self) -> &ValidationMap {
        &self.validation_results
    }
}
