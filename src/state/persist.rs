use super::{GameSession, SessionResult, FIRST_QUESTION};
use crate::store::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

impl GameSession {
    /// Write one snapshot to the store
    pub(super) fn persist<T: Serialize>(&self, key: &str, value: &T) -> SessionResult<()> {
        let json = serde_json::to_string(value).map_err(StoreError::Serialize)?;
        self.store.set(key, &json)?;
        Ok(())
    }

    /// A missing or empty blob reads as absent
    fn load_blob<T: DeserializeOwned>(&self, key: &str) -> SessionResult<Option<T>> {
        let Some(raw) = self.store.get(key)?.filter(|raw| !raw.trim().is_empty()) else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(value))
    }

    /// Mark the game as finished
    pub fn complete(&mut self) -> SessionResult<()> {
        self.is_complete = true;
        tracing::info!("Game complete");
        self.persist(COMPLETE_KEY, &self.is_complete)
    }

    /// Back to question 1 with no guesses, orders or results, and no stored blobs
    pub fn reset(&mut self) -> SessionResult<()> {
        self.current_question = FIRST_QUESTION;
        self.current_answer_index = 0;
        self.guesses.clear();
        self.shuffled_orders.clear();
        self.validation_results.clear();
        self.is_complete = false;

        for key in SESSION_KEYS {
            self.store.remove(key)?;
        }

        tracing::info!("Game reset");
        Ok(())
    }

    /// Read back every stored snapshot.
    ///
    /// Keys are restored one at a time; a malformed blob stops the restore
    /// with an error, leaving the keys read before it in place.
    pub fn restore(&mut self) -> SessionResult<()> {
        if let Some(guesses) = self.load_blob(GUESSES_KEY)? {
            self.guesses = guesses;
        }
        if let Some(orders) = self.load_blob(SHUFFLED_ORDER_KEY)? {
            self.shuffled_orders = orders;
        }
        if let Some(results) = self.load_blob(VALIDATION_RESULTS_KEY)? {
            self.validation_results = results;
        }
        if let Some(complete) = self.load_blob(COMPLETE_KEY)? {
            self.is_complete = complete;
        }

        tracing::debug!(
            "Restored session: {} guessed questions, {} shuffled, {} validated",
            self.guesses.len(),
            self.shuffled_orders.len(),
            self.validation_results.len()
        );
        Ok(())
    }
}
