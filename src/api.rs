//! HTTP API for the browser front end.
//!
//! Endpoints follow the game's views: home, question, validation,
//! results intro and results. Each view endpoint runs the session
//! operations its screen needs and returns the data to render.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{shuffle, CatalogResult, DataSource, ParticipantCatalog, QuestionCatalog};
use crate::export::{self, RankingEntry};
use crate::state::{GameSession, SessionError};
use crate::types::*;

/// Shared application state.
///
/// Locks are always taken in the order questions, participants, session.
pub struct AppState {
    pub questions: RwLock<QuestionCatalog>,
    pub participants: RwLock<ParticipantCatalog>,
    pub session: RwLock<GameSession>,
    source: Box<dyn DataSource>,
}

impl AppState {
    pub fn new(
        source: Box<dyn DataSource>,
        questions: QuestionCatalog,
        participants: ParticipantCatalog,
        session: GameSession,
    ) -> Self {
        Self {
            questions: RwLock::new(questions),
            participants: RwLock::new(participants),
            session: RwLock::new(session),
            source,
        }
    }

    /// (Re)load both catalogs from the data source
    pub async fn load_catalogs(&self) -> CatalogResult<()> {
        let mut questions = self.questions.write().await;
        let mut participants = self.participants.write().await;

        let (q, p) = futures::join!(
            questions.load(self.source.as_ref()),
            participants.load(self.source.as_ref())
        );
        q?;
        p?;
        Ok(())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/home", get(home))
        .route("/api/questions", get(list_questions))
        .route("/api/participants", get(list_participants))
        .route("/api/question/{id}", get(question_view))
        .route("/api/question/{id}/guess", post(record_guess))
        .route("/api/question/{id}/validate", get(validation_view))
        .route("/api/question/{id}/next", post(next_question))
        .route("/api/results/intro", post(results_intro))
        .route("/api/results", get(results_view))
        .route("/api/results/export.json", get(export_json))
        .route("/api/results/export.csv", get(export_csv))
        .route("/api/results/clipboard", get(clipboard_text))
        .route("/api/results/share", get(share_payload))
        .route("/api/reset", post(reset))
        .route("/api/catalog/reload", post(reload_catalogs))
        .with_state(state)
}

fn session_error(e: SessionError) -> Response {
    tracing::error!("Session operation failed: {}", e);
    let status = match e {
        SessionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SessionError::ShuffleAlreadyFixed(_) | SessionError::NoShuffledOrder(_) => {
            StatusCode::CONFLICT
        }
    };
    (status, e.to_string()).into_response()
}

fn question_not_found(id: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("Question {} not found", id)).into_response()
}

/// Session progress as shown on every screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub current_question: u32,
    pub current_answer_index: usize,
    pub is_complete: bool,
}

impl SessionSnapshot {
    fn of(session: &GameSession) -> Self {
        Self {
            current_question: session.current_question(),
            current_answer_index: session.current_answer_index(),
            is_complete: session.is_complete(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeView {
    pub question_count: usize,
    pub participant_count: usize,
    pub session: SessionSnapshot,
    /// Catalog load errors, if any
    pub errors: Vec<String>,
}

/// GET /api/home
pub async fn home(State(state): State<Arc<AppState>>) -> Json<HomeView> {
    let questions = state.questions.read().await;
    let participants = state.participants.read().await;
    let session = state.session.read().await;

    let errors = [questions.error(), participants.error()]
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();

    Json(HomeView {
        question_count: questions.count(),
        participant_count: participants.count(),
        session: SessionSnapshot::of(&session),
        errors,
    })
}

/// GET /api/questions
pub async fn list_questions(State(state): State<Arc<AppState>>) -> Response {
    let questions = state.questions.read().await;
    match questions.error() {
        Some(e) if questions.count() == 0 => {
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
        _ => Json(questions.all().to_vec()).into_response(),
    }
}

/// Who can be picked as the owner of an answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantSummary {
    pub id: ParticipantId,
    pub name: String,
}

fn summaries(participants: &[Participant]) -> Vec<ParticipantSummary> {
    participants
        .iter()
        .map(|p| ParticipantSummary {
            id: p.id.clone(),
            name: p.name.clone(),
        })
        .collect()
}

/// GET /api/participants
pub async fn list_participants(State(state): State<Arc<AppState>>) -> Response {
    let participants = state.participants.read().await;
    match participants.error() {
        Some(e) if participants.count() == 0 => {
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
        _ => Json(summaries(participants.all())).into_response(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub question: Question,
    pub answers: Vec<AnswerRecord>,
    pub current_answer_index: usize,
    pub guesses: QuestionGuesses,
    pub participants: Vec<ParticipantSummary>,
}

/// GET /api/question/{id}
///
/// Makes the question current and fixes its answer order on first visit.
pub async fn question_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let questions = state.questions.read().await;
    let Some(question) = questions.find_by_id(&id).cloned() else {
        return question_not_found(&id);
    };
    let participants = state.participants.read().await;
    let mut session = state.session.write().await;

    if let Ok(number) = id.parse::<u32>() {
        if session.current_question() != number {
            session.jump_to_question(number);
        }
    }

    let answers = match session.shuffled_order_or_insert_with(&id, || {
        shuffle(&questions.derive_answers(&id, participants.all()))
    }) {
        Ok(answers) => answers.to_vec(),
        Err(e) => return session_error(e),
    };

    Json(QuestionView {
        question,
        answers,
        current_answer_index: session.current_answer_index(),
        guesses: session.guesses_for(&id).cloned().unwrap_or_default(),
        participants: summaries(participants.all()),
    })
    .into_response()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessRequest {
    pub answer_index: usize,
    pub participant_id: ParticipantId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessResponse {
    pub current_answer_index: usize,
    pub answer_count: usize,
    /// Every answer of the question has been guessed
    pub question_done: bool,
}

/// POST /api/question/{id}/guess
pub async fn record_guess(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(guess): Json<GuessRequest>,
) -> Response {
    let participants = state.participants.read().await;
    if participants.find_by_id(&guess.participant_id).is_none() {
        return (
            StatusCode::BAD_REQUEST,
            format!("Unknown participant {}", guess.participant_id),
        )
            .into_response();
    }

    let mut session = state.session.write().await;
    let Some(answer_count) = session.shuffled_order(&id).map(<[AnswerRecord]>::len) else {
        return session_error(SessionError::NoShuffledOrder(id));
    };
    if guess.answer_index >= answer_count {
        return (
            StatusCode::BAD_REQUEST,
            format!(
                "Answer index {} out of range for question {}",
                guess.answer_index, id
            ),
        )
            .into_response();
    }

    if let Err(e) = session.record_guess(&id, guess.answer_index, &guess.participant_id) {
        return session_error(e);
    }
    if guess.answer_index == session.current_answer_index() {
        session.advance_answer();
    }

    let guessed = session.guesses_for(&id).map_or(0, |g| g.len());
    Json(GuessResponse {
        current_answer_index: session.current_answer_index(),
        answer_count,
        question_done: guessed >= answer_count,
    })
    .into_response()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationView {
    pub question: Question,
    pub answers: Vec<AnswerRecord>,
    pub results: QuestionValidation,
}

/// GET /api/question/{id}/validate
pub async fn validation_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let questions = state.questions.read().await;
    let Some(question) = questions.find_by_id(&id).cloned() else {
        return question_not_found(&id);
    };

    let mut session = state.session.write().await;
    let results = match session.validate_shuffled(&id) {
        Ok(results) => results,
        Err(e) => return session_error(e),
    };
    let answers = session.shuffled_order(&id).unwrap_or_default().to_vec();

    Json(ValidationView {
        question,
        answers,
        results,
    })
    .into_response()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextQuestion {
    pub current_question: u32,
    /// False once the last question has been passed
    pub has_question: bool,
}

/// POST /api/question/{id}/next
pub async fn next_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let questions = state.questions.read().await;
    if questions.find_by_id(&id).is_none() {
        return question_not_found(&id);
    }
    let mut session = state.session.write().await;

    if let Ok(number) = id.parse::<u32>() {
        session.jump_to_question(number);
    }
    session.advance_question();

    Json(NextQuestion {
        current_question: session.current_question(),
        has_question: questions.find_by_id(&session.current_question_id()).is_some(),
    })
    .into_response()
}

/// POST /api/results/intro
pub async fn results_intro(State(state): State<Arc<AppState>>) -> Response {
    let mut session = state.session.write().await;
    match session.complete() {
        Ok(()) => Json(SessionSnapshot::of(&session)).into_response(),
        Err(e) => session_error(e),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsView {
    pub is_complete: bool,
    pub scores: ScoreBoard,
    pub ranking: Vec<RankingEntry>,
}

async fn current_results(state: &AppState) -> export::ResultsExport {
    let participants = state.participants.read().await;
    let session = state.session.read().await;
    let scores = session.compute_scores(participants.all());
    export::format_results(participants.all(), &scores, session.validation_results())
}

/// GET /api/results
pub async fn results_view(State(state): State<Arc<AppState>>) -> Json<ResultsView> {
    let participants = state.participants.read().await;
    let session = state.session.read().await;
    let scores = session.compute_scores(participants.all());
    let results =
        export::format_results(participants.all(), &scores, session.validation_results());

    Json(ResultsView {
        is_complete: session.is_complete(),
        scores,
        ranking: results.ranking,
    })
}

/// GET /api/results/export.json
pub async fn export_json(State(state): State<Arc<AppState>>) -> Response {
    let results = current_results(&state).await;
    match export::to_json(&results) {
        Ok(body) => (
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!(
                        "attachment; filename=\"{}\"",
                        export::export_file_name(&results, "json")
                    ),
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize results: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// GET /api/results/export.csv
pub async fn export_csv(State(state): State<Arc<AppState>>) -> Response {
    let results = current_results(&state).await;
    (
        [
            (header::CONTENT_TYPE, "text/csv;charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    export::export_file_name(&results, "csv")
                ),
            ),
        ],
        export::to_csv(&results),
    )
        .into_response()
}

/// GET /api/results/clipboard
pub async fn clipboard_text(State(state): State<Arc<AppState>>) -> String {
    export::clipboard_text(&current_results(&state).await)
}

/// GET /api/results/share
pub async fn share_payload(State(state): State<Arc<AppState>>) -> Json<export::SharePayload> {
    Json(export::share_payload(&current_results(&state).await))
}

/// POST /api/reset
pub async fn reset(State(state): State<Arc<AppState>>) -> Response {
    let mut session = state.session.write().await;
    match session.reset() {
        Ok(()) => Json(SessionSnapshot::of(&session)).into_response(),
        Err(e) => session_error(e),
    }
}

/// POST /api/catalog/reload
pub async fn reload_catalogs(State(state): State<Arc<AppState>>) -> Response {
    match state.load_catalogs().await {
        Ok(()) => (StatusCode::OK, "Catalogs reloaded").into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, format!("Reload failed: {}", e)).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NormalizeOptions, StaticSource};
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const DOC: &str = r#"{
        "users": [
            {"id": "a", "name": "Ana", "photos": {"doudou": "bear.png"}, "answers": {"1": "Paris", "8": {"label": "Nounours", "media": ""}}},
            {"id": "b", "name": "Bruno", "answers": {"1": "Lyon"}},
            {"id": "c", "name": "Chloé", "answers": {"1": "Nice", "8": {"label": "Lapin", "media": "lapin.jpg"}}}
        ],
        "questions": [
            {"id": "1", "text": "Ville préférée ?"},
            {"id": "8", "text": "Ton doudou ?", "type": "photo"}
        ]
    }"#;

    async fn test_state() -> Arc<AppState> {
        let state = Arc::new(AppState::new(
            Box::new(StaticSource(Ok(DOC.to_string()))),
            QuestionCatalog::new(NormalizeOptions::default()),
            ParticipantCatalog::new(),
            GameSession::new(Box::new(MemoryStore::new())),
        ));
        state.load_catalogs().await.unwrap();
        state
    }

    async fn call(
        state: &Arc<AppState>,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn call_json<T: serde::de::DeserializeOwned>(
        state: &Arc<AppState>,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> T {
        let (status, bytes) = call(state, method, uri, body).await;
        assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&bytes));
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_home() {
        let state = test_state().await;
        let home: HomeView = call_json(&state, "GET", "/api/home", None).await;
        assert_eq!(home.question_count, 2);
        assert_eq!(home.participant_count, 3);
        assert_eq!(home.session.current_question, 1);
        assert!(home.errors.is_empty());
    }

    #[tokio::test]
    async fn test_question_view_shuffles_once() {
        let state = test_state().await;
        let first: QuestionView = call_json(&state, "GET", "/api/question/1", None).await;
        let second: QuestionView = call_json(&state, "GET", "/api/question/1", None).await;

        assert_eq!(first.answers.len(), 3);
        assert_eq!(first.answers, second.answers);
        assert_eq!(first.participants.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_question() {
        let state = test_state().await;
        let (status, _) = call(&state, "GET", "/api/question/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_next_on_unknown_question() {
        let state = test_state().await;
        let (status, _) = call(&state, "POST", "/api/question/4294967295/next", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(state.session.read().await.current_question(), 1);
    }

    #[tokio::test]
    async fn test_guess_requires_shuffled_order() {
        let state = test_state().await;
        let guess = serde_json::json!({"answer_index": 0, "participant_id": "a"});
        let (status, _) = call(&state, "POST", "/api/question/1/guess", Some(guess)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_guess_validation_of_input() {
        let state = test_state().await;
        let _: QuestionView = call_json(&state, "GET", "/api/question/1", None).await;

        let unknown = serde_json::json!({"answer_index": 0, "participant_id": "zz"});
        let (status, _) = call(&state, "POST", "/api/question/1/guess", Some(unknown)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let out_of_range = serde_json::json!({"answer_index": 3, "participant_id": "a"});
        let (status, _) = call(&state, "POST", "/api/question/1/guess", Some(out_of_range)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_perfect_round() {
        let state = test_state().await;
        let view: QuestionView = call_json(&state, "GET", "/api/question/1", None).await;

        let mut last = None;
        for (index, answer) in view.answers.iter().enumerate() {
            let guess =
                serde_json::json!({"answer_index": index, "participant_id": answer.owner_id});
            let response: GuessResponse =
                call_json(&state, "POST", "/api/question/1/guess", Some(guess)).await;
            last = Some(response);
        }
        let last = last.unwrap();
        assert!(last.question_done);
        assert_eq!(last.current_answer_index, 3);

        let validation: ValidationView =
            call_json(&state, "GET", "/api/question/1/validate", None).await;
        assert_eq!(validation.results.len(), 3);
        assert!(validation.results.values().all(|r| r.is_correct));

        let next: NextQuestion = call_json(&state, "POST", "/api/question/1/next", None).await;
        assert_eq!(next.current_question, 2);
        assert!(!next.has_question);

        let _: SessionSnapshot = call_json(&state, "POST", "/api/results/intro", None).await;
        let results: ResultsView = call_json(&state, "GET", "/api/results", None).await;
        assert!(results.is_complete);
        assert_eq!(results.ranking.len(), 3);
        assert!(results.ranking.iter().all(|r| r.percentage == 100));
    }

    #[tokio::test]
    async fn test_comfort_question_view() {
        let state = test_state().await;
        let view: QuestionView = call_json(&state, "GET", "/api/question/8", None).await;
        assert_eq!(view.answers.len(), 2);
        let ana = view.answers.iter().find(|a| a.owner_id == "a").unwrap();
        assert_eq!(ana.media.as_deref(), Some("bear.png"));
    }

    #[tokio::test]
    async fn test_exports() {
        let state = test_state().await;

        let (status, csv) = call(&state, "GET", "/api/results/export.csv", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(csv)
            .unwrap()
            .starts_with(export::CSV_HEADER));

        let (status, text) = call(&state, "GET", "/api/results/clipboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(text).unwrap().contains("CLASSEMENT"));

        let payload: export::SharePayload =
            call_json(&state, "GET", "/api/results/share", None).await;
        assert_eq!(payload.title, export::RESULTS_TITLE);

        let json: serde_json::Value =
            call_json(&state, "GET", "/api/results/export.json", None).await;
        assert_eq!(json["summary"]["total_participants"], 3);
    }

    #[tokio::test]
    async fn test_reset() {
        let state = test_state().await;
        let _: QuestionView = call_json(&state, "GET", "/api/question/8", None).await;
        let snapshot: SessionSnapshot = call_json(&state, "POST", "/api/reset", None).await;

        assert_eq!(snapshot.current_question, 1);
        assert!(state.session.read().await.shuffled_orders().is_empty());
    }

    #[tokio::test]
    async fn test_reload_failure_reports_error() {
        let state = Arc::new(AppState::new(
            Box::new(StaticSource(Err("offline".to_string()))),
            QuestionCatalog::new(NormalizeOptions::default()),
            ParticipantCatalog::new(),
            GameSession::new(Box::new(MemoryStore::new())),
        ));

        let (status, _) = call(&state, "POST", "/api/catalog/reload", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = call(&state, "GET", "/api/questions", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let home: HomeView = call_json(&state, "GET", "/api/home", None).await;
        assert_eq!(home.errors.len(), 2);
    }
}
