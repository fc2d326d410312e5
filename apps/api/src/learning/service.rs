//! Learning session lifecycle: start → next → review (repeat) → end.
//!
//! Persisted session rows and review history live in the stores; the
//! per-session card queue lives in the `SessionQueueManager`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::learning::queue::PeekOutcome;
use crate::learning::scheduler::{schedule_from_today, Rating};
use crate::models::learning::{LearningSessionRow, ReviewCommit};
use crate::models::Pagination;
use crate::state::AppState;

pub const DEFAULT_SESSION_LIMIT: u32 = 20;
pub const MAX_SESSION_LIMIT: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub flashcards_count: u32,
    pub started_at: DateTime<Utc>,
}

/// Card content shown during review; scheduling fields stay server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningFlashcard {
    pub id: Uuid,
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextFlashcardResponse {
    pub flashcard: Option<LearningFlashcard>,
    pub remaining_count: u32,
    pub reviewed_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_complete: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewResponse {
    pub flashcard_id: Uuid,
    pub previous_interval: i32,
    pub new_interval: i32,
    pub next_review_date: chrono::NaiveDate,
    pub ease_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub session_id: Uuid,
    pub flashcards_reviewed: i32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct LearningSessionList {
    pub data: Vec<LearningSessionRow>,
    pub pagination: Pagination,
}

/// Opens a session over the user's due cards, earliest due first.
/// Nothing is persisted when no card is due.
pub async fn start_session(
    state: &AppState,
    user_id: Uuid,
    limit: u32,
) -> Result<StartSessionResponse, AppError> {
    let today = Utc::now().date_naive();
    let due = state
        .flashcards
        .find_due_flashcards(user_id, today, limit)
        .await?;

    if due.is_empty() {
        return Err(AppError::NoDueCards);
    }

    let session = state.sessions.create_session(user_id).await?;
    state.queue.seed(session.id, &due).await?;

    info!(
        "Started learning session {} for user {} with {} flashcards",
        session.id,
        user_id,
        due.len()
    );

    Ok(StartSessionResponse {
        session_id: session.id,
        flashcards_count: due.len() as u32,
        started_at: session.started_at,
    })
}

/// Returns the card at the head of the session's queue. An empty queue reports
/// `session_complete` without ending the session.
pub async fn next_flashcard(
    state: &AppState,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<NextFlashcardResponse, AppError> {
    authorize_session(state, user_id, session_id).await?;

    let outcome = state
        .queue
        .peek_next(session_id, user_id, state.flashcards.as_ref())
        .await?;
    let remaining_count = state.queue.remaining(session_id).await?;
    let reviewed_count = state.queue.reviewed(session_id).await?;

    Ok(match outcome {
        PeekOutcome::Card(card) => NextFlashcardResponse {
            flashcard: Some(LearningFlashcard {
                id: card.id,
                front: card.front,
                back: card.back,
            }),
            remaining_count,
            reviewed_count,
            session_complete: None,
        },
        PeekOutcome::Complete => NextFlashcardResponse {
            flashcard: None,
            remaining_count: 0,
            reviewed_count,
            session_complete: Some(true),
        },
    })
}

/// Applies a rating to the card at the head of the session's queue.
///
/// The queue head is claimed before anything is written, so an out-of-order or
/// replayed submission fails with a conflict and leaves persisted state alone.
/// The flashcard update, review record and session counter are then committed
/// together.
pub async fn submit_review(
    state: &AppState,
    user_id: Uuid,
    session_id: Uuid,
    flashcard_id: Uuid,
    rating: Rating,
) -> Result<SubmitReviewResponse, AppError> {
    authorize_session(state, user_id, session_id).await?;

    let flashcard = state
        .flashcards
        .get_flashcard(flashcard_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session or flashcard not found".to_string()))?;

    state.queue.record_reviewed(session_id, flashcard_id).await?;

    let next = schedule_from_today(flashcard.interval, flashcard.ease_factor, rating);
    let commit = ReviewCommit {
        session_id,
        flashcard_id,
        rating: rating.as_i16(),
        previous_interval: flashcard.interval,
        new_interval: next.new_interval,
        new_ease_factor: next.new_ease_factor,
        next_review_date: next.next_review_date,
        repetition_count: flashcard.repetition_count.saturating_add(1),
        reviewed_at: Utc::now(),
    };

    if let Err(e) = state.flashcards.commit_review(&commit).await {
        error!(
            "Review of flashcard {flashcard_id} left session {session_id}'s queue but was not persisted: {e}"
        );
        return Err(e.into());
    }

    info!(
        "Flashcard {} rated {:?}: interval {} -> {}, next review {}",
        flashcard_id, rating, commit.previous_interval, commit.new_interval, commit.next_review_date
    );

    Ok(SubmitReviewResponse {
        flashcard_id,
        previous_interval: commit.previous_interval,
        new_interval: commit.new_interval,
        next_review_date: commit.next_review_date,
        ease_factor: commit.new_ease_factor,
    })
}

/// Ends the session (keeping an earlier `ended_at` if there is one) and drops
/// its queue. Unreviewed cards stay due and show up in the next session.
pub async fn end_session(
    state: &AppState,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<EndSessionResponse, AppError> {
    let session = state
        .sessions
        .end_session(session_id, user_id, Utc::now())
        .await?
        .ok_or_else(session_not_found)?;

    state.queue.dispose(session_id).await?;

    // end_session always stamps ended_at, so None cannot come back here.
    let ended_at = session.ended_at.unwrap_or_else(Utc::now);
    let duration_minutes = duration_minutes(session.started_at, ended_at);

    info!(
        "Ended learning session {} after {} reviews ({} min)",
        session_id, session.flashcards_reviewed, duration_minutes
    );

    Ok(EndSessionResponse {
        session_id,
        flashcards_reviewed: session.flashcards_reviewed,
        started_at: session.started_at,
        ended_at,
        duration_minutes,
    })
}

pub async fn list_sessions(
    state: &AppState,
    user_id: Uuid,
    page: u32,
    limit: u32,
) -> Result<LearningSessionList, AppError> {
    let (data, total) = state.sessions.list_sessions(user_id, page, limit).await?;
    Ok(LearningSessionList {
        data,
        pagination: Pagination::new(page, limit, total),
    })
}

async fn authorize_session(
    state: &AppState,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<LearningSessionRow, AppError> {
    state
        .sessions
        .get_session(session_id, user_id)
        .await?
        .ok_or_else(session_not_found)
}

fn session_not_found() -> AppError {
    AppError::NotFound("Session not found".to_string())
}

/// Whole minutes between the two instants, rounded half away from zero.
fn duration_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> i64 {
    let millis = (ended_at - started_at).num_milliseconds();
    (millis as f64 / 60_000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    use crate::models::flashcard::NewFlashcard;
    use crate::store::{FlashcardStore, SessionStore};
    use crate::testing::TestApp;

    async fn seed_cards(app: &TestApp, user: Uuid, n: usize) -> Vec<Uuid> {
        let drafts: Vec<NewFlashcard> = (0..n)
            .map(|i| NewFlashcard::manual(format!("front {i}"), format!("back {i}")))
            .collect();
        let mut ids = Vec::new();
        // Insert one by one so created_at orders them.
        for draft in drafts {
            let rows = app
                .store
                .create_flashcards(user, std::slice::from_ref(&draft))
                .await
                .unwrap();
            ids.push(rows[0].id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        ids
    }

    fn card_id(resp: &NextFlashcardResponse) -> Uuid {
        resp.flashcard.as_ref().expect("expected a flashcard").id
    }

    #[test]
    fn test_duration_rounds_to_nearest_minute() {
        let start = Utc::now();
        assert_eq!(duration_minutes(start, start + Duration::seconds(29)), 0);
        assert_eq!(duration_minutes(start, start + Duration::seconds(30)), 1);
        assert_eq!(duration_minutes(start, start + Duration::seconds(150)), 3);
    }

    #[tokio::test]
    async fn test_start_without_due_cards_creates_nothing() {
        let app = TestApp::new();
        let user = Uuid::new_v4();

        let err = start_session(&app.state, user, DEFAULT_SESSION_LIMIT)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NoDueCards));
        assert_eq!(app.store.session_count(), 0);
    }

    #[tokio::test]
    async fn test_start_ignores_cards_not_yet_due() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        let ids = seed_cards(&app, user, 2).await;
        let tomorrow = Utc::now().date_naive() + Duration::days(1);
        for id in &ids {
            app.store.set_next_review_date(*id, Some(tomorrow));
        }

        let err = start_session(&app.state, user, 20).await.unwrap_err();
        assert!(matches!(err, AppError::NoDueCards));
    }

    #[tokio::test]
    async fn test_start_orders_never_scheduled_first_and_caps_limit() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        let ids = seed_cards(&app, user, 3).await;
        app.store
            .set_next_review_date(ids[0], NaiveDate::from_ymd_opt(2020, 1, 1));
        app.store.set_next_review_date(ids[2], None);

        let started = start_session(&app.state, user, 2).await.unwrap();
        assert_eq!(started.flashcards_count, 2);

        let next = next_flashcard(&app.state, user, started.session_id)
            .await
            .unwrap();
        assert_eq!(card_id(&next), ids[2]);
        assert_eq!(next.remaining_count, 2);
    }

    #[tokio::test]
    async fn test_start_only_uses_own_cards() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        seed_cards(&app, Uuid::new_v4(), 3).await;
        seed_cards(&app, user, 1).await;

        let started = start_session(&app.state, user, 20).await.unwrap();
        assert_eq!(started.flashcards_count, 1);
    }

    #[tokio::test]
    async fn test_full_session_flow() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        let ids = seed_cards(&app, user, 3).await;

        let started = start_session(&app.state, user, 20).await.unwrap();
        assert_eq!(started.flashcards_count, 3);
        let session = started.session_id;

        let next = next_flashcard(&app.state, user, session).await.unwrap();
        assert_eq!(card_id(&next), ids[0]);
        assert_eq!(next.remaining_count, 3);
        assert_eq!(next.reviewed_count, 0);

        let review = submit_review(&app.state, user, session, ids[0], Rating::Good)
            .await
            .unwrap();
        assert_eq!(review.previous_interval, 0);
        assert_eq!(review.new_interval, 1);
        assert_eq!(
            review.next_review_date,
            Utc::now().date_naive() + Duration::days(1)
        );

        let next = next_flashcard(&app.state, user, session).await.unwrap();
        assert_eq!(card_id(&next), ids[1]);
        assert_eq!(next.remaining_count, 2);
        assert_eq!(next.reviewed_count, 1);

        let summary = end_session(&app.state, user, session).await.unwrap();
        assert_eq!(summary.flashcards_reviewed, 1);
        assert!(summary.ended_at >= summary.started_at);
        assert_eq!(summary.duration_minutes, 0);

        // B and C are still due; A moved to tomorrow.
        let due = app
            .store
            .find_due_flashcards(user, Utc::now().date_naive(), 20)
            .await
            .unwrap();
        assert_eq!(due, vec![ids[1], ids[2]]);

        let reviews = app.store.reviews();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].flashcard_id, ids[0]);
        assert_eq!(reviews[0].rating, 3);

        let card = app.store.get_flashcard(ids[0], user).await.unwrap().unwrap();
        assert_eq!(card.repetition_count, 1);
        assert_eq!(card.interval, 1);
    }

    #[tokio::test]
    async fn test_replayed_review_conflicts_without_side_effects() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        let ids = seed_cards(&app, user, 2).await;
        let session = start_session(&app.state, user, 20).await.unwrap().session_id;

        submit_review(&app.state, user, session, ids[0], Rating::Easy)
            .await
            .unwrap();
        let err = submit_review(&app.state, user, session, ids[0], Rating::Easy)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(app.store.reviews().len(), 1);
        let row = app
            .store
            .get_session(session, user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.flashcards_reviewed, 1);
    }

    #[tokio::test]
    async fn test_out_of_order_review_conflicts() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        let ids = seed_cards(&app, user, 2).await;
        let session = start_session(&app.state, user, 20).await.unwrap().session_id;

        let err = submit_review(&app.state, user, session, ids[1], Rating::Good)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        let card = app.store.get_flashcard(ids[1], user).await.unwrap().unwrap();
        assert_eq!(card.repetition_count, 0);
        assert_eq!(app.state.queue.remaining(session).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_completed_queue_reports_session_complete() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        let ids = seed_cards(&app, user, 1).await;
        let session = start_session(&app.state, user, 20).await.unwrap().session_id;

        submit_review(&app.state, user, session, ids[0], Rating::Again)
            .await
            .unwrap();
        let next = next_flashcard(&app.state, user, session).await.unwrap();

        assert!(next.flashcard.is_none());
        assert_eq!(next.session_complete, Some(true));
        assert_eq!(next.remaining_count, 0);
        assert_eq!(next.reviewed_count, 1);
        // Completion does not end the persisted session.
        let row = app
            .store
            .get_session(session, user)
            .await
            .unwrap()
            .unwrap();
        assert!(row.ended_at.is_none());
    }

    #[tokio::test]
    async fn test_other_users_cannot_touch_session() {
        let app = TestApp::new();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let ids = seed_cards(&app, owner, 1).await;
        let session = start_session(&app.state, owner, 20).await.unwrap().session_id;

        assert!(matches!(
            next_flashcard(&app.state, intruder, session).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            submit_review(&app.state, intruder, session, ids[0], Rating::Good).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            end_session(&app.state, intruder, session).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_end_twice_keeps_first_end_time() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        seed_cards(&app, user, 1).await;
        let session = start_session(&app.state, user, 20).await.unwrap().session_id;

        let first = end_session(&app.state, user, session).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = end_session(&app.state, user, session).await.unwrap();

        assert_eq!(first.ended_at, second.ended_at);
    }

    #[tokio::test]
    async fn test_review_after_end_conflicts() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        let ids = seed_cards(&app, user, 2).await;
        let session = start_session(&app.state, user, 20).await.unwrap().session_id;

        end_session(&app.state, user, session).await.unwrap();

        let err = submit_review(&app.state, user, session, ids[0], Rating::Good)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let next = next_flashcard(&app.state, user, session).await.unwrap();
        assert_eq!(next.session_complete, Some(true));
    }

    #[tokio::test]
    async fn test_list_sessions_paginates() {
        let app = TestApp::new();
        let user = Uuid::new_v4();
        seed_cards(&app, user, 1).await;
        for _ in 0..3 {
            let session = start_session(&app.state, user, 20).await.unwrap().session_id;
            end_session(&app.state, user, session).await.unwrap();
        }

        let page = list_sessions(&app.state, user, 1, 2).await.unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.total_pages, 2);
    }
}
