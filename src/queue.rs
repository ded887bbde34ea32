use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use diesel::dsl::not;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::error::{codes, ApiError};
use crate::model::{QueueMode, ReviewType};
use crate::quota;
use crate::schema::{account_cards, card_list};
use crate::session::current_account_id;
use crate::utils::parse_client_date;
use crate::DbPool;

#[derive(Debug, Deserialize)]
pub struct FetchQueueParams {
    pub deck_id: i32,
    pub review_type: ReviewType,
    pub mode: QueueMode,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub data: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

/// Returns the next batch of card ids for a study session, bounded by
/// the day's remaining quota. Pure read: no state is mutated and no
/// quota is reserved.
pub fn select_queue(
    conn: &mut SqliteConnection,
    account_id: i32,
    deck_id: i32,
    review_type: ReviewType,
    mode: QueueMode,
    current_date: NaiveDate,
) -> Result<Vec<i32>, ApiError> {
    let member_only = catalog::find_deck(conn, deck_id)?;
    if member_only && !catalog::account_is_member(conn, account_id)? {
        return Err(ApiError::Forbidden(codes::ERR_MEMBER_ONLY_DECK));
    }

    let remaining = quota::remaining_quota(conn, account_id, deck_id, review_type, mode, current_date)?;
    if remaining <= 0 {
        return Ok(Vec::new());
    }

    let known_cards = account_cards::table
        .filter(account_cards::account_id.eq(account_id))
        .filter(account_cards::review_type.eq(review_type))
        .select(account_cards::card_id);

    let card_ids = match mode {
        // Cards never reviewed by this account, in curriculum order.
        QueueMode::New => card_list::table
            .filter(card_list::deck_id.eq(deck_id))
            .filter(card_list::review_type.eq(review_type))
            .filter(card_list::active.eq(true))
            .filter(not(card_list::card_id.eq_any(known_cards)))
            .order(card_list::learning_order.asc())
            .limit(remaining)
            .select(card_list::card_id)
            .load::<i32>(conn)?,
        // Cards with a scheduling record due on or before the client's
        // day, oldest overdue first.
        QueueMode::Due => {
            let deck_cards = card_list::table
                .filter(card_list::deck_id.eq(deck_id))
                .filter(card_list::review_type.eq(review_type))
                .filter(card_list::active.eq(true))
                .select(card_list::card_id);

            account_cards::table
                .filter(account_cards::account_id.eq(account_id))
                .filter(account_cards::review_type.eq(review_type))
                .filter(account_cards::due_at.le(current_date))
                .filter(account_cards::card_id.eq_any(deck_cards))
                .order(account_cards::due_at.asc())
                .limit(remaining)
                .select(account_cards::card_id)
                .load::<i32>(conn)?
        }
    };

    Ok(card_ids)
}

#[axum::debug_handler]
pub async fn fetch_queue(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Query(params): Query<FetchQueueParams>,
) -> Result<Json<QueueResponse>, ApiError> {
    let account_id = current_account_id(&session).await?;
    let current_date = parse_client_date(&params.date)?;
    let mut conn = pool.get()?;

    let data = select_queue(
        &mut conn,
        account_id,
        params.deck_id,
        params.review_type,
        params.mode,
        current_date,
    )?;

    // An empty batch is a normal terminal state, not an error.
    let code = data.is_empty().then_some(codes::ERR_NO_CARDS_AVAILABLE);
    Ok(Json(QueueResponse { data, code }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::{change_deck_settings, DeckSettingsPayload};
    use crate::test_support::*;

    fn seed_deck_of_three(conn: &mut SqliteConnection) {
        seed_account(conn, 1, false);
        seed_deck(conn, 10, false);
        for (card_id, order) in [(100, 1), (101, 2), (102, 3)] {
            seed_card(conn, card_id, "KANJI");
            seed_card_list(conn, 10, card_id, "RECALL", order);
        }
    }

    #[test]
    fn new_cards_follow_learning_order() {
        let mut conn = test_conn();
        seed_deck_of_three(&mut conn);

        let batch = select_queue(
            &mut conn,
            1,
            10,
            ReviewType::Recall,
            QueueMode::New,
            date("2024-01-05"),
        )
        .unwrap();
        assert_eq!(batch, vec![100, 101, 102]);
    }

    #[test]
    fn reviewed_card_leaves_new_queue() {
        let mut conn = test_conn();
        seed_deck_of_three(&mut conn);
        seed_account_card(&mut conn, 1, 101, "RECALL", date("2024-01-09"));

        let batch = select_queue(
            &mut conn,
            1,
            10,
            ReviewType::Recall,
            QueueMode::New,
            date("2024-01-05"),
        )
        .unwrap();
        assert_eq!(batch, vec![100, 102]);
    }

    #[test]
    fn due_cards_come_back_oldest_first() {
        let mut conn = test_conn();
        seed_deck_of_three(&mut conn);
        seed_account_card(&mut conn, 1, 100, "RECALL", date("2024-01-01"));
        seed_account_card(&mut conn, 1, 101, "RECALL", date("2024-01-03"));
        seed_account_card(&mut conn, 1, 102, "RECALL", date("2023-12-20"));

        let batch = select_queue(
            &mut conn,
            1,
            10,
            ReviewType::Recall,
            QueueMode::Due,
            date("2024-01-05"),
        )
        .unwrap();
        assert_eq!(batch, vec![102, 100, 101]);
    }

    #[test]
    fn due_queue_excludes_future_cards() {
        let mut conn = test_conn();
        seed_deck_of_three(&mut conn);
        seed_account_card(&mut conn, 1, 100, "RECALL", date("2024-01-05"));
        seed_account_card(&mut conn, 1, 101, "RECALL", date("2024-01-06"));

        let batch = select_queue(
            &mut conn,
            1,
            10,
            ReviewType::Recall,
            QueueMode::Due,
            date("2024-01-05"),
        )
        .unwrap();
        assert_eq!(batch, vec![100]);
    }

    #[test]
    fn review_types_are_scheduled_independently() {
        let mut conn = test_conn();
        seed_deck_of_three(&mut conn);
        seed_card_list(&mut conn, 10, 100, "RECOGNISE", 1);
        seed_account_card(&mut conn, 1, 100, "RECOGNISE", date("2024-01-01"));

        let batch = select_queue(
            &mut conn,
            1,
            10,
            ReviewType::Recall,
            QueueMode::New,
            date("2024-01-05"),
        )
        .unwrap();
        assert_eq!(batch, vec![100, 101, 102]);
    }

    #[test]
    fn exhausted_quota_yields_empty_batch() {
        let mut conn = test_conn();
        seed_deck_of_three(&mut conn);

        let today = date("2024-01-05");
        change_deck_settings(
            &mut conn,
            1,
            10,
            &DeckSettingsPayload {
                favorite: None,
                review_interval: None,
                reviews_per_day: None,
                new_cards_per_day: Some(2),
            },
        )
        .unwrap();
        seed_review(&mut conn, 1, 100, "RECALL", false, true, today);
        seed_review(&mut conn, 1, 101, "RECALL", false, true, today);

        let batch =
            select_queue(&mut conn, 1, 10, ReviewType::Recall, QueueMode::New, today).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn partially_used_quota_shrinks_the_batch() {
        let mut conn = test_conn();
        seed_deck_of_three(&mut conn);

        let today = date("2024-01-05");
        change_deck_settings(
            &mut conn,
            1,
            10,
            &DeckSettingsPayload {
                favorite: None,
                review_interval: None,
                reviews_per_day: None,
                new_cards_per_day: Some(2),
            },
        )
        .unwrap();
        seed_review(&mut conn, 1, 100, "RECALL", false, true, today);
        seed_account_card(&mut conn, 1, 100, "RECALL", date("2024-01-09"));

        let batch =
            select_queue(&mut conn, 1, 10, ReviewType::Recall, QueueMode::New, today).unwrap();
        assert_eq!(batch, vec![101]);
    }

    #[test]
    fn unknown_deck_is_rejected() {
        let mut conn = test_conn();
        seed_account(&mut conn, 1, false);

        let err = select_queue(
            &mut conn,
            1,
            99,
            ReviewType::Recall,
            QueueMode::New,
            date("2024-01-05"),
        )
        .unwrap_err();
        assert_eq!(err.code(), codes::ERR_DECK_NOT_FOUND);
    }

    #[test]
    fn member_only_deck_requires_membership() {
        let mut conn = test_conn();
        seed_account(&mut conn, 1, false);
        seed_account(&mut conn, 2, true);
        seed_deck(&mut conn, 10, true);
        seed_card(&mut conn, 100, "KANJI");
        seed_card_list(&mut conn, 10, 100, "RECALL", 1);

        let err = select_queue(
            &mut conn,
            1,
            10,
            ReviewType::Recall,
            QueueMode::New,
            date("2024-01-05"),
        )
        .unwrap_err();
        assert_eq!(err.code(), codes::ERR_MEMBER_ONLY_DECK);

        let batch = select_queue(
            &mut conn,
            2,
            10,
            ReviewType::Recall,
            QueueMode::New,
            date("2024-01-05"),
        )
        .unwrap();
        assert_eq!(batch, vec![100]);
    }

    #[test]
    fn inactive_catalog_entries_are_skipped() {
        let mut conn = test_conn();
        seed_deck_of_three(&mut conn);
        deactivate_card_list_entry(&mut conn, 10, 101, "RECALL");

        let batch = select_queue(
            &mut conn,
            1,
            10,
            ReviewType::Recall,
            QueueMode::New,
            date("2024-01-05"),
        )
        .unwrap();
        assert_eq!(batch, vec![100, 102]);
    }
}
