use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::constants;
use crate::error::{codes, ApiError};
use crate::schema::{account_cards, card_list};
use crate::session::current_account_id;
use crate::utils::{days_from, parse_client_date};
use crate::DbPool;

#[derive(Debug, Deserialize)]
pub struct PushCardsPayload {
    /// Restricts the push to one deck; all of the account's cards when
    /// absent.
    pub deck_id: Option<i32>,
    pub days: i32,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub success: bool,
    pub pushed: usize,
}

/// Shifts the account's due dates forward to defer a backlog. Cards due
/// today or overdue are collapsed onto `current_date + days`; cards not
/// yet due keep their relative order and move by the same offset. Each
/// call shifts again: the operation is a relative shift, not idempotent
/// across calls.
pub fn push_cards(
    conn: &mut SqliteConnection,
    account_id: i32,
    deck_id: Option<i32>,
    days: i32,
    current_date: NaiveDate,
) -> Result<usize, ApiError> {
    if days < 1 || days > constants::MAX_PUSH_REVIEWS_DAYS {
        return Err(ApiError::Validation(codes::ERR_INVALID_PUSH_DAYS));
    }
    if !catalog::account_is_member(conn, account_id)? {
        return Err(ApiError::Forbidden(codes::ERR_MEMBER_FEATURE));
    }
    if let Some(deck_id) = deck_id {
        catalog::find_deck(conn, deck_id)?;
    }

    conn.transaction(|conn| {
        // Snapshot of due dates taken up front, so the pass never reads
        // rows it has already shifted.
        let snapshot: Vec<(i32, NaiveDate)> = match deck_id {
            Some(deck_id) => {
                let deck_cards = card_list::table
                    .filter(card_list::deck_id.eq(deck_id))
                    .select(card_list::card_id);
                account_cards::table
                    .filter(account_cards::account_id.eq(account_id))
                    .filter(account_cards::card_id.eq_any(deck_cards))
                    .select((account_cards::id, account_cards::due_at))
                    .load(conn)?
            }
            None => account_cards::table
                .filter(account_cards::account_id.eq(account_id))
                .select((account_cards::id, account_cards::due_at))
                .load(conn)?,
        };

        let collapse_target = days_from(current_date, days);
        for (record_id, due_at) in &snapshot {
            let new_due = if *due_at <= current_date {
                collapse_target
            } else {
                days_from(*due_at, days)
            };
            diesel::update(account_cards::table.filter(account_cards::id.eq(record_id)))
                .set(account_cards::due_at.eq(new_due))
                .execute(conn)?;
        }

        Ok(snapshot.len())
    })
}

#[axum::debug_handler]
pub async fn push_cards_handler(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Json(payload): Json<PushCardsPayload>,
) -> Result<Json<PushResponse>, ApiError> {
    let account_id = current_account_id(&session).await?;
    let current_date = parse_client_date(&payload.date)?;
    let mut conn = pool.get()?;
    let pushed = push_cards(
        &mut conn,
        account_id,
        payload.deck_id,
        payload.days,
        current_date,
    )?;
    log::info!("pushed {} cards {} days for account {}", pushed, payload.days, account_id);
    Ok(Json(PushResponse {
        success: true,
        pushed,
    }))
}
