use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::catalog;
use crate::constants;
use crate::error::{codes, ApiError};
use crate::model::{AccountCard, ReviewResult, ReviewType};
use crate::schema::{account_cards, account_reviews};
use crate::session::current_account_id;
use crate::utils::{days_from, parse_client_date};
use crate::DbPool;

#[derive(Debug, Deserialize)]
pub struct RecordReviewPayload {
    pub card_id: i32,
    pub review_type: ReviewType,
    pub result: ReviewResult,
    pub new_interval: i32,
    pub new_easy_factor: f64,
    #[serde(default)]
    pub extra_review: bool,
    pub timing: Option<f64>,
    pub date: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditCardPayload {
    pub card_id: i32,
    pub review_type: ReviewType,
    #[validate(length(min = 1, max = 160))]
    pub story: Option<String>,
    #[validate(length(min = 1, max = 25))]
    pub hint: Option<String>,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub data: Option<AccountCard>,
}

/// Applies one review outcome: upserts the scheduling record and appends
/// one row to the review ledger, atomically. The interval and easy
/// factor are computed by the grading client; the engine validates and
/// stores them.
///
/// Returns the scheduling record after the review, or `None` when an
/// extra review touched a card that has no record yet.
pub fn record_review(
    conn: &mut SqliteConnection,
    account_id: i32,
    payload: &RecordReviewPayload,
    current_date: NaiveDate,
) -> Result<Option<AccountCard>, ApiError> {
    if payload.new_interval < constants::MIN_REVIEW_INTERVAL
        || payload.new_interval > constants::MAX_REVIEW_INTERVAL
    {
        return Err(ApiError::Validation(codes::ERR_INVALID_INTERVAL));
    }
    if payload.new_easy_factor < constants::MIN_EASY_FACTOR {
        return Err(ApiError::Validation(codes::ERR_INVALID_EASY_FACTOR));
    }
    if payload.timing.is_some_and(|t| t <= 0.0) {
        return Err(ApiError::Validation(codes::ERR_INVALID_TIMING));
    }

    // Either both writes land or neither does: quota accounting reads
    // the ledger and must agree with the visible scheduling state.
    conn.transaction(|conn| {
        if !catalog::card_exists(conn, payload.card_id)? {
            return Err(ApiError::NotFound(codes::ERR_CARD_NOT_FOUND));
        }

        let existing: Option<i32> = account_cards::table
            .filter(account_cards::account_id.eq(account_id))
            .filter(account_cards::card_id.eq(payload.card_id))
            .filter(account_cards::review_type.eq(payload.review_type))
            .select(account_cards::id)
            .first(conn)
            .optional()?;
        let new_card = existing.is_none();

        let affects_schedule = !payload.extra_review || constants::EXTRA_REVIEW_AFFECTS_SCHEDULE;
        if affects_schedule {
            let due_at = days_from(current_date, payload.new_interval);
            let mature = payload.new_interval > constants::MATURE_INTERVAL;

            // A concurrent first review of the same card is absorbed as
            // an update rather than surfaced as a conflict.
            diesel::insert_into(account_cards::table)
                .values((
                    account_cards::account_id.eq(account_id),
                    account_cards::card_id.eq(payload.card_id),
                    account_cards::review_type.eq(payload.review_type),
                    account_cards::review_count.eq(1),
                    account_cards::easy_factor.eq(payload.new_easy_factor),
                    account_cards::due_at.eq(due_at),
                    account_cards::mature.eq(mature),
                ))
                .on_conflict((
                    account_cards::account_id,
                    account_cards::card_id,
                    account_cards::review_type,
                ))
                .do_update()
                .set((
                    account_cards::review_count.eq(account_cards::review_count + 1),
                    account_cards::easy_factor.eq(payload.new_easy_factor),
                    account_cards::due_at.eq(due_at),
                    account_cards::mature.eq(mature),
                ))
                .execute(conn)?;
        }

        diesel::insert_into(account_reviews::table)
            .values((
                account_reviews::account_id.eq(account_id),
                account_reviews::card_id.eq(payload.card_id),
                account_reviews::review_type.eq(payload.review_type),
                account_reviews::result.eq(payload.result),
                account_reviews::extra_review.eq(payload.extra_review),
                account_reviews::new_card.eq(new_card),
                account_reviews::timing.eq(payload.timing),
                account_reviews::created_at.eq(current_date),
            ))
            .execute(conn)?;

        account_cards::table
            .filter(account_cards::account_id.eq(account_id))
            .filter(account_cards::card_id.eq(payload.card_id))
            .filter(account_cards::review_type.eq(payload.review_type))
            .first::<AccountCard>(conn)
            .optional()
            .map_err(Into::into)
    })
}

/// Sets the personal story/hint texts on an account card. Creates a
/// zero-review record lazily when the account has never seen the card.
pub fn edit_account_card(
    conn: &mut SqliteConnection,
    account_id: i32,
    payload: &EditCardPayload,
    current_date: NaiveDate,
) -> Result<AccountCard, ApiError> {
    payload.validate()?;
    if payload.story.is_none() && payload.hint.is_none() {
        return Err(ApiError::Validation(codes::ERR_INVALID_INPUT));
    }

    conn.transaction(|conn| {
        if !catalog::card_exists(conn, payload.card_id)? {
            return Err(ApiError::NotFound(codes::ERR_CARD_NOT_FOUND));
        }

        let existing: Option<i32> = account_cards::table
            .filter(account_cards::account_id.eq(account_id))
            .filter(account_cards::card_id.eq(payload.card_id))
            .filter(account_cards::review_type.eq(payload.review_type))
            .select(account_cards::id)
            .first(conn)
            .optional()?;

        match existing {
            Some(record_id) => {
                diesel::update(account_cards::table.filter(account_cards::id.eq(record_id)))
                    .set((
                        payload
                            .story
                            .as_deref()
                            .map(|s| account_cards::account_story.eq(s)),
                        payload
                            .hint
                            .as_deref()
                            .map(|h| account_cards::account_hint.eq(h)),
                    ))
                    .execute(conn)?;
            }
            None => {
                diesel::insert_into(account_cards::table)
                    .values((
                        account_cards::account_id.eq(account_id),
                        account_cards::card_id.eq(payload.card_id),
                        account_cards::review_type.eq(payload.review_type),
                        account_cards::review_count.eq(0),
                        account_cards::easy_factor.eq(constants::DEFAULT_EASY_FACTOR),
                        account_cards::due_at.eq(current_date),
                        account_cards::mature.eq(false),
                        account_cards::account_story.eq(payload.story.as_deref()),
                        account_cards::account_hint.eq(payload.hint.as_deref()),
                    ))
                    .execute(conn)?;
            }
        }

        account_cards::table
            .filter(account_cards::account_id.eq(account_id))
            .filter(account_cards::card_id.eq(payload.card_id))
            .filter(account_cards::review_type.eq(payload.review_type))
            .first::<AccountCard>(conn)
            .map_err(Into::into)
    })
}

#[axum::debug_handler]
pub async fn record_review_handler(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Json(payload): Json<RecordReviewPayload>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let account_id = current_account_id(&session).await?;
    let current_date = parse_client_date(&payload.date)?;
    let mut conn = pool.get()?;
    let data = record_review(&mut conn, account_id, &payload, current_date)?;
    Ok(Json(ReviewResponse { data }))
}

#[axum::debug_handler]
pub async fn edit_account_card_handler(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Json(payload): Json<EditCardPayload>,
) -> Result<Json<AccountCard>, ApiError> {
    let account_id = current_account_id(&session).await?;
    let current_date = parse_client_date(&payload.date)?;
    let mut conn = pool.get()?;
    let card = edit_account_card(&mut conn, account_id, &payload, current_date)?;
    Ok(Json(card))
}
