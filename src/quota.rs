use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::Deserialize;
use validator::Validate;

use crate::catalog;
use crate::error::ApiError;
use crate::model::{AccountDeckSettings, QueueMode, ReviewType};
use crate::schema::{account_deck_settings, account_reviews, card_list};
use crate::session::current_account_id;
use crate::DbPool;

#[derive(Debug, Deserialize, Validate)]
pub struct DeckSettingsPayload {
    pub favorite: Option<bool>,
    #[validate(range(min = 1, max = 999))]
    pub review_interval: Option<i32>,
    #[validate(range(min = 0, max = 999))]
    pub reviews_per_day: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub new_cards_per_day: Option<i32>,
}

/// Returns the deck settings for this account, creating a row with the
/// system defaults on first access. Idempotent.
pub fn find_or_create_deck_settings(
    conn: &mut SqliteConnection,
    account_id: i32,
    deck_id: i32,
) -> Result<AccountDeckSettings, ApiError> {
    catalog::find_deck(conn, deck_id)?;

    diesel::insert_into(account_deck_settings::table)
        .values((
            account_deck_settings::account_id.eq(account_id),
            account_deck_settings::deck_id.eq(deck_id),
        ))
        .on_conflict((
            account_deck_settings::account_id,
            account_deck_settings::deck_id,
        ))
        .do_nothing()
        .execute(conn)?;

    account_deck_settings::table
        .filter(account_deck_settings::account_id.eq(account_id))
        .filter(account_deck_settings::deck_id.eq(deck_id))
        .first::<AccountDeckSettings>(conn)
        .map_err(Into::into)
}

/// Daily quota left for the given queue, derived from the review ledger
/// on every call, with no stored counters. Two concurrent sessions can read
/// the same remainder and together overshoot the nominal limit, so this
/// is a best-effort quota, not a hard cap.
pub fn remaining_quota(
    conn: &mut SqliteConnection,
    account_id: i32,
    deck_id: i32,
    review_type: ReviewType,
    mode: QueueMode,
    current_date: NaiveDate,
) -> Result<i64, ApiError> {
    let settings = find_or_create_deck_settings(conn, account_id, deck_id)?;
    let limit = match mode {
        QueueMode::New => settings.new_cards_per_day,
        QueueMode::Due => settings.reviews_per_day,
    } as i64;

    let deck_cards = card_list::table
        .filter(card_list::deck_id.eq(deck_id))
        .filter(card_list::review_type.eq(review_type))
        .select(card_list::card_id);

    let used: i64 = account_reviews::table
        .filter(account_reviews::account_id.eq(account_id))
        .filter(account_reviews::review_type.eq(review_type))
        .filter(account_reviews::extra_review.eq(false))
        .filter(account_reviews::new_card.eq(mode == QueueMode::New))
        .filter(account_reviews::created_at.eq(current_date))
        .filter(account_reviews::card_id.eq_any(deck_cards))
        .count()
        .get_result(conn)?;

    Ok((limit - used).max(0))
}

/// Applies a bounded-field settings update. Out-of-range values are
/// rejected, never clamped.
pub fn change_deck_settings(
    conn: &mut SqliteConnection,
    account_id: i32,
    deck_id: i32,
    payload: &DeckSettingsPayload,
) -> Result<AccountDeckSettings, ApiError> {
    payload.validate()?;

    let current = find_or_create_deck_settings(conn, account_id, deck_id)?;

    if payload.favorite.is_none()
        && payload.review_interval.is_none()
        && payload.reviews_per_day.is_none()
        && payload.new_cards_per_day.is_none()
    {
        return Ok(current);
    }

    diesel::update(
        account_deck_settings::table
            .filter(account_deck_settings::account_id.eq(account_id))
            .filter(account_deck_settings::deck_id.eq(deck_id)),
    )
    .set((
        payload
            .favorite
            .map(|v| account_deck_settings::favorite.eq(v)),
        payload
            .review_interval
            .map(|v| account_deck_settings::review_interval.eq(v)),
        payload
            .reviews_per_day
            .map(|v| account_deck_settings::reviews_per_day.eq(v)),
        payload
            .new_cards_per_day
            .map(|v| account_deck_settings::new_cards_per_day.eq(v)),
    ))
    .execute(conn)?;

    account_deck_settings::table
        .filter(account_deck_settings::account_id.eq(account_id))
        .filter(account_deck_settings::deck_id.eq(deck_id))
        .first::<AccountDeckSettings>(conn)
        .map_err(Into::into)
}

pub async fn fetch_deck_settings(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Path(deck_id): Path<i32>,
) -> Result<Json<AccountDeckSettings>, ApiError> {
    let account_id = current_account_id(&session).await?;
    let mut conn = pool.get()?;
    let settings = find_or_create_deck_settings(&mut conn, account_id, deck_id)?;
    Ok(Json(settings))
}

#[axum::debug_handler]
pub async fn update_deck_settings(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Path(deck_id): Path<i32>,
    Json(payload): Json<DeckSettingsPayload>,
) -> Result<Json<AccountDeckSettings>, ApiError> {
    let account_id = current_account_id(&session).await?;
    let mut conn = pool.get()?;
    let settings = change_deck_settings(&mut conn, account_id, deck_id, &payload)?;
    Ok(Json(settings))
}
