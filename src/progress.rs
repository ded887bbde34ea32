use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use diesel::dsl::{count_distinct, count_star, not};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{codes, ApiError};
use crate::model::{CardType, ReviewType};
use crate::schema::{account_cards, account_reviews, card_list, cards};
use crate::session::current_account_id;
use crate::utils::{days_from, parse_client_date};
use crate::DbPool;

#[derive(Debug, Deserialize)]
pub struct StatisticsParams {
    pub card_type: CardType,
    pub review_type: ReviewType,
}

#[derive(Debug, Deserialize)]
pub struct ProjectionParams {
    pub limit_days: i32,
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit_days: i32,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct LearningProgress {
    pub new: i64,
    pub learning: i64,
    pub mature: i64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct DailyReviews {
    pub date: NaiveDate,
    pub reviews: i64,
}

/// Counts the account's cards of one type and review direction by
/// learning status. Pure read.
pub fn learning_statistics(
    conn: &mut SqliteConnection,
    account_id: i32,
    card_type: CardType,
    review_type: ReviewType,
) -> Result<LearningProgress, ApiError> {
    let mature: i64 = account_cards::table
        .inner_join(cards::table)
        .filter(cards::card_type.eq(card_type))
        .filter(cards::active.eq(true))
        .filter(account_cards::account_id.eq(account_id))
        .filter(account_cards::review_type.eq(review_type))
        .filter(account_cards::mature.eq(true))
        .select(count_star())
        .get_result(conn)?;

    let learning: i64 = account_cards::table
        .inner_join(cards::table)
        .filter(cards::card_type.eq(card_type))
        .filter(cards::active.eq(true))
        .filter(account_cards::account_id.eq(account_id))
        .filter(account_cards::review_type.eq(review_type))
        .filter(account_cards::mature.eq(false))
        .select(count_star())
        .get_result(conn)?;

    let known_cards = account_cards::table
        .filter(account_cards::account_id.eq(account_id))
        .filter(account_cards::review_type.eq(review_type))
        .select(account_cards::card_id);

    // Catalog entries the account has never reviewed. A card listed in
    // several decks counts once.
    let new: i64 = card_list::table
        .inner_join(cards::table)
        .filter(cards::card_type.eq(card_type))
        .filter(cards::active.eq(true))
        .filter(card_list::review_type.eq(review_type))
        .filter(card_list::active.eq(true))
        .filter(not(card_list::card_id.eq_any(known_cards)))
        .select(count_distinct(card_list::card_id))
        .get_result(conn)?;

    Ok(LearningProgress {
        new,
        learning,
        mature,
    })
}

/// Buckets upcoming due counts per calendar day, from the client's day
/// forward. Anything already overdue lands in the first bucket.
pub fn due_projection(
    conn: &mut SqliteConnection,
    account_id: i32,
    limit_days: i32,
    current_date: NaiveDate,
) -> Result<Vec<DailyReviews>, ApiError> {
    if limit_days < 1 || limit_days > constants::MAX_LIMIT_REVIEWS {
        return Err(ApiError::Validation(codes::ERR_INVALID_LIMIT));
    }

    let horizon = days_from(current_date, limit_days);
    let due_dates: Vec<NaiveDate> = account_cards::table
        .filter(account_cards::account_id.eq(account_id))
        .filter(account_cards::due_at.le(horizon))
        .select(account_cards::due_at)
        .load(conn)?;

    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for due_at in due_dates {
        let day = due_at.max(current_date);
        *buckets.entry(day).or_insert(0) += 1;
    }

    Ok(buckets
        .into_iter()
        .map(|(date, reviews)| DailyReviews { date, reviews })
        .collect())
}

/// Past review counts per day, newest day first.
pub fn review_history(
    conn: &mut SqliteConnection,
    account_id: i32,
    limit_days: i32,
) -> Result<Vec<DailyReviews>, ApiError> {
    if limit_days < 1 || limit_days > constants::MAX_LIMIT_REVIEWS {
        return Err(ApiError::Validation(codes::ERR_INVALID_LIMIT));
    }

    let rows: Vec<(NaiveDate, i64)> = account_reviews::table
        .filter(account_reviews::account_id.eq(account_id))
        .group_by(account_reviews::created_at)
        .select((account_reviews::created_at, count_star()))
        .order(account_reviews::created_at.desc())
        .limit(limit_days as i64)
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(date, reviews)| DailyReviews { date, reviews })
        .collect())
}

#[axum::debug_handler]
pub async fn learning_statistics_handler(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Query(params): Query<StatisticsParams>,
) -> Result<Json<LearningProgress>, ApiError> {
    let account_id = current_account_id(&session).await?;
    let mut conn = pool.get()?;
    let stats = learning_statistics(&mut conn, account_id, params.card_type, params.review_type)?;
    Ok(Json(stats))
}

#[axum::debug_handler]
pub async fn due_projection_handler(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Query(params): Query<ProjectionParams>,
) -> Result<Json<Vec<DailyReviews>>, ApiError> {
    let account_id = current_account_id(&session).await?;
    let current_date = parse_client_date(&params.date)?;
    let mut conn = pool.get()?;
    let projection = due_projection(&mut conn, account_id, params.limit_days, current_date)?;
    Ok(Json(projection))
}

#[axum::debug_handler]
pub async fn review_history_handler(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<DailyReviews>>, ApiError> {
    let account_id = current_account_id(&session).await?;
    let mut conn = pool.get()?;
    let history = review_history(&mut conn, account_id, params.limit_days)?;
    Ok(Json(history))
}
