//! Shared helpers for the engine tests: an in-memory database with the
//! real schema, plus seeders for the externally-owned tables.

use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;

use crate::schema::{account_cards, account_reviews, accounts, card_list, cards, decks};

const SCHEMA_SQL: &str = include_str!("../migrations/2025-07-12-000000_scheduling_tables/up.sql");

pub fn test_conn() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:").expect("in-memory database");
    conn.batch_execute(SCHEMA_SQL).expect("schema setup");
    conn
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date")
}

pub fn seed_account(conn: &mut SqliteConnection, id: i32, member: bool) {
    diesel::insert_into(accounts::table)
        .values((accounts::id.eq(id), accounts::member.eq(member)))
        .execute(conn)
        .expect("seed account");
}

pub fn seed_deck(conn: &mut SqliteConnection, id: i32, member_only: bool) {
    diesel::insert_into(decks::table)
        .values((
            decks::id.eq(id),
            decks::name.eq(format!("Deck {id}")),
            decks::member_only.eq(member_only),
            decks::active.eq(true),
        ))
        .execute(conn)
        .expect("seed deck");
}

pub fn seed_card(conn: &mut SqliteConnection, id: i32, card_type: &str) {
    diesel::insert_into(cards::table)
        .values((
            cards::id.eq(id),
            cards::card_type.eq(card_type),
            cards::active.eq(true),
        ))
        .execute(conn)
        .expect("seed card");
}

pub fn seed_card_list(
    conn: &mut SqliteConnection,
    deck_id: i32,
    card_id: i32,
    review_type: &str,
    learning_order: i32,
) {
    diesel::insert_into(card_list::table)
        .values((
            card_list::deck_id.eq(deck_id),
            card_list::card_id.eq(card_id),
            card_list::review_type.eq(review_type),
            card_list::learning_order.eq(learning_order),
            card_list::active.eq(true),
        ))
        .execute(conn)
        .expect("seed card list entry");
}

pub fn deactivate_card_list_entry(
    conn: &mut SqliteConnection,
    deck_id: i32,
    card_id: i32,
    review_type: &str,
) {
    diesel::update(
        card_list::table
            .filter(card_list::deck_id.eq(deck_id))
            .filter(card_list::card_id.eq(card_id))
            .filter(card_list::review_type.eq(review_type)),
    )
    .set(card_list::active.eq(false))
    .execute(conn)
    .expect("deactivate card list entry");
}

/// Inserts a bare scheduling record with the given due date.
pub fn seed_account_card(
    conn: &mut SqliteConnection,
    account_id: i32,
    card_id: i32,
    review_type: &str,
    due_at: NaiveDate,
) {
    diesel::insert_into(account_cards::table)
        .values((
            account_cards::account_id.eq(account_id),
            account_cards::card_id.eq(card_id),
            account_cards::review_type.eq(review_type),
            account_cards::review_count.eq(1),
            account_cards::easy_factor.eq(2.5),
            account_cards::due_at.eq(due_at),
            account_cards::mature.eq(false),
        ))
        .execute(conn)
        .expect("seed account card");
}

/// Appends a ledger row directly, bypassing the rescheduler.
pub fn seed_review(
    conn: &mut SqliteConnection,
    account_id: i32,
    card_id: i32,
    review_type: &str,
    extra_review: bool,
    new_card: bool,
    created_at: NaiveDate,
) {
    diesel::insert_into(account_reviews::table)
        .values((
            account_reviews::account_id.eq(account_id),
            account_reviews::card_id.eq(card_id),
            account_reviews::review_type.eq(review_type),
            account_reviews::result.eq("GOOD"),
            account_reviews::extra_review.eq(extra_review),
            account_reviews::new_card.eq(new_card),
            account_reviews::created_at.eq(created_at),
        ))
        .execute(conn)
        .expect("seed review");
}
