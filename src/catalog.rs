//! Shared lookups against the externally-owned catalog and account
//! tables. The engine reads these; it never writes them.

use diesel::dsl::exists;
use diesel::prelude::*;

use crate::error::{codes, ApiError};
use crate::schema::{accounts, cards, decks};

/// Confirms the deck exists and is active, returning its member gate.
pub fn find_deck(conn: &mut SqliteConnection, deck_id: i32) -> Result<bool, ApiError> {
    decks::table
        .filter(decks::id.eq(deck_id))
        .filter(decks::active.eq(true))
        .select(decks::member_only)
        .first::<bool>(conn)
        .optional()?
        .ok_or(ApiError::NotFound(codes::ERR_DECK_NOT_FOUND))
}

/// Membership entitlement of an account.
pub fn account_is_member(conn: &mut SqliteConnection, account_id: i32) -> Result<bool, ApiError> {
    accounts::table
        .filter(accounts::id.eq(account_id))
        .select(accounts::member)
        .first::<bool>(conn)
        .optional()?
        .ok_or(ApiError::NotFound(codes::ERR_ACCOUNT_NOT_FOUND))
}

/// Whether an active card with this id exists in the catalog.
pub fn card_exists(conn: &mut SqliteConnection, card_id: i32) -> Result<bool, ApiError> {
    diesel::select(exists(
        cards::table
            .filter(cards::id.eq(card_id))
            .filter(cards::active.eq(true)),
    ))
    .get_result(conn)
    .map_err(Into::into)
}
