use std::str::FromStr;

use chrono::NaiveDate;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use diesel::Queryable;
use serde::{Deserialize, Serialize};

/// Content type of a card. The scheduling state itself is type-agnostic;
/// the type only matters for catalog filtering and progress statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardType {
    Kanji,
    Word,
    Sentence,
}

/// Direction a card is studied in. One card can be scheduled separately
/// per review type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewType {
    Recall,
    Recognise,
    Write,
}

/// Grading outcome reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewResult {
    Again,
    Good,
}

/// Which study queue is being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueueMode {
    New,
    Due,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Kanji => "KANJI",
            CardType::Word => "WORD",
            CardType::Sentence => "SENTENCE",
        }
    }
}

impl ReviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewType::Recall => "RECALL",
            ReviewType::Recognise => "RECOGNISE",
            ReviewType::Write => "WRITE",
        }
    }
}

impl ReviewResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewResult::Again => "AGAIN",
            ReviewResult::Good => "GOOD",
        }
    }
}

impl FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KANJI" => Ok(CardType::Kanji),
            "WORD" => Ok(CardType::Word),
            "SENTENCE" => Ok(CardType::Sentence),
            other => Err(format!("unrecognised card type: {other}")),
        }
    }
}

impl FromStr for ReviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECALL" => Ok(ReviewType::Recall),
            "RECOGNISE" => Ok(ReviewType::Recognise),
            "WRITE" => Ok(ReviewType::Write),
            other => Err(format!("unrecognised review type: {other}")),
        }
    }
}

impl FromStr for ReviewResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AGAIN" => Ok(ReviewResult::Again),
            "GOOD" => Ok(ReviewResult::Good),
            other => Err(format!("unrecognised review result: {other}")),
        }
    }
}

macro_rules! text_enum_sql {
    ($ty:ty) => {
        impl ToSql<Text, Sqlite> for $ty {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Sqlite> for $ty {
            fn from_sql(bytes: SqliteValue<'_, '_, '_>) -> deserialize::Result<Self> {
                let raw = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
                raw.parse().map_err(|e: String| e.into())
            }
        }
    };
}

text_enum_sql!(CardType);
text_enum_sql!(ReviewType);
text_enum_sql!(ReviewResult);

/// Per-account scheduling state of one card in one review direction.
/// Unique on `(account_id, card_id, review_type)`.
#[derive(Debug, Serialize, Queryable)]
pub struct AccountCard {
    pub id: i32,
    pub account_id: i32,
    pub card_id: i32,
    pub review_type: ReviewType,
    pub review_count: i32,
    pub easy_factor: f64,
    pub due_at: NaiveDate,
    pub mature: bool,
    pub account_story: Option<String>,
    pub account_hint: Option<String>,
}

/// Per-account, per-deck study limits, created lazily with defaults.
#[derive(Debug, Serialize, Queryable)]
pub struct AccountDeckSettings {
    pub id: i32,
    pub account_id: i32,
    pub deck_id: i32,
    pub favorite: bool,
    pub review_interval: i32,
    pub reviews_per_day: i32,
    pub new_cards_per_day: i32,
}
