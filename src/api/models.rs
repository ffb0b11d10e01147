//! Wire types for the board service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::deserialize_day;

#[derive(Debug, Clone, Deserialize)]
pub struct CardDto {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub list_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_day")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_day")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListDto {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub board_id: Option<i64>,
    #[serde(default)]
    pub cards: Vec<CardDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardDto {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub lists: Vec<ListDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenDto {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".into()
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBoard<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
}

/// Body for list and card creation, and list renames.
#[derive(Debug, Clone, Serialize)]
pub struct Titled<'a> {
    pub title: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Invite<'a> {
    pub email: &'a str,
}

/// Partial card update. Absent fields are left alone by the server;
/// `due_date: Some(None)` is sent as `null` and clears the date.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl CardUpdate {
    pub fn completed(completed: bool) -> Self {
        CardUpdate { completed: Some(completed), ..Default::default() }
    }

    pub fn due_date(due: Option<NaiveDate>) -> Self {
        CardUpdate { due_date: Some(due), ..Default::default() }
    }
}

/// Decode the board listing, coercing anything that is not an array of
/// boards into as much as can be salvaged.
pub fn boards_from_value(value: serde_json::Value) -> Vec<BoardDto> {
    let serde_json::Value::Array(items) = value else {
        log::warn!("board listing is not an array, treating as empty");
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<BoardDto>(item) {
            Ok(board) => Some(board),
            Err(e) => {
                log::warn!("skipping malformed board entry: {}", e);
                None
            }
        })
        .collect()
}
