//! Access to the board service.
//!
//! [`BoardApi`] is the seam the view model talks through; [`client::ApiClient`]
//! implements it over HTTP and also carries the unauthenticated login and
//! registration calls.

pub mod client;
pub mod models;

use crate::error::AppResult;
use models::{BoardDto, CardDto, CardUpdate, ListDto};

/// Board, list and card operations against the remote service.
///
/// Every call is a single blocking request; there is no batching or retry.
pub trait BoardApi {
    /// All boards visible to the current user, with nested lists and cards.
    fn fetch_boards(&self) -> AppResult<Vec<BoardDto>>;

    fn fetch_board(&self, board_id: i64) -> AppResult<BoardDto>;

    fn fetch_lists(&self, board_id: i64) -> AppResult<Vec<ListDto>>;

    fn create_board(&self, title: &str, description: Option<&str>) -> AppResult<BoardDto>;

    fn delete_board(&self, board_id: i64) -> AppResult<()>;

    fn create_list(&self, board_id: i64, title: &str) -> AppResult<ListDto>;

    fn update_list(&self, list_id: i64, title: &str) -> AppResult<ListDto>;

    fn delete_list(&self, list_id: i64) -> AppResult<()>;

    fn create_card(&self, list_id: i64, title: &str) -> AppResult<CardDto>;

    /// Partial update; returns the card as stored by the server.
    fn update_card(&self, card_id: i64, update: &CardUpdate) -> AppResult<CardDto>;

    fn delete_card(&self, card_id: i64) -> AppResult<()>;

    fn invite_member(&self, board_id: i64, email: &str) -> AppResult<()>;
}
