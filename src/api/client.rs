//! Blocking HTTP client for the board service REST API.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::api::models::{
    boards_from_value, BoardDto, CardDto, CardUpdate, Credentials, Invite, ListDto, NewBoard,
    Titled, TokenDto, UserDto,
};
use crate::api::BoardApi;
use crate::error::{AppError, AppResult};
use crate::session::Session;

/// API client bound to a base URL and, once logged in, a session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Option<Session>,
}

impl ApiClient {
    /// Create a client for `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>, session: Option<Session>) -> AppResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> AppResult<RequestBuilder> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("not logged in".into()))?;
        Ok(builder.header(AUTHORIZATION, session.bearer()))
    }

    fn send(&self, builder: RequestBuilder) -> AppResult<Response> {
        let response = builder.send()?;
        check_status(response)
    }

    fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<T> {
        Ok(self.send(builder)?.json()?)
    }

    // ============================================
    // Authentication
    // ============================================

    /// Exchange credentials for a session. The server expects a form-encoded
    /// OAuth2 password request with the email as `username`.
    pub fn login(&self, email: &str, password: &str) -> AppResult<Session> {
        log::info!("logging in as {}", email);
        let builder = self
            .client
            .post(self.url("/api/auth/login"))
            .form(&[("username", email), ("password", password)]);
        let token: TokenDto = self.send_json(builder)?;
        log::debug!("received {} token", token.token_type);
        Ok(Session::new(token.access_token, Some(email.to_string())))
    }

    pub fn register(&self, email: &str, password: &str) -> AppResult<UserDto> {
        log::info!("registering {}", email);
        let builder = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&Credentials { email, password });
        self.send_json(builder)
    }

    pub fn me(&self) -> AppResult<UserDto> {
        let builder = self.authed(self.client.get(self.url("/api/users/me")))?;
        self.send_json(builder)
    }
}

impl BoardApi for ApiClient {
    fn fetch_boards(&self) -> AppResult<Vec<BoardDto>> {
        let builder = self.authed(self.client.get(self.url("/api/boards/")))?;
        let value: serde_json::Value = self.send_json(builder)?;
        Ok(boards_from_value(value))
    }

    fn fetch_board(&self, board_id: i64) -> AppResult<BoardDto> {
        let builder = self.authed(self.client.get(self.url(&format!("/api/boards/{}", board_id))))?;
        self.send_json(builder)
    }

    fn fetch_lists(&self, board_id: i64) -> AppResult<Vec<ListDto>> {
        let url = self.url(&format!("/api/boards/{}/lists/", board_id));
        let value: serde_json::Value = self.send_json(self.authed(self.client.get(url))?)?;
        Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            log::warn!("list listing for board {} malformed, treating as empty: {}", board_id, e);
            Vec::new()
        }))
    }

    fn create_board(&self, title: &str, description: Option<&str>) -> AppResult<BoardDto> {
        let builder = self
            .authed(self.client.post(self.url("/api/boards/")))?
            .json(&NewBoard { title, description });
        self.send_json(builder)
    }

    fn delete_board(&self, board_id: i64) -> AppResult<()> {
        let url = self.url(&format!("/api/boards/{}", board_id));
        self.send(self.authed(self.client.delete(url))?)?;
        Ok(())
    }

    fn create_list(&self, board_id: i64, title: &str) -> AppResult<ListDto> {
        let url = self.url(&format!("/api/boards/{}/lists/", board_id));
        let builder = self.authed(self.client.post(url))?.json(&Titled { title });
        self.send_json(builder)
    }

    fn update_list(&self, list_id: i64, title: &str) -> AppResult<ListDto> {
        let url = self.url(&format!("/api/lists/{}", list_id));
        let builder = self.authed(self.client.put(url))?.json(&Titled { title });
        self.send_json(builder)
    }

    fn delete_list(&self, list_id: i64) -> AppResult<()> {
        let url = self.url(&format!("/api/lists/{}", list_id));
        self.send(self.authed(self.client.delete(url))?)?;
        Ok(())
    }

    fn create_card(&self, list_id: i64, title: &str) -> AppResult<CardDto> {
        let url = self.url(&format!("/api/lists/{}/cards/", list_id));
        let builder = self.authed(self.client.post(url))?.json(&Titled { title });
        self.send_json(builder)
    }

    fn update_card(&self, card_id: i64, update: &CardUpdate) -> AppResult<CardDto> {
        let url = self.url(&format!("/api/cards/{}", card_id));
        let builder = self.authed(self.client.put(url))?.json(update);
        self.send_json(builder)
    }

    fn delete_card(&self, card_id: i64) -> AppResult<()> {
        let url = self.url(&format!("/api/cards/{}", card_id));
        self.send(self.authed(self.client.delete(url))?)?;
        Ok(())
    }

    fn invite_member(&self, board_id: i64, email: &str) -> AppResult<()> {
        let url = self.url(&format!("/api/boards/{}/members", board_id));
        self.send(self.authed(self.client.post(url))?.json(&Invite { email }))?;
        Ok(())
    }
}

/// Turn non-success responses into errors, reading the server's `detail`
/// message when it sends one.
fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let message = error_detail(&body);
    log::warn!("request failed with {}: {}", status, message);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Unauthorized(message)),
        _ => Err(AppError::Api { status: status.as_u16(), message }),
    }
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_prefers_detail_field() {
        assert_eq!(error_detail(r#"{"detail": "Card not found"}"#), "Card not found");
        assert_eq!(error_detail(" plain text \n"), "plain text");
        assert_eq!(error_detail(r#"{"detail": [1, 2]}"#), r#"{"detail": [1, 2]}"#);
    }

    #[test]
    fn test_unauthenticated_calls_fail_before_sending() {
        let client = ApiClient::new("http://127.0.0.1:9", None).unwrap();
        assert!(client.fetch_boards().unwrap_err().is_auth());
        assert!(client.me().unwrap_err().is_auth());
    }

    #[test]
    fn test_url_join() {
        let client = ApiClient::new("http://host:8000", Some(Session::new("t", None))).unwrap();
        assert_eq!(client.url("/api/boards/"), "http://host:8000/api/boards/");
    }
}
