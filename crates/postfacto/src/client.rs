//! Reqwest-backed Postfacto client.
//!
//! Endpoint shapes:
//! - `PUT {api_url}/retros/{board}/login` with `{"retro":{"password":..}}`,
//!   answered by `{"token":..}`
//! - `POST {api_url}/retros/{board}/items` with `{"description":..,"category":..}`,
//!   success is exactly 201 Created

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use retroslash_core::channels::RetroTarget;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RetroError, RetroItem, RetroService};

#[derive(Clone, Debug)]
pub struct RetroClient {
    api_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    retro: RetroCredentials<'a>,
}

#[derive(Debug, Serialize)]
struct RetroCredentials<'a> {
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

impl RetroClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_http_client(api_url, reqwest::Client::new())
    }

    pub fn with_http_client(api_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self { api_url: api_url.into(), http }
    }

    async fn login(&self, retro_url: &str, password: &str) -> Result<String, RetroError> {
        let response = self
            .http
            .put(format!("{retro_url}/login"))
            .header(ACCEPT, "application/json")
            .json(&TokenRequest { retro: RetroCredentials { password } })
            .send()
            .await
            .map_err(RetroError::TokenRequest)?;

        // The token is decoded regardless of status; a rejected login shows
        // up as an undecodable body rather than a status check.
        let token_response =
            response.json::<TokenResponse>().await.map_err(RetroError::TokenDecode)?;
        Ok(token_response.token)
    }
}

#[async_trait]
impl RetroService for RetroClient {
    async fn add(&self, target: &RetroTarget, item: RetroItem) -> Result<(), RetroError> {
        let retro_url = format!("{}/retros/{}", self.api_url, target.board());

        let mut token = None;
        if let Some(password) = target.password() {
            token = Some(self.login(&retro_url, password).await?);
        }

        let mut request = self
            .http
            .post(format!("{retro_url}/items"))
            .header(ACCEPT, "application/json")
            .json(&item);
        if let Some(token) = token.filter(|token| !token.is_empty()) {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(RetroError::ItemRequest)?;
        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(RetroError::UnexpectedStatus {
                status: status.as_u16(),
                dump: dump_response(response).await,
            });
        }

        debug!(
            event_name = "postfacto.item_added",
            board = %target.board(),
            category = item.category.as_str(),
            "retro item accepted"
        );
        Ok(())
    }
}

/// Renders status line, headers and body of an unexpected response so the
/// failure reply carries enough to diagnose the upstream.
async fn dump_response(response: Response) -> String {
    let mut dump = format!(
        "{:?} {}\r\n",
        response.version(),
        response.status(),
    );
    for (name, value) in response.headers() {
        dump.push_str(name.as_str());
        dump.push_str(": ");
        dump.push_str(value.to_str().unwrap_or("<non-ascii>"));
        dump.push_str("\r\n");
    }
    dump.push_str("\r\n");
    dump.push_str(&response.text().await.unwrap_or_default());
    dump
}

#[cfg(test)]
mod tests {
    use retroslash_core::channels::{BoardRef, RetroTarget};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::RetroClient;
    use crate::{Category, RetroError, RetroItem, RetroService};

    fn item(description: &str, category: Category) -> RetroItem {
        RetroItem { description: description.to_owned(), category }
    }

    #[tokio::test]
    async fn add_without_password_posts_the_item_once_and_skips_login() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/retros/sprint-12/login"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/retros/sprint-12/items"))
            .and(header("content-type", "application/json"))
            .and(header("accept", "application/json"))
            .and(body_json(serde_json::json!({
                "description": "shipped the feature [alice]",
                "category": "happy"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = RetroClient::new(server.uri());
        let target = RetroTarget::new(BoardRef::Slug("sprint-12".to_owned()), None);

        client
            .add(&target, item("shipped the feature [alice]", Category::Happy))
            .await
            .expect("add should succeed on 201");
    }

    #[tokio::test]
    async fn add_with_password_logs_in_first_and_sends_the_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/retros/42/login"))
            .and(body_json(serde_json::json!({"retro": {"password": "s3cret"}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "tok-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/retros/42/items"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = RetroClient::new(server.uri());
        let target = RetroTarget::new(BoardRef::Id(42), Some("s3cret"));

        client
            .add(&target, item("flaky pipeline [bob]", Category::Meh))
            .await
            .expect("add should succeed after login");
    }

    #[tokio::test]
    async fn undecodable_login_response_aborts_before_the_items_request() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/retros/team-a/login"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/retros/team-a/items"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = RetroClient::new(server.uri());
        let target = RetroTarget::new(BoardRef::Slug("team-a".to_owned()), Some("pw"));

        let error = client
            .add(&target, item("d [carol]", Category::Sad))
            .await
            .err()
            .expect("login failure should abort the add");
        assert!(matches!(error, RetroError::TokenDecode(_)));
        assert!(error.to_string().starts_with("failed to decode token response"));
    }

    #[tokio::test]
    async fn non_201_item_response_is_an_error_carrying_the_status_and_dump() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/retros/team-a/items"))
            .respond_with(ResponseTemplate::new(200).set_body_string("unexpected ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = RetroClient::new(server.uri());
        let target = RetroTarget::new(BoardRef::Slug("team-a".to_owned()), None);

        let error = client
            .add(&target, item("d [dave]", Category::Happy))
            .await
            .err()
            .expect("non-201 should fail");

        let message = error.to_string();
        assert!(message.contains("unexpected response code (200)"));
        assert!(message.contains("unexpected ok"));
    }

    #[tokio::test]
    async fn empty_token_in_login_response_sends_no_authorization_header() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/retros/team-a/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": ""})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/retros/team-a/items"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = RetroClient::new(server.uri());
        let target = RetroTarget::new(BoardRef::Slug("team-a".to_owned()), Some("pw"));

        client
            .add(&target, item("d [erin]", Category::Meh))
            .await
            .expect("empty token still submits anonymously");
    }
}
