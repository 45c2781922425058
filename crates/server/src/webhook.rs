//! Inbound Slack slash-command webhook.
//!
//! Slack delivers slash commands as `application/x-www-form-urlencoded`
//! payloads carrying a shared verification token. A bad token is rejected
//! with 401 before the interpreter runs; everything past that point answers
//! 200 with an ephemeral reply, because interpreter errors are user-facing
//! reply text, not transport failures.

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use retroslash_postfacto::RetroService;
use retroslash_slack::{CommandDelegate, SlashCommandPayload};

pub struct WebhookState<S> {
    verification_token: SecretString,
    delegate: Arc<CommandDelegate<S>>,
}

impl<S> Clone for WebhookState<S> {
    fn clone(&self) -> Self {
        Self {
            verification_token: self.verification_token.clone(),
            delegate: Arc::clone(&self.delegate),
        }
    }
}

impl<S> WebhookState<S> {
    pub fn new(verification_token: SecretString, delegate: Arc<CommandDelegate<S>>) -> Self {
        Self { verification_token, delegate }
    }
}

/// Form fields Slack sends for a slash command. Everything defaults so a
/// sparse payload still deserializes and fails through normal validation.
#[derive(Debug, Default, Deserialize)]
pub struct SlashCommandForm {
    #[serde(default)]
    token: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    channel_name: String,
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    command: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct SlashReply {
    response_type: &'static str,
    text: String,
}

pub fn router<S: RetroService + 'static>(state: WebhookState<S>) -> Router {
    Router::new().route("/", post(slash_command::<S>)).with_state(state)
}

async fn slash_command<S: RetroService>(
    State(state): State<WebhookState<S>>,
    Form(form): Form<SlashCommandForm>,
) -> Response {
    if form.token != state.verification_token.expose_secret() {
        warn!(
            event_name = "slack.webhook.rejected",
            channel_id = %form.channel_id,
            "verification token mismatch"
        );
        return (StatusCode::UNAUTHORIZED, "invalid verification token").into_response();
    }

    let payload = SlashCommandPayload {
        channel_id: form.channel_id,
        channel_name: form.channel_name,
        user_name: form.user_name,
        command: form.command,
        text: form.text,
    };

    let text = state.delegate.reply(&payload).await;
    Json(SlashReply { response_type: "ephemeral", text }).into_response()
}
