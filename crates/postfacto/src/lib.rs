//! Postfacto relay - the outbound half of retroslash.
//!
//! A retro item submission is one or two stateless HTTP round trips: an
//! optional login for a bearer token (only when the target board has a
//! password), then the item creation itself. Nothing is retried and no token
//! outlives a single [`RetroService::add`] call.

pub mod client;

use async_trait::async_trait;
use retroslash_core::channels::RetroTarget;
use serde::Serialize;
use thiserror::Error;

pub use client::RetroClient;

/// Sentiment tag for a retro item, matching the categories the Postfacto
/// board renders as columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Happy,
    Meh,
    Sad,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Meh => "meh",
            Self::Sad => "sad",
        }
    }
}

/// One retro board entry, sent once and then discarded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RetroItem {
    pub description: String,
    pub category: Category,
}

#[derive(Debug, Error)]
pub enum RetroError {
    #[error("failed sending token request: {0}")]
    TokenRequest(#[source] reqwest::Error),
    #[error("failed to decode token response: {0}")]
    TokenDecode(#[source] reqwest::Error),
    #[error("failed sending retro item request: {0}")]
    ItemRequest(#[source] reqwest::Error),
    #[error("unexpected response code ({status}) - {dump}")]
    UnexpectedStatus { status: u16, dump: String },
}

/// Seam between the command interpreter and the wire. The production
/// implementation is [`RetroClient`]; tests substitute recording fakes.
#[async_trait]
pub trait RetroService: Send + Sync {
    async fn add(&self, target: &RetroTarget, item: RetroItem) -> Result<(), RetroError>;
}
