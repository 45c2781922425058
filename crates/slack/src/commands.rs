use retroslash_core::channels::{ChannelConfig, ChannelDirectory, RetroTarget};
use retroslash_postfacto::{Category, RetroError, RetroItem, RetroService};
use thiserror::Error;
use tracing::{debug, warn};

/// Fixed confirmation returned for every successful submission.
const REPLY_ITEM_ADDED: &str = "retro item added";

/// Parsed slash-command webhook, one per call. `command` is the slash verb
/// itself (e.g. `/retro`) and `text` everything typed after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub channel_id: String,
    pub channel_name: String,
    pub user_name: String,
    pub command: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum HandleError {
    #[error("must be in the form of '{command} [happy/meh/sad/tech] [message]'")]
    Usage { command: String },
    #[error("channel '{name}' with ID '{id}' is not configured")]
    UnknownChannel { name: String, id: String },
    #[error("unknown command: must provide one of 'happy', 'meh', 'sad' or 'tech'")]
    UnknownKeyword,
    #[error("retro target is not set")]
    TargetUnset,
    #[error(transparent)]
    Retro(#[from] RetroError),
}

/// Which of the channel's two boards a keyword addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TargetSelector {
    Primary,
    Tech,
}

/// Closed keyword table. Matching is exact: no case folding, no trimming
/// beyond the single keyword/description split. `tech` maps to the meh
/// column of the tech board.
fn classify_keyword(keyword: &str) -> Option<(Category, TargetSelector)> {
    match keyword {
        "happy" => Some((Category::Happy, TargetSelector::Primary)),
        "meh" => Some((Category::Meh, TargetSelector::Primary)),
        "sad" => Some((Category::Sad, TargetSelector::Primary)),
        "tech" => Some((Category::Meh, TargetSelector::Tech)),
        _ => None,
    }
}

/// Interprets slash commands against the channel directory and relays the
/// resulting item through `S`. Carries no mutable state; concurrent calls
/// are fully independent.
pub struct CommandDelegate<S> {
    directory: ChannelDirectory,
    service: S,
}

impl<S: RetroService> CommandDelegate<S> {
    pub fn new(directory: ChannelDirectory, service: S) -> Self {
        Self { directory, service }
    }

    pub async fn handle(&self, payload: &SlashCommandPayload) -> Result<String, HandleError> {
        let (keyword, description) = payload
            .text
            .split_once(' ')
            .ok_or_else(|| HandleError::Usage { command: payload.command.clone() })?;

        let channel = self.directory.lookup(&payload.channel_id).ok_or_else(|| {
            HandleError::UnknownChannel {
                name: payload.channel_name.clone(),
                id: payload.channel_id.clone(),
            }
        })?;

        let (category, selector) = classify_keyword(keyword).ok_or(HandleError::UnknownKeyword)?;
        let target = select_target(channel_targets(channel, selector))?;

        let item = RetroItem {
            description: format!("{description} [{}]", payload.user_name),
            category,
        };

        debug!(
            event_name = "slack.command.accepted",
            channel_id = %payload.channel_id,
            keyword,
            board = %target.board(),
            "relaying retro item"
        );
        self.service.add(target, item).await.map_err(|error| {
            warn!(
                event_name = "slack.command.relay_failed",
                channel_id = %payload.channel_id,
                error = %error,
                "retro relay failed"
            );
            HandleError::from(error)
        })?;

        Ok(REPLY_ITEM_ADDED.to_owned())
    }

    /// Renders a handled command as the webhook reply text. Errors are
    /// propagated verbatim; there is no generic internal-error masking.
    pub async fn reply(&self, payload: &SlashCommandPayload) -> String {
        match self.handle(payload).await {
            Ok(text) => text,
            Err(error) => error.to_string(),
        }
    }
}

fn channel_targets(channel: &ChannelConfig, selector: TargetSelector) -> Option<&RetroTarget> {
    match selector {
        TargetSelector::Primary => channel.retro.as_ref(),
        TargetSelector::Tech => channel.tech.as_ref(),
    }
}

fn select_target(target: Option<&RetroTarget>) -> Result<&RetroTarget, HandleError> {
    target.filter(|target| target.is_set()).ok_or(HandleError::TargetUnset)
}
