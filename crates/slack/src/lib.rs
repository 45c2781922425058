//! Slack slash-command interpretation.
//!
//! The transport hands over one [`SlashCommandPayload`] per webhook call;
//! [`CommandDelegate::handle`] turns it into a retro board submission and a
//! reply string. Every failure is user-visible: the error message *is* the
//! reply.

pub mod commands;

pub use commands::{CommandDelegate, HandleError, SlashCommandPayload};
