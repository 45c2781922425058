//! Channel directory: the static map from Slack channel id to retro board
//! targets.
//!
//! The directory is built once at startup from the configuration payload and
//! never mutated afterwards. Validation of individual targets is deferred to
//! lookup time: a target whose board ref is an empty slug or a zero id parses
//! fine but reports itself as unset, and an empty password means the board
//! requires no authentication.

use std::collections::HashMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Identifies a retro board on the Postfacto side, either by URL slug or by
/// numeric id. Deployments use one or the other, never both.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BoardRef {
    Id(u64),
    Slug(String),
}

impl fmt::Display for BoardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Slug(slug) => f.write_str(slug),
        }
    }
}

/// A single addressable retro board plus its optional password.
#[derive(Clone, Debug, Deserialize)]
pub struct RetroTarget {
    board: BoardRef,
    #[serde(default)]
    password: Option<SecretString>,
}

impl RetroTarget {
    pub fn new(board: BoardRef, password: Option<&str>) -> Self {
        Self { board, password: password.map(|value| value.to_owned().into()) }
    }

    pub fn board(&self) -> &BoardRef {
        &self.board
    }

    /// Whether the board ref is usable. Empty slugs and zero ids are the
    /// "present but unset" shape the config payload allows.
    pub fn is_set(&self) -> bool {
        match &self.board {
            BoardRef::Id(id) => *id != 0,
            BoardRef::Slug(slug) => !slug.is_empty(),
        }
    }

    /// The board password, treating an empty string as "no authentication".
    pub fn password(&self) -> Option<&str> {
        self.password
            .as_ref()
            .map(ExposeSecret::expose_secret)
            .filter(|value| !value.is_empty())
    }
}

/// Per-channel configuration: a display name plus the primary retro target
/// and an optional secondary "tech" target with its own password.
#[derive(Clone, Debug, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    #[serde(default)]
    pub retro: Option<RetroTarget>,
    #[serde(default)]
    pub tech: Option<RetroTarget>,
}

/// Read-only map from Slack channel id to [`ChannelConfig`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChannelDirectory(HashMap<String, ChannelConfig>);

impl ChannelDirectory {
    pub fn new(entries: HashMap<String, ChannelConfig>) -> Self {
        Self(entries)
    }

    /// Parses the single-env-var JSON payload shape, e.g.
    /// `{"C024BE91L": {"name": "team-a", "retro": {"board": "team-a-retro"}}}`.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn lookup(&self, channel_id: &str) -> Option<&ChannelConfig> {
        self.0.get(channel_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardRef, ChannelDirectory, RetroTarget};

    #[test]
    fn parses_slug_and_id_board_refs_from_json() {
        let directory = ChannelDirectory::from_json(
            r#"{
                "C1": {"name": "team-a", "retro": {"board": "team-a-retro", "password": "pw"}},
                "C2": {"name": "team-b", "retro": {"board": 42}}
            }"#,
        )
        .expect("payload should parse");

        let team_a = directory.lookup("C1").expect("C1 configured");
        let retro = team_a.retro.as_ref().expect("retro target");
        assert_eq!(retro.board(), &BoardRef::Slug("team-a-retro".to_owned()));
        assert_eq!(retro.password(), Some("pw"));

        let team_b = directory.lookup("C2").expect("C2 configured");
        let retro = team_b.retro.as_ref().expect("retro target");
        assert_eq!(retro.board(), &BoardRef::Id(42));
        assert_eq!(retro.password(), None);
    }

    #[test]
    fn lookup_misses_unknown_channels() {
        let directory = ChannelDirectory::default();
        assert!(directory.lookup("C404").is_none());
        assert!(directory.is_empty());
    }

    #[test]
    fn empty_slug_and_zero_id_targets_report_unset() {
        assert!(!RetroTarget::new(BoardRef::Slug(String::new()), None).is_set());
        assert!(!RetroTarget::new(BoardRef::Id(0), None).is_set());
        assert!(RetroTarget::new(BoardRef::Slug("retro".to_owned()), None).is_set());
        assert!(RetroTarget::new(BoardRef::Id(7), None).is_set());
    }

    #[test]
    fn empty_password_means_no_authentication() {
        let target = RetroTarget::new(BoardRef::Id(7), Some(""));
        assert_eq!(target.password(), None);

        let target = RetroTarget::new(BoardRef::Id(7), None);
        assert_eq!(target.password(), None);
    }

    #[test]
    fn tech_target_is_optional_and_parses_with_its_own_password() {
        let directory = ChannelDirectory::from_json(
            r#"{"C1": {
                "name": "team-a",
                "retro": {"board": "main"},
                "tech": {"board": "tech", "password": "tech-pw"}
            }}"#,
        )
        .expect("payload should parse");

        let channel = directory.lookup("C1").expect("configured");
        let tech = channel.tech.as_ref().expect("tech target");
        assert_eq!(tech.board(), &BoardRef::Slug("tech".to_owned()));
        assert_eq!(tech.password(), Some("tech-pw"));
        assert_eq!(channel.retro.as_ref().expect("retro").password(), None);
    }
}
