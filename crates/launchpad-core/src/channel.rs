// crates/launchpad-core/src/channel.rs
//
// Distribution channels. Every channel shares the same catalog and artifact
// logic; the channel only selects which namespace an operation touches.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReleaseError;

/// A named distribution stream with its own catalog and artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// The game build.
    Game,
    /// The launcher that installs and updates the game.
    Launcher,
}

impl Channel {
    /// Every channel, in a fixed order.
    pub const ALL: [Channel; 2] = [Channel::Game, Channel::Launcher];

    /// Short lowercase name, also used as the artifact file prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Game => "game",
            Channel::Launcher => "launcher",
        }
    }

    /// File name of this channel's catalog document inside the data directory.
    ///
    /// These are the names existing deployments already have on disk.
    pub fn catalog_file_name(&self) -> &'static str {
        match self {
            Channel::Game => "versions.json",
            Channel::Launcher => "launcher_versions.json",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "game" => Ok(Channel::Game),
            "launcher" => Ok(Channel::Launcher),
            other => Err(ReleaseError::NotFound(format!("unknown channel: {}", other))),
        }
    }
}
