use crate::io::{Pipe, Process};
use async_trait::async_trait;
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use shakmaty as sm;
use std::collections::HashMap;
use std::{io, str::FromStr, time::Duration};
use tokio::io::{Stdin, Stdout};

mod terminal;
mod uci;

pub use terminal::*;
pub use uci::*;

#[cfg(test)]
use proptest::prelude::*;

#[cfg(test)]
use test_strategy::Arbitrary;

/// Trait for types that choose chess moves.
#[async_trait]
#[cfg_attr(test, mockall::automock(type Error = String;))]
pub trait Player {
    /// The reason why a move could not be chosen.
    type Error;

    /// Proposes the next move in the given position.
    async fn play(&mut self, pos: &sm::Chess) -> Result<sm::uci::Uci, Self::Error>;

    /// Whether this player may be asked again after an illegal proposal.
    fn interactive(&self) -> bool {
        false
    }
}

pub type UciOptions = HashMap<String, Option<String>>;

/// The reason why parsing player configuration failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display(fmt = "failed to parse player configuration")]
pub struct ParsePlayerConfigError(ron::de::SpannedError);

/// Runtime configuration for a player.
#[derive(Debug, Display, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[cfg_attr(test, derive(Arbitrary))]
#[serde(deny_unknown_fields, rename_all = "lowercase")]
pub enum PlayerConfig {
    /// Prompts a human for moves on the standard streams.
    #[display(fmt = "{}", "ron::ser::to_string(self).unwrap()")]
    Terminal,

    /// Spawns a UCI engine.
    #[display(fmt = "{}", "ron::ser::to_string(self).unwrap()")]
    Uci(
        String,
        #[serde(default = "PlayerConfig::default_movetime", with = "humantime_serde")]
        #[cfg_attr(test, strategy((1..60_000u64).prop_map(Duration::from_millis)))]
        Duration,
        #[serde(default)] UciOptions,
    ),
}

impl PlayerConfig {
    fn default_movetime() -> Duration {
        Duration::from_secs(5)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig::Terminal
    }
}

impl FromStr for PlayerConfig {
    type Err = ParsePlayerConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}

/// The reason why the actor failed to choose a move.
#[derive(Debug, Display, Error, From)]
pub enum ActorError {
    Terminal(io::Error),
    Uci(UciError),
}

/// A generic player.
#[derive(From)]
pub enum Actor {
    Terminal(Terminal<Pipe<Stdout, Stdin>>),
    Uci(Uci<Process>),
}

#[async_trait]
impl Player for Actor {
    type Error = ActorError;

    async fn play(&mut self, pos: &sm::Chess) -> Result<sm::uci::Uci, Self::Error> {
        match self {
            Actor::Terminal(p) => Ok(p.play(pos).await?),
            Actor::Uci(p) => Ok(p.play(pos).await?),
        }
    }

    fn interactive(&self) -> bool {
        matches!(self, Actor::Terminal(_))
    }
}
