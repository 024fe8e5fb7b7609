use crate::io::{Pipe, Process};
use crate::player::{Actor, ActorError, PlayerConfig, Terminal, Uci, UciError};
use tokio::io::{stdin, stdout};

/// Trait for types that build other types.
pub trait Build {
    /// The type to be built.
    type Output;

    /// The reason why [`Build::Output`] could not be built.
    type Error;

    /// Build an instance of [`Build::Output`].
    fn build(self) -> Result<Self::Output, Self::Error>;
}

impl Build for PlayerConfig {
    type Output = Actor;
    type Error = ActorError;

    fn build(self) -> Result<Self::Output, Self::Error> {
        match self {
            PlayerConfig::Terminal => Ok(Terminal::new(Pipe::new(stdout(), stdin())).into()),

            PlayerConfig::Uci(path, movetime, options) => {
                let io = Process::spawn(&path).map_err(UciError::from)?;
                Ok(Uci::new(io, movetime, options).into())
            }
        }
    }
}
