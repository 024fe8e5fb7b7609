use super::{Player, UciOptions};
use crate::io::Io;
use anyhow::{Context, Error as Anyhow};
use async_trait::async_trait;
use derive_more::{Display, Error, From};
use shakmaty as sm;
use sm::Position as _;
use std::fmt::{self, Debug};
use std::{future::Future, io, pin::Pin, time::Duration};
use tokio::{runtime, task::block_in_place};
use tracing::{error, instrument};
use vampirc_uci::{self as uci, UciFen, UciMessage};

enum Lazy<T, E> {
    Initialized(T),
    Uninitialized(Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>),
}

impl<T: Debug, E> Debug for Lazy<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lazy::Initialized(v) => write!(f, "Lazy({v:?})"),
            Lazy::Uninitialized(_) => write!(f, "Lazy(?)"),
        }
    }
}

impl<T, E> Lazy<T, E> {
    async fn get_or_init(&mut self) -> Result<&mut T, E> {
        match self {
            Lazy::Initialized(v) => Ok(v),
            Lazy::Uninitialized(f) => {
                *self = Lazy::Initialized(f.await?);
                match self {
                    Lazy::Initialized(v) => Ok(v),
                    Lazy::Uninitialized(_) => unreachable!(),
                }
            }
        }
    }
}

/// The reason why a move could not be received from the UCI server.
#[derive(Debug, Display, Error, From)]
#[display(fmt = "the UCI server encountered an error")]
pub struct UciError(#[from(forward)] io::Error);

/// A Universal Chess Interface client for an external engine.
pub struct Uci<T: Io> {
    io: Lazy<T, UciError>,
    movetime: Duration,
}

impl<T: Io + Send + 'static> Uci<T> {
    /// Constructs [`Uci`] with the given time per move and engine options.
    ///
    /// The handshake is deferred until the engine is first asked to play, so
    /// spawning a player is cheap. Strength options such as `Skill Level` or
    /// `UCI_Elo` go through the option map verbatim.
    pub fn new(mut io: T, movetime: Duration, options: UciOptions) -> Self {
        Uci {
            movetime,
            io: Lazy::Uninitialized(Box::pin(async move {
                io.send(&UciMessage::Uci.to_string()).await?;
                io.flush().await?;

                while !matches!(uci::parse_one(io.recv().await?.trim()), UciMessage::UciOk) {}

                for (name, value) in options {
                    let set_option = UciMessage::SetOption { name, value };
                    io.send(&set_option.to_string()).await?;
                }

                io.send(&UciMessage::UciNewGame.to_string()).await?;
                io.send(&UciMessage::IsReady.to_string()).await?;
                io.flush().await?;

                while !matches!(uci::parse_one(io.recv().await?.trim()), UciMessage::ReadyOk) {}

                Ok(io)
            })),
        }
    }

    async fn go(&mut self, pos: &sm::Chess) -> Result<(), UciError> {
        let setup = pos.clone().into_setup(sm::EnPassantMode::Always);

        let position = UciMessage::Position {
            startpos: false,
            fen: Some(UciFen(sm::fen::Fen(setup).to_string())),
            moves: Vec::new(),
        };

        let go = UciMessage::go_movetime(
            uci::Duration::from_std(self.movetime).unwrap_or_else(|_| uci::Duration::max_value()),
        );

        let io = self.io.get_or_init().await?;
        io.send(&position.to_string()).await?;
        io.send(&go.to_string()).await?;
        io.flush().await?;

        Ok(())
    }
}

impl<T: Io> Drop for Uci<T> {
    #[instrument(level = "trace", skip(self))]
    fn drop(&mut self) {
        let result: Result<(), Anyhow> = block_in_place(|| {
            runtime::Handle::try_current()?.block_on(async {
                let io = self.io.get_or_init().await?;
                io.send(&UciMessage::Stop.to_string()).await?;
                io.send(&UciMessage::Quit.to_string()).await?;
                io.flush().await?;
                Ok(())
            })
        });

        if let Err(e) = result.context("failed to gracefully shutdown the uci engine") {
            error!("{:?}", e);
        }
    }
}

#[async_trait]
impl<T: Io + Send + 'static> Player for Uci<T> {
    type Error = UciError;

    #[instrument(level = "debug", skip_all, ret(Display), err)]
    async fn play(&mut self, pos: &sm::Chess) -> Result<sm::uci::Uci, UciError> {
        self.go(pos).await?;

        let io = self.io.get_or_init().await?;

        loop {
            if let UciMessage::BestMove { best_move: m, .. } =
                uci::parse_one(io.recv().await?.trim())
            {
                break m
                    .to_string()
                    .parse()
                    .map_err(|e| UciError(io::Error::new(io::ErrorKind::InvalidData, e)));
            }
        }
    }
}
