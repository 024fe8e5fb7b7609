use super::Player;
use crate::io::Io;
use async_trait::async_trait;
use derive_more::Constructor;
use shakmaty as sm;
use sm::{Board, File, Position as _, Rank, Square};
use std::fmt::{self, Display};
use std::io;
use tracing::instrument;

/// A player that prompts a human for moves over an [`Io`] link.
#[derive(Debug, Constructor)]
pub struct Terminal<T: Io> {
    io: T,
}

#[async_trait]
impl<T: Io + Send> Player for Terminal<T> {
    type Error = io::Error;

    #[instrument(level = "trace", skip(self, pos), err)]
    async fn play(&mut self, pos: &sm::Chess) -> io::Result<sm::uci::Uci> {
        self.io.send(&Grid(pos.board()).to_string()).await?;

        self.io
            .send("enter a move in pure coordinate notation (e.g. e2e4):")
            .await?;

        loop {
            self.io.flush().await?;
            let line = self.io.recv().await?;

            match line.trim().parse() {
                Ok(m) => break Ok(m),
                Err(e) => self.io.send(&format!("{e}, try again:")).await?,
            }
        }
    }

    fn interactive(&self) -> bool {
        true
    }
}

/// Renders the board the way the human sees it.
struct Grid<'a>(&'a Board);

impl Display for Grid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   +---+---+---+---+---+---+---+---+")?;

        for rank in Rank::ALL.into_iter().rev() {
            write!(f, " {} |", rank.char())?;

            for file in File::ALL {
                match self.0.piece_at(Square::from_coords(file, rank)) {
                    Some(piece) => write!(f, " {} |", piece.char())?,
                    None => write!(f, "   |")?,
                }
            }

            writeln!(f)?;
            writeln!(f, "   +---+---+---+---+---+---+---+---+")?;
        }

        write!(f, "  ")?;
        for file in File::ALL {
            write!(f, "   {}", file.char())?;
        }

        Ok(())
    }
}
