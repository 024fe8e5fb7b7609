use super::{Action, Slots, SlotsExhausted};
use arrayvec::ArrayVec;
use derive_more::Deref;
use shakmaty::{Board, CastlingSide, Color, Move, Rank, Square};
use std::fmt;

/// The ordered sequence of [`Action`]s that realizes one chess move.
#[derive(Debug, Clone, PartialEq, Deref)]
pub struct Plan(ArrayVec<Action, 4>);

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for action in &self.0 {
            write!(f, "{sep}{action}")?;
            sep = ", ";
        }
        Ok(())
    }
}

impl Plan {
    /// Compiles a move into the actions that realize it on the board.
    ///
    /// `board` is the occupancy before the move is applied and `slots` the
    /// current state of the storage pool; neither is modified. Captured
    /// pieces are evacuated to the next free slot before anything else
    /// travels, so they never touch another square of the board. Promotions
    /// require no special handling, the piece merely changes role in place.
    pub fn compile(m: &Move, board: &Board, slots: &Slots) -> Result<Self, SlotsExhausted> {
        let mut actions = ArrayVec::new();

        match *m {
            Move::Castle { king, rook } => {
                let color = Color::from_white(king.rank() == Rank::First);

                let side = if rook.file() > king.file() {
                    CastlingSide::KingSide
                } else {
                    CastlingSide::QueenSide
                };

                // the king crosses before the rook
                actions.push(Action::Engage(king));
                actions.push(Action::Disengage(side.king_to(color).into()));
                actions.push(Action::Engage(rook));
                actions.push(Action::Disengage(side.rook_to(color).into()));
            }

            Move::EnPassant { from, to } => {
                let victim = Square::from_coords(to.file(), from.rank());
                actions.push(Action::Engage(victim));
                actions.push(Action::Disengage(slots.next_free()?.into()));
                actions.push(Action::Engage(from));
                actions.push(Action::Disengage(to.into()));
            }

            Move::Normal { from, to, .. } => {
                if board.piece_at(to).is_some() {
                    actions.push(Action::Engage(to));
                    actions.push(Action::Disengage(slots.next_free()?.into()));
                }

                actions.push(Action::Engage(from));
                actions.push(Action::Disengage(to.into()));
            }

            ref v => panic!("unexpected {v:?}"),
        }

        Ok(Plan(actions))
    }
}
