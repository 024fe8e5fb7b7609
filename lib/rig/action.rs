use super::{Point, Slot};
use derive_more::{Display, From};
use shakmaty::Square;

/// A location where the gripper may release a piece.
#[derive(Debug, Display, Copy, Clone, PartialEq, From)]
pub enum Target {
    /// A square of the board.
    Square(Square),
    /// A storage slot off the board.
    Slot(Slot),
}

/// A primitive operation of the gantry.
#[derive(Debug, Display, Copy, Clone, PartialEq)]
pub enum Action {
    /// Travel to a square and grip the piece sitting on it.
    #[display(fmt = "engage {}", _0)]
    Engage(Square),

    /// Carry the gripped piece to the target and release it there.
    #[display(fmt = "disengage {}", _0)]
    Disengage(Target),

    /// Travel to a location with the gripper released.
    #[display(fmt = "travel {}", _0)]
    Travel(Point),
}
