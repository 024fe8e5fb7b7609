use super::Point;
use derive_more::{Display, Error};
use shakmaty::Piece;

/// The index of a storage slot.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[display(fmt = "#{}", _0)]
pub struct Slot(usize);

impl Slot {
    pub const fn new(idx: usize) -> Self {
        Slot(idx)
    }

    pub const fn get(&self) -> usize {
        self.0
    }
}

/// The reason why a captured [`Piece`] could not be stored.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Error)]
#[display(fmt = "all {} storage slots are occupied", _0)]
pub struct SlotsExhausted(#[error(not(source))] pub usize);

/// A fixed pool of locations off the board where captured pieces are parked.
///
/// Slots are claimed in configuration order, hold at most one piece each and
/// are only released together by [`Slots::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Slots {
    locations: Vec<Point>,
    pieces: Vec<Piece>,
}

impl Slots {
    /// Constructs an empty pool over the given locations.
    pub fn new(locations: Vec<Point>) -> Self {
        Slots {
            pieces: Vec::with_capacity(locations.len()),
            locations,
        }
    }

    /// The total number of slots.
    pub fn capacity(&self) -> usize {
        self.locations.len()
    }

    /// The number of occupied slots.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// The slot the next captured piece will occupy.
    pub fn next_free(&self) -> Result<Slot, SlotsExhausted> {
        if self.pieces.len() < self.locations.len() {
            Ok(Slot(self.pieces.len()))
        } else {
            Err(SlotsExhausted(self.locations.len()))
        }
    }

    /// Parks a captured piece in the next free slot.
    pub fn put(&mut self, piece: Piece) -> Result<Slot, SlotsExhausted> {
        let slot = self.next_free()?;
        self.pieces.push(piece);
        Ok(slot)
    }

    /// The location of a slot on the machine plane.
    pub fn location(&self, slot: Slot) -> Option<Point> {
        self.locations.get(slot.get()).copied()
    }

    /// The piece parked in a slot.
    pub fn piece(&self, slot: Slot) -> Option<Piece> {
        self.pieces.get(slot.get()).copied()
    }

    /// Releases every slot at once, e.g. when the pieces return to the box.
    pub fn reset(&mut self) {
        self.pieces.clear();
    }
}
