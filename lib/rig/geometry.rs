use super::Point;
use derive_more::{Display, Error};
use shakmaty::{File, Rank, Square};

/// The reason why a [`Point`] does not correspond to any [`Square`].
#[derive(Debug, Display, Copy, Clone, PartialEq, Error)]
#[display(fmt = "the point {} lies outside of the board", _0)]
pub struct OffBoard(#[error(not(source))] pub Point);

/// Maps squares of the board to locations on the machine plane and back.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geometry {
    origin: Point,
    pitch: f64,
}

impl Geometry {
    /// Constructs [`Geometry`] given the center of square `a1` and the
    /// distance between the centers of adjacent squares.
    pub const fn new(origin: Point, pitch: f64) -> Self {
        Geometry { origin, pitch }
    }

    /// The center of a square on the machine plane.
    pub fn point(&self, sq: Square) -> Point {
        Point::new(
            self.origin.x + u32::from(sq.file()) as f64 * self.pitch,
            self.origin.y + u32::from(sq.rank()) as f64 * self.pitch,
        )
    }

    /// The square whose center is nearest to a point.
    pub fn square(&self, p: Point) -> Result<Square, OffBoard> {
        let file = ((p.x - self.origin.x) / self.pitch).round();
        let rank = ((p.y - self.origin.y) / self.pitch).round();

        if (0. ..8.).contains(&file) && (0. ..8.).contains(&rank) {
            Ok(Square::from_coords(
                File::new(file as u32),
                Rank::new(rank as u32),
            ))
        } else {
            Err(OffBoard(p))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_strategy::proptest;

    #[proptest]
    fn mapping_square_to_point_and_back_is_an_identity(
        #[strategy(-1e3..1e3f64)] x: f64,
        #[strategy(-1e3..1e3f64)] y: f64,
        #[strategy(1e0..1e2f64)] pitch: f64,
        #[strategy((0..64u32).prop_map(Square::new))] sq: Square,
    ) {
        let geometry = Geometry::new(Point::new(x, y), pitch);
        assert_eq!(geometry.square(geometry.point(sq)), Ok(sq));
    }

    #[proptest]
    fn square_rejects_points_off_the_board(
        #[strategy(1e0..1e2f64)] pitch: f64,
        #[strategy(8f64..1e3)] file: f64,
        #[strategy(0f64..8.)] rank: f64,
    ) {
        let geometry = Geometry::new(Point::default(), pitch);
        let p = Point::new(file * pitch, rank * pitch);
        assert_eq!(geometry.square(p), Err(OffBoard(p)));
    }

    #[proptest]
    fn point_is_relative_to_the_origin(
        #[strategy(-1e3..1e3f64)] x: f64,
        #[strategy(-1e3..1e3f64)] y: f64,
        #[strategy(1e0..1e2f64)] pitch: f64,
    ) {
        let geometry = Geometry::new(Point::new(x, y), pitch);
        assert_eq!(geometry.point(Square::A1), Point::new(x, y));
        assert_eq!(geometry.point(Square::H8), Point::new(x + 7. * pitch, y + 7. * pitch));
    }
}
