use rand::Rng;

use crate::core::domain::Coord;

/// Axis-aligned hop directions as (dx, dy): left, up, right, down.
pub const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

/// Applies `(dx, dy)` to `from`, returning `None` if the result leaves the
/// `width` x `height` grid.
#[inline]
pub fn offset(from: Coord, (dx, dy): (isize, isize), width: usize, height: usize) -> Option<Coord> {
    let x = from.x.checked_add_signed(dx)?;
    let y = from.y.checked_add_signed(dy)?;
    (x < width && y < height).then_some(Coord::new(x, y))
}

/// Number of in-bounds axis-aligned neighbours of `from`.
pub fn neighbour_count(from: Coord, width: usize, height: usize) -> usize {
    DIRECTIONS
        .iter()
        .filter(|&&d| offset(from, d, width, height).is_some())
        .count()
}

/// Picks one of the four axis-aligned neighbours uniformly, redrawing the
/// direction until it lands inside the grid.
///
/// Returns `None` when `from` has no in-bounds neighbour (a 1x1 grid), the
/// only case where redrawing could not terminate.
pub fn random_neighbour<R: Rng + ?Sized>(
    from: Coord,
    width: usize,
    height: usize,
    rng: &mut R,
) -> Option<Coord> {
    if neighbour_count(from, width, height) == 0 {
        return None;
    }
    loop {
        let direction = DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())];
        if let Some(next) = offset(from, direction, width, height) {
            return Some(next);
        }
    }
}
