//! Constraint-based room placement: gather the opening kinds neighboring
//! rooms present toward a target cell, filter the catalog down to rooms that
//! match them all, then pick one by roulette-wheel weighted selection.
//!
//! Everything here is pure; the random draw comes in as a `[0, 1)` roll from
//! the input edge.

use crate::model::{Direction, PlacedRoom, RoomCatalog};

/// Rotations proposed during candidate search. Resolution handles quarter
/// turns 1-3, but generation only ever places rooms unrotated.
pub const CANDIDATE_ROTATIONS: [u8; 1] = [0];

/// The opening kinds required at `(x, y)`, one entry per direction that has
/// an occupied neighbor: the kind that neighbor presents toward the target
/// under its stored rotation.
pub fn constraints(
    catalog: &RoomCatalog,
    placed: &[PlacedRoom],
    x: i32,
    y: i32,
) -> Vec<(Direction, String)> {
    let mut wanted = Vec::new();
    for dir in Direction::ALL {
        let (dx, dy) = dir.delta();
        let neighbor = placed.iter().find(|p| p.x == x + dx && p.y == y + dy);
        if let Some(n) = neighbor {
            let kind = catalog.rooms[n.room].opening_toward(n.rotation, dir.opposite());
            wanted.push((dir, kind.to_string()));
        }
    }
    wanted
}

/// Every `(room index, rotation)` pair that satisfies all constraints.
/// Entrance-tagged rooms and rooms already placed anywhere on the grid are
/// excluded; each room id appears at most once across the whole grid.
pub fn candidates(
    catalog: &RoomCatalog,
    placed: &[PlacedRoom],
    wanted: &[(Direction, String)],
) -> Vec<(usize, u8)> {
    let mut matches = Vec::new();
    for (idx, room) in catalog.rooms.iter().enumerate() {
        if room.is_entrance() || placed.iter().any(|p| p.room == idx) {
            continue;
        }
        for rot in CANDIDATE_ROTATIONS {
            let fits = wanted
                .iter()
                .all(|(dir, kind)| room.opening_toward(rot, *dir) == kind);
            if fits {
                matches.push((idx, rot));
            }
        }
    }
    matches
}

/// Roulette-wheel selection over the candidate list in catalog order.
/// `roll01` in `[0, 1)` scales to the weight total; a draw of 0 picks the
/// first candidate, a draw just under the total picks the last.
pub fn select_weighted(
    catalog: &RoomCatalog,
    candidates: &[(usize, u8)],
    roll01: f64,
) -> Option<(usize, u8)> {
    if candidates.is_empty() {
        return None;
    }
    let total: f64 = candidates
        .iter()
        .map(|(idx, _)| catalog.rooms[*idx].weight())
        .sum();
    let mut draw = roll01.clamp(0.0, 1.0) * total;
    for c in candidates {
        let w = catalog.rooms[c.0].weight();
        if draw < w {
            return Some(*c);
        }
        draw -= w;
    }
    // Float dust at the top of the range lands on the last candidate.
    candidates.last().copied()
}

/// Full placement resolution for a target cell. `None` means no catalog room
/// matches the computed constraints; the caller reports and changes nothing.
pub fn resolve(
    catalog: &RoomCatalog,
    placed: &[PlacedRoom],
    x: i32,
    y: i32,
    roll01: f64,
) -> Option<(usize, u8)> {
    let wanted = constraints(catalog, placed, x, y);
    let pool = candidates(catalog, placed, &wanted);
    select_weighted(catalog, &pool, roll01)
}
