//! Core data model for Cave Explorer: the room catalog loaded from
//! `rooms.json` and the grid of placed rooms the player grows from it.

use serde::Deserialize;
use std::collections::HashMap;
use std::rc::Rc;
use yew::Reducible;

use crate::state::placement;
use crate::util::clog;

/// The fixed cell the starting room occupies. Its South side is the sealed
/// cave entrance and is never offered for expansion.
pub const START_COORD: (i32, i32) = (0, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum Direction {
    N,
    E,
    S,
    W,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::N, Direction::E, Direction::S, Direction::W];

    pub fn index(self) -> usize {
        match self {
            Direction::N => 0,
            Direction::E => 1,
            Direction::S => 2,
            Direction::W => 3,
        }
    }

    pub fn from_index(i: usize) -> Direction {
        Self::ALL[i % 4]
    }

    /// Grid delta, y growing northwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::N => (0, 1),
            Direction::E => (1, 0),
            Direction::S => (0, -1),
            Direction::W => (-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        Self::from_index(self.index() + 2)
    }
}

/// A connector classification on one side of a room ("door", "wall", ...).
/// A side absent from the catalog entry counts as kind "none".
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Opening {
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub weight: Option<f64>,
    #[serde(default)]
    pub openings: HashMap<Direction, Opening>,
}

impl Room {
    /// Which opening kind this room presents toward `dir` when stored with
    /// `rotation` quarter turns: the unrotated side is
    /// `(dir.index() - rotation) mod 4` over the cyclic order `[N, E, S, W]`.
    pub fn opening_toward(&self, rotation: u8, dir: Direction) -> &str {
        let side = Direction::from_index(dir.index() + 4 - (rotation as usize % 4));
        self.openings
            .get(&side)
            .map(|o| o.kind.as_str())
            .unwrap_or("none")
    }

    /// Selection weight; catalog entries without one count as 1.
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }

    /// Entrance rooms seed the grid but are excluded from procedural
    /// selection.
    pub fn is_entrance(&self) -> bool {
        self.tags.iter().any(|t| t == "entrance")
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RoomCatalog {
    pub rooms: Vec<Room>,
}

impl RoomCatalog {
    /// The room seeded at the start coordinate: the first entrance-tagged
    /// entry, falling back to the first room.
    pub fn starting_room_index(&self) -> Option<usize> {
        self.rooms
            .iter()
            .position(|r| r.is_entrance())
            .or(if self.rooms.is_empty() { None } else { Some(0) })
    }
}

/// One occupied grid cell. `room` indexes the catalog; `rotation` counts
/// quarter turns applied when resolving which side faces which direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedRoom {
    pub x: i32,
    pub y: i32,
    pub room: usize,
    pub rotation: u8,
}

#[derive(Clone, Debug)]
pub enum GridAction {
    /// Attempt a placement at an empty cell. `roll` is a uniform draw in
    /// `[0, 1)` taken at the input edge so the reducer stays deterministic.
    Place { x: i32, y: i32, roll: f64 },
    SetActive { x: i32, y: i32 },
    Reset,
}

/// Authoritative grid state: the placed rooms, the active (focused)
/// coordinate, and the derived set of expandable cells.
#[derive(Clone, Debug, PartialEq)]
pub struct GridState {
    pub catalog: Rc<RoomCatalog>,
    pub placed: Vec<PlacedRoom>,
    pub active: Option<(i32, i32)>,
    pub potential: Vec<(i32, i32)>,
    pub version: u64,
}

impl GridState {
    pub fn new(catalog: Rc<RoomCatalog>) -> Self {
        let mut state = Self {
            placed: Vec::new(),
            active: None,
            potential: Vec::new(),
            version: 0,
            catalog,
        };
        if let Some(start) = state.catalog.starting_room_index() {
            state.placed.push(PlacedRoom {
                x: START_COORD.0,
                y: START_COORD.1,
                room: start,
                rotation: 0,
            });
            state.active = Some(START_COORD);
            state.recompute_potential();
        }
        state
    }

    pub fn placed_at(&self, x: i32, y: i32) -> Option<&PlacedRoom> {
        self.placed.iter().find(|p| p.x == x && p.y == y)
    }

    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.placed_at(x, y).is_some()
    }

    pub fn is_potential(&self, x: i32, y: i32) -> bool {
        self.potential.contains(&(x, y))
    }

    /// All coordinates the viewport has to frame: placed plus potential.
    pub fn frame_coords(&self) -> Vec<(i32, i32)> {
        let mut coords: Vec<(i32, i32)> = self.placed.iter().map(|p| (p.x, p.y)).collect();
        coords.extend(self.potential.iter().copied());
        coords
    }

    /// Full recomputation of the expandable cells. Every placed room offers
    /// its non-"none" sides; occupied neighbors and the starting room's
    /// sealed South side are skipped.
    fn recompute_potential(&mut self) {
        let mut potential: Vec<(i32, i32)> = Vec::new();
        for p in &self.placed {
            let room = &self.catalog.rooms[p.room];
            for dir in Direction::ALL {
                if (p.x, p.y) == START_COORD && dir == Direction::S {
                    continue;
                }
                if room.opening_toward(p.rotation, dir) == "none" {
                    continue;
                }
                let (dx, dy) = dir.delta();
                let target = (p.x + dx, p.y + dy);
                if self.is_occupied(target.0, target.1) || potential.contains(&target) {
                    continue;
                }
                potential.push(target);
            }
        }
        self.potential = potential;
    }
}

impl Reducible for GridState {
    type Action = GridAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut new = (*self).clone();
        match action {
            GridAction::Place { x, y, roll } => {
                if new.is_occupied(x, y) {
                    return self;
                }
                match placement::resolve(&new.catalog, &new.placed, x, y, roll) {
                    Some((room, rotation)) => {
                        new.placed.push(PlacedRoom { x, y, room, rotation });
                        new.active = Some((x, y));
                        new.recompute_potential();
                    }
                    None => {
                        let wanted = placement::constraints(&new.catalog, &new.placed, x, y);
                        clog(&format!(
                            "no room matches at ({}, {}); constraints: {:?}",
                            x, y, wanted
                        ));
                        return self;
                    }
                }
            }
            GridAction::SetActive { x, y } => {
                if !new.is_occupied(x, y) {
                    return self;
                }
                new.active = Some((x, y));
            }
            GridAction::Reset => {
                new.placed.retain(|p| (p.x, p.y) == START_COORD);
                new.active = Some(START_COORD);
                new.recompute_potential();
            }
        }
        new.version += 1;
        Rc::new(new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, sides: &[(Direction, &str)], weight: Option<f64>, tags: &[&str]) -> Room {
        Room {
            id: id.to_string(),
            name: id.to_string(),
            image: format!("{id}.png"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            weight,
            openings: sides
                .iter()
                .map(|(d, k)| (*d, Opening { kind: k.to_string() }))
                .collect(),
        }
    }

    fn catalog(rooms: Vec<Room>) -> Rc<RoomCatalog> {
        Rc::new(RoomCatalog { rooms })
    }

    /// Entrance with a North door plus a chain of north/south door rooms.
    fn chain_catalog(extra: usize) -> Rc<RoomCatalog> {
        let mut rooms = vec![room(
            "start",
            &[(Direction::N, "door"), (Direction::S, "door")],
            None,
            &["entrance"],
        )];
        for i in 0..extra {
            rooms.push(room(
                &format!("cave-{i}"),
                &[(Direction::N, "door"), (Direction::S, "door")],
                None,
                &[],
            ));
        }
        catalog(rooms)
    }

    fn dispatch(state: Rc<GridState>, action: GridAction) -> Rc<GridState> {
        Reducible::reduce(state, action)
    }

    #[test]
    fn rotation_resolution_reindexes_sides() {
        let r = room(
            "r",
            &[(Direction::N, "door"), (Direction::E, "wall")],
            None,
            &[],
        );
        assert_eq!(r.opening_toward(0, Direction::N), "door");
        assert_eq!(r.opening_toward(0, Direction::E), "wall");
        assert_eq!(r.opening_toward(0, Direction::S), "none");
        // One quarter turn: the physical N side now faces E.
        assert_eq!(r.opening_toward(1, Direction::E), "door");
        assert_eq!(r.opening_toward(1, Direction::S), "wall");
        assert_eq!(r.opening_toward(2, Direction::S), "door");
        assert_eq!(r.opening_toward(3, Direction::W), "door");
        assert_eq!(r.opening_toward(3, Direction::N), "wall");
    }

    #[test]
    fn new_seeds_entrance_at_start() {
        let state = GridState::new(chain_catalog(2));
        assert_eq!(state.placed.len(), 1);
        let start = state.placed_at(0, 0).expect("starting room");
        assert!(state.catalog.rooms[start.room].is_entrance());
        assert_eq!(start.rotation, 0);
        assert_eq!(state.active, Some(START_COORD));
        // North door is expandable, the South entrance side is sealed.
        assert!(state.is_potential(0, 1));
        assert!(!state.is_potential(0, -1));
    }

    #[test]
    fn new_without_rooms_stays_empty() {
        let state = GridState::new(catalog(Vec::new()));
        assert!(state.placed.is_empty());
        assert_eq!(state.active, None);
        assert!(state.potential.is_empty());
    }

    #[test]
    fn place_appends_and_activates() {
        let state = Rc::new(GridState::new(chain_catalog(2)));
        let next = dispatch(state, GridAction::Place { x: 0, y: 1, roll: 0.0 });
        assert_eq!(next.placed.len(), 2);
        assert_eq!(next.active, Some((0, 1)));
        assert!(next.is_occupied(0, 1));
        assert!(!next.is_potential(0, 1));
        // The new room's own North door opens the next cell.
        assert!(next.is_potential(0, 2));
    }

    #[test]
    fn coordinates_and_room_ids_stay_unique() {
        let mut state = Rc::new(GridState::new(chain_catalog(4)));
        for y in 1..=4 {
            state = dispatch(state, GridAction::Place { x: 0, y, roll: 0.42 });
        }
        assert_eq!(state.placed.len(), 5);
        for (i, a) in state.placed.iter().enumerate() {
            for b in &state.placed[i + 1..] {
                assert_ne!((a.x, a.y), (b.x, b.y));
                assert_ne!(a.room, b.room);
            }
        }
    }

    #[test]
    fn adjacent_rooms_present_matching_kinds() {
        let mut state = Rc::new(GridState::new(chain_catalog(3)));
        for y in 1..=3 {
            state = dispatch(state, GridAction::Place { x: 0, y, roll: 0.7 });
        }
        for p in &state.placed {
            for dir in Direction::ALL {
                let (dx, dy) = dir.delta();
                let Some(n) = state.placed_at(p.x + dx, p.y + dy) else {
                    continue;
                };
                let ours = state.catalog.rooms[p.room].opening_toward(p.rotation, dir);
                let theirs =
                    state.catalog.rooms[n.room].opening_toward(n.rotation, dir.opposite());
                assert_eq!(
                    ours, theirs,
                    "mismatch between ({},{}) and its {dir:?} neighbor",
                    p.x, p.y
                );
            }
        }
    }

    #[test]
    fn place_on_occupied_cell_is_a_no_op() {
        let state = Rc::new(GridState::new(chain_catalog(2)));
        let next = dispatch(state.clone(), GridAction::Place { x: 0, y: 0, roll: 0.5 });
        assert!(Rc::ptr_eq(&state, &next));
    }

    #[test]
    fn unsatisfiable_constraints_leave_state_unchanged() {
        // Every selectable room presents a wall where a door is required.
        let cat = catalog(vec![
            room("start", &[(Direction::N, "door")], None, &["entrance"]),
            room("walled", &[(Direction::S, "wall")], None, &[]),
        ]);
        let state = Rc::new(GridState::new(cat));
        let next = dispatch(state.clone(), GridAction::Place { x: 0, y: 1, roll: 0.3 });
        assert!(Rc::ptr_eq(&state, &next));
        assert_eq!(next.placed.len(), 1);
    }

    #[test]
    fn set_active_requires_an_occupied_cell() {
        let state = Rc::new(GridState::new(chain_catalog(1)));
        let miss = dispatch(state.clone(), GridAction::SetActive { x: 5, y: 5 });
        assert!(Rc::ptr_eq(&state, &miss));

        let grown = dispatch(state, GridAction::Place { x: 0, y: 1, roll: 0.0 });
        let back = dispatch(grown, GridAction::SetActive { x: 0, y: 0 });
        assert_eq!(back.active, Some((0, 0)));
    }

    #[test]
    fn reset_is_idempotent() {
        let mut state = Rc::new(GridState::new(chain_catalog(3)));
        for y in 1..=3 {
            state = dispatch(state, GridAction::Place { x: 0, y, roll: 0.1 });
        }
        assert!(state.is_potential(0, 4));
        let once = dispatch(state, GridAction::Reset);
        let twice = dispatch(once.clone(), GridAction::Reset);
        assert_eq!(once.placed, twice.placed);
        assert_eq!(once.placed.len(), 1);
        assert_eq!(once.placed[0].x, 0);
        assert_eq!(once.placed[0].y, 0);
        assert_eq!(once.active, Some(START_COORD));
        assert_eq!(once.potential, twice.potential);
        // Cells only reachable through the removed rooms are gone; just the
        // starting room's North door remains expandable.
        assert_eq!(once.potential, vec![(0, 1)]);
        assert!(!once.is_potential(0, 2));
        assert!(!once.is_potential(0, 4));
    }

    #[test]
    fn start_south_side_is_never_expandable() {
        // Even with an explicit South door the entrance stays sealed.
        let mut state = Rc::new(GridState::new(chain_catalog(3)));
        assert!(!state.is_potential(0, -1));
        state = dispatch(state, GridAction::Place { x: 0, y: 1, roll: 0.0 });
        assert!(!state.is_potential(0, -1));
    }

    #[test]
    fn sample_catalog_deserializes() {
        let cat: RoomCatalog =
            serde_json::from_str(include_str!("../static/rooms.json")).expect("valid catalog");
        assert!(!cat.rooms.is_empty());
        let start = cat.starting_room_index().expect("starting room");
        assert!(cat.rooms[start].is_entrance());
        // Ids are unique keys.
        for (i, a) in cat.rooms.iter().enumerate() {
            for b in &cat.rooms[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }
}
