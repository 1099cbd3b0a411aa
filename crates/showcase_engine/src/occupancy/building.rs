use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use super::{Patron, PatronId, Roster};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomPosition {
    pub floor: u32,
    pub room: u32,
}

impl fmt::Display for RoomPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.floor, self.room)
    }
}

/// A room slot. Holds an index into the building's roster, never a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    number: u32,
    occupant: Option<usize>,
}

impl Room {
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn occupant_index(&self) -> Option<usize> {
        self.occupant
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Floor {
    number: u32,
    rooms: Vec<Room>,
}

impl Floor {
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, number: u32) -> Option<&Room> {
        self.rooms.iter().find(|room| room.number == number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    RoomOccupied { occupant: PatronId },
    RoomMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementConflict {
    pub patron: PatronId,
    pub requested: RoomPosition,
    pub reason: ConflictReason,
}

/// Diagnostics from the assignment pass. Never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementReport {
    pub placed: usize,
    pub conflicts: Vec<PlacementConflict>,
    /// Every patron without a room, conflicted ones included, in input order.
    pub unplaced: Vec<PatronId>,
}

/// Floors x rooms grid filled once from a roster, then read-only.
#[derive(Debug, Clone)]
pub struct Building {
    roster: Arc<Roster>,
    rooms_per_floor: u32,
    floors: Vec<Floor>,
    report: PlacementReport,
}

impl Building {
    pub fn build(roster: Arc<Roster>, rooms_per_floor: u32, max_floors: u32) -> Self {
        let total = roster.len() as u32;
        let (explicit, auto): (Vec<usize>, Vec<usize>) = (0..roster.len())
            .partition(|&index| roster.patrons()[index].explicit_placement().is_some());

        let floors_for_count = if rooms_per_floor == 0 {
            0
        } else {
            total.div_ceil(rooms_per_floor)
        };
        let highest_explicit_floor = explicit
            .iter()
            .filter_map(|&index| roster.patrons()[index].floor)
            .max()
            .unwrap_or(0);
        let floor_count = floors_for_count
            .max(highest_explicit_floor)
            .max(1)
            .min(max_floors);

        let floors = (1..=floor_count)
            .map(|number| Floor {
                number,
                rooms: (1..=rooms_per_floor)
                    .map(|number| Room {
                        number,
                        occupant: None,
                    })
                    .collect(),
            })
            .collect();

        let mut building = Self {
            roster: Arc::clone(&roster),
            rooms_per_floor,
            floors,
            report: PlacementReport::default(),
        };
        let mut unplaced = vec![false; roster.len()];

        for &index in &explicit {
            let patron = &roster.patrons()[index];
            let Some(requested) = patron.explicit_placement() else {
                continue;
            };
            match building.place_explicit(index, requested) {
                Ok(()) => building.report.placed += 1,
                Err(reason) => {
                    warn!(
                        patron = %patron.id,
                        room = %requested,
                        reason = ?reason,
                        "placement_conflict"
                    );
                    building.report.conflicts.push(PlacementConflict {
                        patron: patron.id.clone(),
                        requested,
                        reason,
                    });
                    unplaced[index] = true;
                }
            }
        }

        let capacity = building.floors.len() * rooms_per_floor as usize;
        let mut cursor = 0usize;
        for &index in &auto {
            let mut placed = false;
            while cursor < capacity {
                let slot = building.slot_mut(cursor);
                cursor += 1;
                if let Some(room) = slot {
                    if room.is_empty() {
                        room.occupant = Some(index);
                        placed = true;
                        break;
                    }
                }
            }
            if placed {
                building.report.placed += 1;
            } else {
                warn!(patron = %roster.patrons()[index].id, "building_full");
                unplaced[index] = true;
            }
        }

        building.report.unplaced = unplaced
            .iter()
            .enumerate()
            .filter(|(_, left_out)| **left_out)
            .map(|(index, _)| roster.patrons()[index].id.clone())
            .collect();

        info!(
            floors = building.floors.len(),
            rooms_per_floor,
            placed = building.report.placed,
            unplaced = building.report.unplaced.len(),
            conflicts = building.report.conflicts.len(),
            "building_generated"
        );
        building
    }

    fn place_explicit(&mut self, index: usize, at: RoomPosition) -> Result<(), ConflictReason> {
        let room = self
            .floors
            .iter_mut()
            .find(|floor| floor.number == at.floor)
            .and_then(|floor| floor.rooms.iter_mut().find(|room| room.number == at.room))
            .ok_or(ConflictReason::RoomMissing)?;
        match room.occupant {
            Some(existing) => Err(ConflictReason::RoomOccupied {
                occupant: self.roster.patrons()[existing].id.clone(),
            }),
            None => {
                room.occupant = Some(index);
                Ok(())
            }
        }
    }

    /// Floor-major, room-minor flat index into the grid.
    fn slot_mut(&mut self, flat: usize) -> Option<&mut Room> {
        let per_floor = self.rooms_per_floor as usize;
        if per_floor == 0 {
            return None;
        }
        self.floors
            .get_mut(flat / per_floor)
            .and_then(|floor| floor.rooms.get_mut(flat % per_floor))
    }

    fn room(&self, floor: u32, room: u32) -> Option<&Room> {
        self.floor(floor).and_then(|floor| floor.room(room))
    }

    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    pub fn rooms_per_floor(&self) -> u32 {
        self.rooms_per_floor
    }

    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    pub fn floor(&self, number: u32) -> Option<&Floor> {
        self.floors.iter().find(|floor| floor.number == number)
    }

    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }

    /// Zero for a floor that does not exist.
    pub fn room_count(&self, floor: u32) -> usize {
        self.floor(floor).map_or(0, |floor| floor.rooms.len())
    }

    pub fn patron_in_room(&self, floor: u32, room: u32) -> Option<&Patron> {
        self.room(floor, room)
            .and_then(|room| room.occupant)
            .and_then(|index| self.roster.get(index))
    }

    /// Missing rooms count as empty.
    pub fn is_room_empty(&self, floor: u32, room: u32) -> bool {
        self.room(floor, room).map_or(true, Room::is_empty)
    }

    pub fn occupied_rooms(&self) -> Vec<RoomPosition> {
        self.floors
            .iter()
            .flat_map(|floor| {
                floor
                    .rooms
                    .iter()
                    .filter(|room| !room.is_empty())
                    .map(|room| RoomPosition {
                        floor: floor.number,
                        room: room.number,
                    })
            })
            .collect()
    }

    pub fn patron_by_id(&self, id: &str) -> Option<&Patron> {
        self.roster.find_by_id(id)
    }

    pub fn position_of(&self, id: &str) -> Option<RoomPosition> {
        let index = self.roster.index_of(id)?;
        self.floors.iter().find_map(|floor| {
            floor
                .rooms
                .iter()
                .find(|room| room.occupant == Some(index))
                .map(|room| RoomPosition {
                    floor: floor.number,
                    room: room.number,
                })
        })
    }

    pub fn report(&self) -> &PlacementReport {
        &self.report
    }
}
