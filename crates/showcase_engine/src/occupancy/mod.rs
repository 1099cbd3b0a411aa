mod building;
mod roster;

pub use building::{
    Building, ConflictReason, Floor, PlacementConflict, PlacementReport, Room, RoomPosition,
};
pub use roster::{Patron, PatronId, Roster, RosterError, Tier, ROSTER_FILE_NAME};
