//! Level-data codec and ROM surgery for Super Metroid room data: LoROM address
//! translation, the game's variable-length compression scheme, and the room
//! header/room-state/door binary layout that ties a room's bytes together.

pub mod address;
pub mod bytes;
pub mod compression;
pub mod door;
pub mod error;
pub mod field;
pub mod importer;
pub mod project;
pub mod room;
pub mod room_dict;
pub mod room_state;
pub mod tile;
pub mod tile_grid;

pub use address::{lorom_to_pc, pc_to_lorom, Endian};
pub use door::{Door, DoorBitFlag, DoorExitDirection, ElevatorLaunchpad, SimpleDoor};
pub use error::{CodecError, Result};
pub use project::{Project, RoomImportEntry};
pub use room::{MapArea, Room};
pub use room_dict::RoomDict;
pub use room_state::{RoomState, RoomStatePointer, SongPlayIndex, SongSet, TileSet};
pub use tile::Tile;
pub use tile_grid::TileGrid;
