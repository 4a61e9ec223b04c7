//! One presentation of a room: which tileset and music it uses, scroll speed,
//! pointers the codec treats as opaque, and the tile grid for that presentation.

use std::cell::RefCell;
use std::rc::Rc;

use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::address::{lorom_to_pc, pc_to_lorom, Endian};
use crate::error::Result;
use crate::tile_grid::TileGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, Serialize, Deserialize)]
pub enum TileSet {
    CrateriaCave = 0x00,
    CrateriaCaveRed = 0x01,
    CrateriaTech = 0x02,
    CrateriaTechDark = 0x03,
    WreckedShip = 0x04,
    WreckedShipDark = 0x05,
    BrinstarBlueGreenPink = 0x06,
    BrinstarRedKraid = 0x07,
    StatuesHallway = 0x08,
    NorfairRedRidley = 0x09,
    NorfairBrownCave = 0x0a,
    MaridiaYellow = 0x0b,
    MaridiaPurpleSandtrap = 0x0c,
    Tourian = 0x0d,
    MotherBrainRoom = 0x0e,
    Ceres = 0x0f,
    CeresGreen = 0x10,
    CeresEntrance = 0x11,
    CeresEntranceGreen = 0x12,
    CeresRidleyRoom = 0x13,
    CeresRidleyRoomGreen = 0x14,
    SaveRoomPink = 0x15,
    SaveRoomPinkDark = 0x16,
    SaveRoomBlue = 0x17,
    SaveRoomGreen = 0x18,
    SaveRoomYellow = 0x19,
    KraidRoom = 0x1a,
    CrocomireRoom = 0x1b,
    DraygonRoom = 0x1c,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, Serialize, Deserialize)]
pub enum SongSet {
    Intro = 0x00,
    TitleScreen = 0x03,
    EmptyCrateria = 0x06,
    SpacePirates = 0x09,
    ReturnToCrateria = 0x0c,
    UpperBrinstar = 0x0f,
    LowerBrinstar = 0x12,
    UpperNorfair = 0x15,
    LowerNorfair = 0x18,
    Maridia = 0x1b,
    Tourian = 0x1e,
    MotherBrain = 0x21,
    BossFight1 = 0x24,
    BossFight2 = 0x27,
    MinibossFight = 0x2a,
    CeresStation = 0x2d,
    WreckedShip = 0x30,
    ZebesExploding = 0x33,
    SamusStory = 0x36,
    DeathSfx = 0x39,
    CreditsRoll = 0x3c,
    LastMetroidVo = 0x3f,
    TheGalaxyVo = 0x42,
    SuperMetroid = 0x45,
    SamusRevenge = 0x48,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, Serialize, Deserialize)]
pub enum SongPlayIndex {
    NoChange = 0x00,
    SamusLoad = 0x01,
    PickupItem = 0x02,
    Elevator = 0x03,
    StatueHall = 0x04,
    Song1 = 0x05,
    Song2 = 0x06,
    Song3 = 0x07,
    StopMusic = 0x80,
}

/// A shared handle to a tile grid. States that point at the same level-data address
/// must share one underlying grid: editing it through one state is visible through
/// every other state that points at the same address.
pub type SharedTileGrid = Rc<RefCell<TileGrid>>;

#[derive(Debug, Clone)]
pub struct RoomState {
    pub level_data_address: u32,
    pub tileset: TileSet,
    pub songset: SongSet,
    pub song_play_index: SongPlayIndex,
    pub fx_pointer: u16,
    pub enemy_set_pointer: u16,
    pub enemy_gfx_pointer: u16,
    pub background_x_scroll: u8,
    pub background_y_scroll: u8,
    pub room_scrolls_pointer: u16,
    pub unused_pointer: u16,
    pub main_asm_pointer: u16,
    pub plm_set_pointer: u16,
    pub background_pointer: u16,
    pub setup_asm_pointer: u16,
    pub tiles: SharedTileGrid,
}

impl RoomState {
    pub fn new(tiles: SharedTileGrid) -> Self {
        RoomState {
            level_data_address: 0,
            tileset: TileSet::CrateriaCave,
            songset: SongSet::Intro,
            song_play_index: SongPlayIndex::NoChange,
            fx_pointer: 0,
            enemy_set_pointer: 0,
            enemy_gfx_pointer: 0,
            background_x_scroll: 0,
            background_y_scroll: 0,
            room_scrolls_pointer: 0,
            unused_pointer: 0,
            main_asm_pointer: 0,
            plm_set_pointer: 0,
            background_pointer: 0,
            setup_asm_pointer: 0,
            tiles,
        }
    }

    /// 26-byte on-ROM encoding: a LoROM pointer to this state's level data followed
    /// by its tag bytes and opaque pointer fields.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(26);
        out.extend_from_slice(&pc_to_lorom(self.level_data_address, Endian::Little));
        out.push(self.tileset as u8);
        out.push(self.songset as u8);
        out.push(self.song_play_index as u8);
        out.extend_from_slice(&self.fx_pointer.to_le_bytes());
        out.extend_from_slice(&self.enemy_set_pointer.to_le_bytes());
        out.extend_from_slice(&self.enemy_gfx_pointer.to_le_bytes());
        out.push(self.background_x_scroll);
        out.push(self.background_y_scroll);
        out.extend_from_slice(&self.room_scrolls_pointer.to_le_bytes());
        out.extend_from_slice(&self.unused_pointer.to_le_bytes());
        out.extend_from_slice(&self.main_asm_pointer.to_le_bytes());
        out.extend_from_slice(&self.plm_set_pointer.to_le_bytes());
        out.extend_from_slice(&self.background_pointer.to_le_bytes());
        out.extend_from_slice(&self.setup_asm_pointer.to_le_bytes());
        Ok(out)
    }

    pub fn decode(bytes: &[u8], tiles: SharedTileGrid) -> Result<Self> {
        use num::FromPrimitive;

        let level_data_address = lorom_to_pc(&bytes[0..3], Endian::Little)?;
        let tileset = TileSet::from_u8(bytes[3]).unwrap_or(TileSet::CrateriaCave);
        let songset = SongSet::from_u8(bytes[4]).unwrap_or(SongSet::Intro);
        let song_play_index = SongPlayIndex::from_u8(bytes[5]).unwrap_or(SongPlayIndex::NoChange);

        Ok(RoomState {
            level_data_address,
            tileset,
            songset,
            song_play_index,
            fx_pointer: u16::from_le_bytes([bytes[6], bytes[7]]),
            enemy_set_pointer: u16::from_le_bytes([bytes[8], bytes[9]]),
            enemy_gfx_pointer: u16::from_le_bytes([bytes[10], bytes[11]]),
            background_x_scroll: bytes[12],
            background_y_scroll: bytes[13],
            room_scrolls_pointer: u16::from_le_bytes([bytes[14], bytes[15]]),
            unused_pointer: u16::from_le_bytes([bytes[16], bytes[17]]),
            main_asm_pointer: u16::from_le_bytes([bytes[18], bytes[19]]),
            plm_set_pointer: u16::from_le_bytes([bytes[20], bytes[21]]),
            background_pointer: u16::from_le_bytes([bytes[22], bytes[23]]),
            setup_asm_pointer: u16::from_le_bytes([bytes[24], bytes[25]]),
            tiles,
        })
    }
}

/// Sum type over the three state-pointer record shapes a room header can contain.
#[derive(Debug, Clone)]
pub enum RoomStatePointer {
    Event { event_value: u8, state: RoomState },
    Landing { state: RoomState },
    Flyway { event_value: u8, state: RoomState },
}

impl RoomStatePointer {
    pub fn tag(&self) -> [u8; 2] {
        match self {
            RoomStatePointer::Event { .. } => [0x12, 0xe6],
            RoomStatePointer::Landing { .. } => [0x69, 0xe6],
            RoomStatePointer::Flyway { .. } => [0x29, 0xe6],
        }
    }

    /// Number of bytes this pointer occupies in the header's state-pointer list
    /// (tag + optional event value + 2-byte offset).
    pub fn byte_length(&self) -> usize {
        match self {
            RoomStatePointer::Landing { .. } => 4,
            RoomStatePointer::Event { .. } | RoomStatePointer::Flyway { .. } => 5,
        }
    }

    pub fn event_value(&self) -> Option<u8> {
        match self {
            RoomStatePointer::Event { event_value, .. } => Some(*event_value),
            RoomStatePointer::Flyway { event_value, .. } => Some(*event_value),
            RoomStatePointer::Landing { .. } => None,
        }
    }

    pub fn state(&self) -> &RoomState {
        match self {
            RoomStatePointer::Event { state, .. } => state,
            RoomStatePointer::Landing { state } => state,
            RoomStatePointer::Flyway { state, .. } => state,
        }
    }

    pub fn state_mut(&mut self) -> &mut RoomState {
        match self {
            RoomStatePointer::Event { state, .. } => state,
            RoomStatePointer::Landing { state } => state,
            RoomStatePointer::Flyway { state, .. } => state,
        }
    }
}
