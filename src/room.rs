//! A room's header, state pointers, and doors, and the layout arithmetic that
//! determines where each of those pieces lives relative to the header address.

use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::bytes::pad_right;
use crate::compression::compress;
use crate::door::Door;
use crate::error::{CodecError, Result};
use crate::room_state::{RoomState, RoomStatePointer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, Serialize, Deserialize)]
pub enum MapArea {
    Crateria = 0x00,
    Brinstar = 0x01,
    Norfair = 0x02,
    WreckedShip = 0x03,
    Maridia = 0x04,
    Tourian = 0x05,
    Ceres = 0x06,
    Debug = 0x07,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub header: u32,
    pub room_index: u8,
    pub map_area: MapArea,
    pub minimap_x_coord: u8,
    pub minimap_y_coord: u8,
    pub width_screens: u8,
    pub height_screens: u8,
    pub up_scroller: u8,
    pub down_scroller: u8,
    pub special_graphics_bitflag: u8,
    pub standard_state: RoomState,
    pub extra_states: Vec<RoomStatePointer>,
    pub doors: Vec<Door>,
    pub level_data_length: usize,
    pub name: Option<String>,
    pub write_level_data: bool,
}

impl Room {
    pub fn new(width_screens: u8, height_screens: u8, standard_state: RoomState) -> Result<Self> {
        let screens = width_screens as usize * height_screens as usize;
        if width_screens == 0 || height_screens == 0 || screens > 50 {
            return Err(CodecError::OutOfRange(format!(
                "room is {} screens ({}x{}), must be 1..=50",
                screens, width_screens, height_screens
            )));
        }

        Ok(Room {
            header: 0,
            room_index: 0,
            map_area: MapArea::Crateria,
            minimap_x_coord: 0,
            minimap_y_coord: 0,
            width_screens,
            height_screens,
            up_scroller: 0,
            down_scroller: 0,
            special_graphics_bitflag: 0,
            standard_state,
            extra_states: Vec::new(),
            doors: Vec::new(),
            level_data_length: 0,
            name: None,
            write_level_data: true,
        })
    }

    fn state_pointers_list_length(&self) -> usize {
        self.extra_states.iter().map(|p| p.byte_length()).sum()
    }

    /// PC address of the standard state's 26-byte record.
    pub fn standard_state_address(&self) -> u32 {
        self.header + 11 + self.state_pointers_list_length() as u32 + 2
    }

    /// PC address of the n-th extra state's 26-byte record.
    fn extra_state_address(&self, index: usize) -> u32 {
        self.header
            + 11
            + self.state_pointers_list_length() as u32
            + 28
            + (index as u32 * 26)
    }

    /// PC address of the door-pointer list, immediately after the standard state and
    /// every extra state record.
    pub fn door_pointer_list_address(&self) -> u32 {
        self.header
            + 11
            + self.state_pointers_list_length() as u32
            + 28
            + (self.extra_states.len() as u32 * 26)
    }

    /// Serializes the full variable-length header block described in the component
    /// design: fixed 11-byte header, extra state pointers, the standard-state
    /// sentinel, every room-state record, then the door pointer list.
    pub fn header_data(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.push(self.room_index);
        out.push(self.map_area as u8);
        out.push(self.minimap_x_coord);
        out.push(self.minimap_y_coord);
        out.push(self.width_screens);
        out.push(self.height_screens);
        out.push(self.up_scroller);
        out.push(self.down_scroller);
        out.push(self.special_graphics_bitflag);
        out.extend_from_slice(&((self.door_pointer_list_address() % 0x10000) as u16).to_le_bytes());

        for (index, pointer) in self.extra_states.iter().enumerate() {
            out.extend_from_slice(&pointer.tag());
            if let Some(event_value) = pointer.event_value() {
                out.push(event_value);
            }
            out.extend_from_slice(
                &((self.extra_state_address(index) % 0x10000) as u16).to_le_bytes(),
            );
        }

        out.extend_from_slice(&[0xe6, 0xe5]);
        out.extend_from_slice(&self.standard_state.encode()?);

        for pointer in &self.extra_states {
            out.extend_from_slice(&pointer.state().encode()?);
        }

        for door in &self.doors {
            out.extend_from_slice(&((door.data_address() % 0x10000) as u16).to_le_bytes());
        }

        Ok(out)
    }

    /// Compresses `state`'s tile grid and pads it to `level_data_length`, if set.
    pub fn compressed_level_data(&self, state: &RoomState) -> Result<Vec<u8>> {
        let uncompressed = state.tiles.borrow().uncompressed_data()?;
        let compressed = compress(
            &uncompressed,
            self.width_screens as usize,
            self.height_screens as usize,
        )?;

        if self.level_data_length > 0 && compressed.len() > self.level_data_length {
            return Err(CodecError::TooLarge {
                actual: compressed.len(),
                max: self.level_data_length,
            });
        }

        Ok(pad_right(&compressed, self.level_data_length, 0xff))
    }
}
