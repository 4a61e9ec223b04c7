//! Parses a room's header block out of a ROM image, the structural inverse of
//! [`crate::room::Room::header_data`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use crate::address::{lorom_to_pc, Endian};
use crate::door::Door;
use crate::error::{CodecError, Result};
use crate::room::{MapArea, Room};
use crate::room_state::{RoomState, RoomStatePointer, SharedTileGrid};
use crate::tile_grid::TileGrid;

const EVENT_TAG: [u8; 2] = [0x12, 0xe6];
const LANDING_TAG: [u8; 2] = [0x69, 0xe6];
const FLYWAY_TAG: [u8; 2] = [0x29, 0xe6];
const STANDARD_STATE_SENTINEL: [u8; 2] = [0xe6, 0xe5];

/// Shared cache mapping a level-data address to the tile grid already built for it,
/// so two states that point at the same address end up sharing one grid instance.
pub struct TileGridCache {
    grids: HashMap<u32, SharedTileGrid>,
}

impl TileGridCache {
    pub fn new() -> Self {
        TileGridCache {
            grids: HashMap::new(),
        }
    }

    fn get_or_insert(&mut self, address: u32, width_screens: u8, height_screens: u8) -> SharedTileGrid {
        self.grids
            .entry(address)
            .or_insert_with(|| {
                let mut grid = TileGrid::new(width_screens as usize, height_screens as usize);
                grid.fill(None);
                Rc::new(RefCell::new(grid))
            })
            .clone()
    }
}

impl Default for TileGridCache {
    fn default() -> Self {
        Self::new()
    }
}

fn read_u8(rom: &[u8], addr: usize) -> Result<u8> {
    rom.get(addr)
        .copied()
        .ok_or_else(|| CodecError::InvalidAddress(format!("address {:#x} is past end of ROM", addr)))
}

fn read_u16le(rom: &[u8], addr: usize) -> Result<u16> {
    let lo = read_u8(rom, addr)? as u16;
    let hi = read_u8(rom, addr + 1)? as u16;
    Ok(lo | (hi << 8))
}

fn read_slice<'a>(rom: &'a [u8], addr: usize, len: usize) -> Result<&'a [u8]> {
    rom.get(addr..addr + len)
        .ok_or_else(|| CodecError::InvalidAddress(format!("address {:#x}+{} is past end of ROM", addr, len)))
}

/// Reads a 26-byte room-state record at `addr`, resolving its tile grid through
/// `cache` keyed by the state's level-data address.
fn read_room_state(
    rom: &[u8],
    addr: usize,
    width_screens: u8,
    height_screens: u8,
    cache: &mut TileGridCache,
) -> Result<RoomState> {
    let bytes = read_slice(rom, addr, 26)?;
    let level_data_address = lorom_to_pc(&bytes[0..3], Endian::Little)?;
    let tiles = cache.get_or_insert(level_data_address, width_screens, height_screens);
    RoomState::decode(bytes, tiles)
}

/// Reads the 2-byte little-endian door-pointer-list address at `header + 9`, adds
/// bank `$8E`'s base, then follows each non-`00 00` entry (up to 8) assuming door
/// data lives in bank `$83`.
fn read_door_addresses(rom: &[u8], header: usize) -> Result<Vec<u32>> {
    let list_offset = read_u16le(rom, header + 9)? as u32;
    let list_pc = lorom_to_pc(&[0x8e, (list_offset >> 8) as u8, (list_offset & 0xff) as u8], Endian::Big)?;

    let mut addresses = Vec::new();
    for i in 0..8 {
        let entry_addr = list_pc as usize + i * 2;
        let entry = read_u16le(rom, entry_addr)?;
        if entry == 0 {
            break;
        }
        let pc = lorom_to_pc(&[0x83, (entry >> 8) as u8, (entry & 0xff) as u8], Endian::Big)?;
        addresses.push(pc);
    }
    Ok(addresses)
}

/// Parses the room whose header starts at PC address `header`.
pub fn import_room(rom: &[u8], header: usize, cache: &mut TileGridCache) -> Result<Room> {
    let width_screens = read_u8(rom, header + 4)?;
    let height_screens = read_u8(rom, header + 5)?;

    let mut offset = header + 11;
    let mut pointer_tags: Vec<([u8; 2], Option<u8>, u32)> = Vec::new();

    loop {
        let tag = read_slice(rom, offset, 2)?;
        if tag == STANDARD_STATE_SENTINEL {
            offset += 2;
            break;
        }
        let (tag, event_byte_len) = if tag == EVENT_TAG || tag == FLYWAY_TAG {
            ([tag[0], tag[1]], 1)
        } else if tag == LANDING_TAG {
            ([tag[0], tag[1]], 0)
        } else {
            return Err(CodecError::UnrecognizedHeader {
                offset,
                bytes: tag.to_vec(),
            });
        };

        let event_value = if event_byte_len == 1 {
            Some(read_u8(rom, offset + 2)?)
        } else {
            None
        };
        let state_offset = read_u16le(rom, offset + 2 + event_byte_len)? as u32;
        let state_pc = lorom_to_pc(&[0x8e, (state_offset >> 8) as u8, (state_offset & 0xff) as u8], Endian::Big)?;
        pointer_tags.push((tag, event_value, state_pc));
        offset += 2 + event_byte_len + 2;
    }

    let standard_state_address = offset;
    let standard_state = read_room_state(rom, standard_state_address, width_screens, height_screens, cache)?;

    let mut extra_states = Vec::new();
    for (tag, event_value, state_pc) in pointer_tags {
        let state = read_room_state(rom, state_pc as usize, width_screens, height_screens, cache)?;
        let pointer = if tag == EVENT_TAG {
            RoomStatePointer::Event {
                event_value: event_value.unwrap_or(0),
                state,
            }
        } else if tag == FLYWAY_TAG {
            RoomStatePointer::Flyway {
                event_value: event_value.unwrap_or(0),
                state,
            }
        } else {
            RoomStatePointer::Landing { state }
        };
        extra_states.push(pointer);
    }

    let mut room = Room::new(width_screens, height_screens, standard_state)?;
    room.header = header as u32;
    room.room_index = read_u8(rom, header)?;
    room.map_area = map_area_from_u8(read_u8(rom, header + 1)?);
    room.minimap_x_coord = read_u8(rom, header + 2)?;
    room.minimap_y_coord = read_u8(rom, header + 3)?;
    room.width_screens = width_screens;
    room.height_screens = height_screens;
    room.up_scroller = read_u8(rom, header + 6)?;
    room.down_scroller = read_u8(rom, header + 7)?;
    room.special_graphics_bitflag = read_u8(rom, header + 8)?;
    room.extra_states = extra_states;

    let mut doors = Vec::new();
    for data_address in read_door_addresses(rom, header)? {
        let bytes = read_slice(rom, data_address as usize, 12)?;
        doors.push(Door::decode(bytes, data_address)?);
    }
    room.doors = doors;

    trace!(
        "imported room at {:#x}: {} extra states, {} doors",
        header,
        room.extra_states.len(),
        room.doors.len()
    );

    Ok(room)
}

fn map_area_from_u8(value: u8) -> MapArea {
    use num::FromPrimitive;
    MapArea::from_u8(value).unwrap_or(MapArea::Crateria)
}
