//! Door records: either a normal door leading to another room, or an elevator
//! launchpad whose 12 bytes this crate preserves verbatim without interpreting them.

use log::warn;
use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, Serialize, Deserialize)]
pub enum DoorBitFlag {
    SameArea = 0x00,
    AreaChange = 0x40,
    ElevatorSameArea = 0x80,
    ElevatorAreaChange = 0xc0,
    /// Observed in ROM data but undocumented; preserved rather than rejected.
    Unknown0xD0 = 0xd0,
    Unknown0xE0 = 0xe0,
    Unknown0xF0 = 0xf0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, Serialize, Deserialize)]
pub enum DoorExitDirection {
    RightNoDoorClose = 0x00,
    LeftNoDoorClose = 0x01,
    DownNoDoorClose = 0x02,
    UpNoDoorClose = 0x03,
    RightDoorClose = 0x04,
    LeftDoorClose = 0x05,
    DownDoorClose = 0x06,
    UpDoorClose = 0x07,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleDoor {
    pub data_address: u32,
    pub target_room_id: u32,
    pub bit_flag: DoorBitFlag,
    pub exit_direction: DoorExitDirection,
    pub target_door_cap_col: u8,
    pub target_door_cap_row: u8,
    pub target_room_screen_h: u8,
    pub target_room_screen_v: u8,
    pub distance_to_spawn: u16,
    pub asm_pointer: u16,
}

impl SimpleDoor {
    /// 12-byte little-endian on-ROM record.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12);
        out.extend_from_slice(&((self.target_room_id % 0x10000) as u16).to_le_bytes());
        out.push(self.bit_flag as u8);
        out.push(self.exit_direction as u8);
        out.push(self.target_door_cap_col);
        out.push(self.target_door_cap_row);
        out.push(self.target_room_screen_h);
        out.push(self.target_room_screen_v);
        out.extend_from_slice(&self.distance_to_spawn.to_le_bytes());
        out.extend_from_slice(&self.asm_pointer.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8], data_address: u32) -> Result<Self> {
        use num::FromPrimitive;

        if bytes.len() != 12 {
            return Err(CodecError::OutOfRange(format!(
                "door record must be 12 bytes, got {}",
                bytes.len()
            )));
        }

        let bit_flag = DoorBitFlag::from_u8(bytes[2]).ok_or_else(|| {
            CodecError::OutOfRange(format!("unrecognized door bit flag {:#x}", bytes[2]))
        })?;
        if matches!(
            bit_flag,
            DoorBitFlag::Unknown0xD0 | DoorBitFlag::Unknown0xE0 | DoorBitFlag::Unknown0xF0
        ) {
            warn!(
                "door at {:#x} uses undocumented bit flag {:#x}",
                data_address, bytes[2]
            );
        }

        Ok(SimpleDoor {
            data_address,
            target_room_id: u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
            bit_flag,
            exit_direction: DoorExitDirection::from_u8(bytes[3]).ok_or_else(|| {
                CodecError::OutOfRange(format!(
                    "unrecognized door exit direction {:#x}",
                    bytes[3]
                ))
            })?,
            target_door_cap_col: bytes[4],
            target_door_cap_row: bytes[5],
            target_room_screen_h: bytes[6],
            target_room_screen_v: bytes[7],
            distance_to_spawn: u16::from_le_bytes([bytes[8], bytes[9]]),
            asm_pointer: u16::from_le_bytes([bytes[10], bytes[11]]),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevatorLaunchpad {
    pub data_address: u32,
    pub raw: [u8; 12],
}

#[derive(Debug, Clone, PartialEq)]
pub enum Door {
    Simple(SimpleDoor),
    ElevatorLaunchpad(ElevatorLaunchpad),
}

impl Door {
    pub fn data_address(&self) -> u32 {
        match self {
            Door::Simple(d) => d.data_address,
            Door::ElevatorLaunchpad(d) => d.data_address,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Door::Simple(d) => d.encode(),
            Door::ElevatorLaunchpad(d) => d.raw.to_vec(),
        }
    }

    /// A door whose first two bytes are `00 00` is an elevator launchpad rather than
    /// a normal door; everything else decodes as a `SimpleDoor`.
    pub fn decode(bytes: &[u8], data_address: u32) -> Result<Self> {
        if bytes.len() != 12 {
            return Err(CodecError::OutOfRange(format!(
                "door record must be 12 bytes, got {}",
                bytes.len()
            )));
        }
        if bytes[0] == 0x00 && bytes[1] == 0x00 {
            let mut raw = [0u8; 12];
            raw.copy_from_slice(bytes);
            Ok(Door::ElevatorLaunchpad(ElevatorLaunchpad {
                data_address,
                raw,
            }))
        } else {
            Ok(Door::Simple(SimpleDoor::decode(bytes, data_address)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_door_encodes_concrete_record() {
        let door = SimpleDoor {
            data_address: 0,
            target_room_id: 0x791f8,
            bit_flag: DoorBitFlag::SameArea,
            exit_direction: DoorExitDirection::LeftNoDoorClose,
            target_door_cap_col: 0x8e,
            target_door_cap_row: 0x46,
            target_room_screen_h: 0x08,
            target_room_screen_v: 0x04,
            distance_to_spawn: 0x8000,
            asm_pointer: 0x0000,
        };
        assert_eq!(
            door.encode(),
            vec![0xf8, 0x91, 0x00, 0x05, 0x8e, 0x46, 0x08, 0x04, 0x00, 0x80, 0x00, 0x00]
        );
    }

    #[test]
    fn elevator_launchpad_detected_by_leading_zero_bytes() {
        let bytes = [0u8; 12];
        let door = Door::decode(&bytes, 0x100).unwrap();
        assert!(matches!(door, Door::ElevatorLaunchpad(_)));
        assert_eq!(door.encode(), bytes.to_vec());
    }

    #[test]
    fn simple_door_round_trips() {
        let bytes = [0xf8, 0x91, 0x00, 0x05, 0x8e, 0x46, 0x08, 0x04, 0x00, 0x80, 0x00, 0x00];
        let door = Door::decode(&bytes, 0x200).unwrap();
        assert_eq!(door.encode(), bytes.to_vec());
    }

    #[test]
    fn accepts_undocumented_bit_flag_values() {
        let mut bytes = [0xf8, 0x91, 0xd0, 0x05, 0x8e, 0x46, 0x08, 0x04, 0x00, 0x80, 0x00, 0x00];
        let door = Door::decode(&bytes, 0x300).unwrap();
        if let Door::Simple(d) = &door {
            assert_eq!(d.bit_flag, DoorBitFlag::Unknown0xD0);
        } else {
            panic!("expected simple door");
        }
        bytes[2] = 0xf0;
        let door = Door::decode(&bytes, 0x300).unwrap();
        if let Door::Simple(d) = &door {
            assert_eq!(d.bit_flag, DoorBitFlag::Unknown0xF0);
        } else {
            panic!("expected simple door");
        }
    }
}
