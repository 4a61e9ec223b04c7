//! The façade a host application uses: open a source image, import the configured
//! rooms, edit them, and write a modified image back out.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_hex::{SerHex, StrictPfx};

use crate::bytes::overwrite;
use crate::error::{CodecError, Result};
use crate::importer::{import_room, TileGridCache};
use crate::room_dict::RoomDict;

/// Size of the community-standard unheadered ROM image this crate operates on.
const SOURCE_ROM_SIZE: usize = 0x300000;

/// One entry of the room-header YAML list: a header address to import, and an
/// optional display name that is never written back to the ROM. `header` is written
/// hex-prefixed (e.g. `"0x795d4"`) rather than as a bare YAML integer, matching how
/// the rest of this crate renders addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomImportEntry {
    #[serde(with = "SerHex::<StrictPfx>")]
    pub header: u32,
    pub name: Option<String>,
}

fn check_rom_size(bytes: &[u8]) -> Result<()> {
    if bytes.len() != SOURCE_ROM_SIZE {
        return Err(CodecError::InvalidRomSize {
            actual: bytes.len(),
            expected: SOURCE_ROM_SIZE,
        });
    }
    Ok(())
}

pub struct Project {
    pub source_rom_path: String,
    pub rooms: RoomDict,
}

impl Project {
    pub fn new(source_rom_path: impl Into<String>) -> Self {
        Project {
            source_rom_path: source_rom_path.into(),
            rooms: RoomDict::new(),
        }
    }

    /// Reads the source image, rejecting anything other than a 0x300000-byte
    /// unheadered ROM.
    pub fn source_rom_contents(&self) -> Result<Vec<u8>> {
        let bytes = fs::read(&self.source_rom_path)?;
        check_rom_size(&bytes)?;
        Ok(bytes)
    }

    /// Imports every room listed in the YAML document at `header_list_path`, in
    /// file order.
    pub fn import_rooms(&mut self, header_list_path: impl AsRef<Path>) -> Result<()> {
        let yaml = fs::read_to_string(header_list_path)?;
        let entries: Vec<RoomImportEntry> = serde_yaml::from_str(&yaml)?;
        let rom = self.source_rom_contents()?;
        let mut cache = TileGridCache::new();

        for entry in entries {
            let mut room = import_room(&rom, entry.header as usize, &mut cache)?;
            room.name = entry.name;
            self.rooms.add_room(room)?;
        }
        Ok(())
    }

    /// Starts from the source image and overwrites each room's compressed level
    /// data (when `write_level_data` is set) and door records, in ascending header
    /// order. No other bytes change and the image length is preserved.
    pub fn modified_rom_contents(&self) -> Result<Vec<u8>> {
        let mut rom = self.source_rom_contents()?;

        for room in self.rooms.iter() {
            if room.write_level_data {
                let compressed = room.compressed_level_data(&room.standard_state)?;
                rom = overwrite(&rom, &compressed, room.standard_state.level_data_address as usize);
            }
            for door in &room.doors {
                rom = overwrite(&rom, &door.encode(), door.data_address() as usize);
            }
        }

        Ok(rom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_import_entry_parses_from_yaml() {
        let yaml = "- header: \"0x795d4\"\n  name: Landing Site\n- header: \"0x7b\"\n";
        let entries: Vec<RoomImportEntry> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].header, 0x795d4);
        assert_eq!(entries[0].name.as_deref(), Some("Landing Site"));
        assert_eq!(entries[1].header, 123);
        assert_eq!(entries[1].name, None);
    }

    #[test]
    fn room_import_entry_round_trips_through_yaml() {
        let entry = RoomImportEntry {
            header: 0x795d4,
            name: Some("Landing Site".into()),
        };
        let yaml = serde_yaml::to_string(&entry).unwrap();
        let back: RoomImportEntry = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.header, entry.header);
        assert_eq!(back.name, entry.name);
    }

    #[test]
    fn rejects_rom_of_wrong_size() {
        let err = check_rom_size(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidRomSize { .. }));
    }

    #[test]
    fn accepts_rom_of_exact_size() {
        assert!(check_rom_size(&vec![0u8; SOURCE_ROM_SIZE]).is_ok());
    }
}
