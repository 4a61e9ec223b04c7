//! LoROM <-> PC address translation.
//!
//! Super Metroid's cartridge is mapped LoROM: the top byte of a 24-bit address is
//! the bank, and the low 15 bits of the remaining word select an offset within that
//! bank. Bit 15 of the low word is ignored by the hardware, which is why an
//! out-of-range offset is silently masked rather than rejected (see `lorom_to_pc`).

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::trace;

use crate::error::{CodecError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Converts a 3-byte LoROM address to a flat PC offset into an unheadered ROM image.
///
/// `bytes` must be exactly 3 bytes, interpreted per `endian` as bank in the top byte
/// and a 16-bit offset in the remaining two. Banks outside `0x80..=0xFF` are rejected;
/// an offset whose low word exceeds the bank window is masked to 15 bits, matching the
/// hardware's own tolerance for malformed addresses.
pub fn lorom_to_pc(bytes: &[u8], endian: Endian) -> Result<u32> {
    if bytes.len() != 3 {
        return Err(CodecError::InvalidAddress(format!(
            "lorom address must be 3 bytes, got {}",
            bytes.len()
        )));
    }

    let (bank, offset) = match endian {
        Endian::Big => (bytes[0], BigEndian::read_u16(&bytes[1..3])),
        Endian::Little => (bytes[2], LittleEndian::read_u16(&bytes[0..2])),
    };

    if bank < 0x80 {
        return Err(CodecError::InvalidAddress(format!(
            "lorom bank {:#x} is below 0x80",
            bank
        )));
    }

    if offset & 0x8000 == 0 {
        trace!(
            "lorom offset {:#x} in bank {:#x} has bit 15 clear; masking to 15 bits",
            offset,
            bank
        );
    }

    let masked_low15 = offset & 0x7fff;
    let d = (bank - 0x80) as u32;
    let high_bit = if d % 2 == 1 { 0x8000 } else { 0x0000 };

    Ok((d / 2) * 0x10000 + masked_low15 as u32 + high_bit)
}

/// Converts a flat PC offset back into a canonical 3-byte LoROM address.
///
/// The result always has bit 15 of the low word set, which is the canonical encoding
/// the hardware expects. `lorom_to_pc` discards the original offset's bit 15 entirely
/// (see the masking note above), so this function cannot recover it; round-tripping
/// only reproduces `V` when `V`'s offset already had bit 15 set, i.e. `V` was itself a
/// canonical address rather than one of the malformed inputs `lorom_to_pc` tolerates.
pub fn pc_to_lorom(pc: u32, endian: Endian) -> [u8; 3] {
    let pair = pc / 0x10000;
    let rem = pc % 0x10000;

    let d = if rem < 0x8000 { pair * 2 } else { pair * 2 + 1 };
    let bank = (d + 0x80) as u8;
    let low15 = if rem < 0x8000 { rem } else { rem - 0x8000 };
    let offset = (low15 | 0x8000) as u16;

    match endian {
        Endian::Big => {
            let mut out = [0u8; 3];
            out[0] = bank;
            BigEndian::write_u16(&mut out[1..3], offset);
            out
        }
        Endian::Little => {
            let mut out = [0u8; 3];
            LittleEndian::write_u16(&mut out[0..2], offset);
            out[2] = bank;
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_round_trip() {
        assert_eq!(
            lorom_to_pc(&[0xc3, 0xbc, 0xd2], Endian::Big).unwrap(),
            0x21bcd2
        );
    }

    #[test]
    fn little_endian_round_trip() {
        assert_eq!(
            lorom_to_pc(&[0xd2, 0xbc, 0xc3], Endian::Little).unwrap(),
            0x21bcd2
        );
    }

    #[test]
    fn masks_high_bit_of_offset() {
        assert_eq!(
            lorom_to_pc(&[0xc6, 0x9f, 0x4b], Endian::Big).unwrap(),
            0x231f4b
        );
        assert_eq!(
            lorom_to_pc(&[0xc6, 0x1f, 0x4b], Endian::Big).unwrap(),
            0x231f4b
        );
    }

    #[test]
    fn matches_rom_addr_macro_reference() {
        // konkers-sm's rom_addr!(0x8f, 0x93fe) == 0x793fe
        assert_eq!(
            lorom_to_pc(&[0x8f, 0x93, 0xfe], Endian::Big).unwrap(),
            0x793fe
        );
    }

    #[test]
    fn rejects_bank_below_0x80() {
        assert!(lorom_to_pc(&[0x7f, 0x00, 0x00], Endian::Big).is_err());
    }

    #[test]
    fn pc_to_lorom_is_inverse_of_lorom_to_pc() {
        let pc = lorom_to_pc(&[0xc3, 0xbc, 0xd2], Endian::Big).unwrap();
        let back = pc_to_lorom(pc, Endian::Big);
        assert_eq!(back, [0xc3, 0xbc, 0xd2]);
    }

    #[test]
    fn pc_to_lorom_odd_bank() {
        let pc = lorom_to_pc(&[0x8f, 0x93, 0xfe], Endian::Big).unwrap();
        assert_eq!(pc_to_lorom(pc, Endian::Big), [0x8f, 0x93, 0xfe]);
    }

    #[test]
    fn pc_to_lorom_even_bank_round_trip() {
        let pc = lorom_to_pc(&[0x82, 0x92, 0x34], Endian::Big).unwrap();
        assert_eq!(pc_to_lorom(pc, Endian::Big), [0x82, 0x92, 0x34]);
    }
}
