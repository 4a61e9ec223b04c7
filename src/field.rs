//! Command-level encodings of a run of uncompressed level data. A `Field` is the
//! smallest unit the compressor emits and the decompressor consumes.

use crate::error::{CodecError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    DirectCopy = 0b000,
    ByteFill = 0b001,
    WordFill = 0b010,
}

/// Encodes the command envelope for `num_bytes` bytes of `command`.
///
/// `num_bytes` in 1..=32 uses the one-byte short form (3-bit command, 5-bit
/// length-1); 33..=1024 uses the two-byte extended form (the `0b111` escape, 3-bit
/// command, 10-bit length-1). The boundary sits at 32/33, not the off-by-one some
/// historical tooling used (see DESIGN.md).
pub fn encode_envelope(command: Command, num_bytes: usize) -> Result<Vec<u8>> {
    if num_bytes == 0 || num_bytes > 1024 {
        return Err(CodecError::OutOfRange(format!(
            "field length {} is outside 1..=1024",
            num_bytes
        )));
    }

    let cmd = command as u8;
    if num_bytes <= 32 {
        let len_field = (num_bytes - 1) as u8;
        Ok(vec![(cmd << 5) | len_field])
    } else {
        let len_field = (num_bytes - 1) as u16;
        let b0 = 0b1110_0000 | (cmd << 2) | ((len_field >> 8) as u8 & 0x3);
        let b1 = (len_field & 0xff) as u8;
        Ok(vec![b0, b1])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    DirectCopy { bytes: Vec<u8> },
    ByteFill { byte: u8, num_bytes: usize },
    WordFill { word: [u8; 2], num_bytes: usize },
    L1Repeater { attributes: [u8; 2], num_reps: usize },
    BtsRepeater { bts_num: u8, num_reps: usize },
    BtsSingle { bts_num: u8 },
}

impl Field {
    pub fn num_bytes(&self) -> usize {
        match self {
            Field::DirectCopy { bytes } => bytes.len(),
            Field::ByteFill { num_bytes, .. } => *num_bytes,
            Field::WordFill { num_bytes, .. } => *num_bytes,
            Field::L1Repeater { num_reps, .. } => *num_reps,
            Field::BtsRepeater { num_reps, .. } => *num_reps,
            Field::BtsSingle { .. } => 1,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Field::DirectCopy { bytes } => {
                let mut out = encode_envelope(Command::DirectCopy, bytes.len())?;
                out.extend_from_slice(bytes);
                Ok(out)
            }
            Field::ByteFill { byte, num_bytes } => {
                let mut out = encode_envelope(Command::ByteFill, *num_bytes)?;
                out.push(*byte);
                Ok(out)
            }
            Field::WordFill { word, num_bytes } => {
                let mut out = encode_envelope(Command::WordFill, *num_bytes)?;
                out.extend_from_slice(word);
                Ok(out)
            }
            Field::L1Repeater {
                attributes,
                num_reps,
            } => {
                if *num_reps == 0 || *num_reps > 0x80 {
                    return Err(CodecError::OutOfRange(format!(
                        "l1 repeater count {} out of range",
                        num_reps
                    )));
                }
                let header = 0xe801u16 + (((*num_reps - 1) as u16) << 1);
                let mut out = header.to_be_bytes().to_vec();
                out.extend_from_slice(attributes);
                Ok(out)
            }
            Field::BtsRepeater { bts_num, num_reps } => {
                if *num_reps == 0 || *num_reps > 0x100 {
                    return Err(CodecError::OutOfRange(format!(
                        "bts repeater count {} out of range",
                        num_reps
                    )));
                }
                let header = 0xe400u16 + (*num_reps - 1) as u16;
                let mut out = header.to_be_bytes().to_vec();
                out.push(*bts_num);
                Ok(out)
            }
            Field::BtsSingle { bts_num } => Ok(vec![0x00, *bts_num]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_envelope_at_32_bytes() {
        let env = encode_envelope(Command::DirectCopy, 32).unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(env[0], 0b0001_1111);
    }

    #[test]
    fn long_envelope_at_33_bytes() {
        let env = encode_envelope(Command::DirectCopy, 33).unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env[0], 0b1110_0000);
        assert_eq!(env[1], 0b0010_0000);
    }

    #[test]
    fn byte_fill_encodes_command_and_payload() {
        let f = Field::ByteFill {
            byte: 0xaa,
            num_bytes: 3,
        };
        let out = f.encode().unwrap();
        assert_eq!(out, vec![(0b001 << 5) | 2, 0xaa]);
    }

    #[test]
    fn word_fill_encodes_two_payload_bytes() {
        let f = Field::WordFill {
            word: [0x55, 0xaa],
            num_bytes: 4,
        };
        let out = f.encode().unwrap();
        assert_eq!(out, vec![(0b010 << 5) | 3, 0x55, 0xaa]);
    }

    #[test]
    fn direct_copy_out_of_range_length_errors() {
        let env = encode_envelope(Command::DirectCopy, 0);
        assert!(env.is_err());
        let env = encode_envelope(Command::DirectCopy, 1025);
        assert!(env.is_err());
    }

    #[test]
    fn l1_repeater_matches_literal_header() {
        let f = Field::L1Repeater {
            attributes: [0x12, 0x34],
            num_reps: 1,
        };
        let out = f.encode().unwrap();
        assert_eq!(&out[0..2], &[0xe8, 0x01]);
        assert_eq!(&out[2..4], &[0x12, 0x34]);
    }
}
