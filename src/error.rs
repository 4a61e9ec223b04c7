use failure::Fail;

/// Error type for every fallible operation in this crate.
#[derive(Debug, Fail)]
pub enum CodecError {
    #[fail(display = "invalid address: {}", _0)]
    InvalidAddress(String),

    #[fail(display = "value out of range: {}", _0)]
    OutOfRange(String),

    #[fail(display = "tile grid has an empty cell at ({}, {})", col, row)]
    EmptyCell { col: usize, row: usize },

    #[fail(
        display = "compressed data is {} bytes, but the room's level data slot is only {} bytes",
        actual, max
    )]
    TooLarge { actual: usize, max: usize },

    #[fail(display = "unrecognized header bytes at offset {}: {:?}", offset, bytes)]
    UnrecognizedHeader { offset: usize, bytes: Vec<u8> },

    #[fail(display = "a room with header address {:#x} already exists", _0)]
    DuplicateRoom(u32),

    #[fail(
        display = "source rom is {} bytes, expected the unheadered {} byte size",
        actual, expected
    )]
    InvalidRomSize { actual: usize, expected: usize },

    #[fail(display = "i/o error: {}", _0)]
    Io(#[cause] std::io::Error),

    #[fail(display = "room list error: {}", _0)]
    Yaml(#[cause] serde_yaml::Error),
}

impl From<std::io::Error> for CodecError {
    fn from(e: std::io::Error) -> Self {
        CodecError::Io(e)
    }
}

impl From<serde_yaml::Error> for CodecError {
    fn from(e: serde_yaml::Error) -> Self {
        CodecError::Yaml(e)
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
