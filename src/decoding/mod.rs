pub mod errors;
pub mod integers;
pub mod semagic;
pub mod splitter;

pub use errors::{CodecError, DecodeError, FileDecodeError};
pub use integers::{
    decode_epoch_seconds, decode_le_u16, decode_le_u32, decode_le_uint, encode_epoch_seconds,
};
pub use semagic::{SemagicDecoder, SEMAGIC_DELIMITER, SEMAGIC_LAYOUT, SEMAGIC_MIN_CHUNKS};
pub use splitter::{split_ranges, DelimitedChunks};
