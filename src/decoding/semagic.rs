//! Decoder for the Semagic desktop client's `.slj` post files.
//!
//! A file is a sequence of fields separated by `FF FE FF`. Nothing about the
//! format is documented; field positions were worked out from sample files and
//! live in [`SEMAGIC_LAYOUT`]. Fixing a misread field means editing that table
//! and nothing else.

use std::path::Path;

use chrono::{DateTime, Utc};

use super::errors::{CodecError, DecodeError, FileDecodeError};
use super::integers::{decode_epoch_seconds, decode_le_uint};
use super::splitter::DelimitedChunks;
use crate::domain::entities::RawSemagicEntry;

pub const SEMAGIC_DELIMITER: [u8; 3] = [0xFF, 0xFE, 0xFF];

/// Extension used by the client for saved posts
pub const SEMAGIC_EXTENSION: &str = "slj";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemagicField {
    Id,
    Subject,
    Flags,
    Date,
    Body,
    Music,
    Mood,
    Avatar,
}

impl SemagicField {
    pub fn name(&self) -> &'static str {
        match self {
            SemagicField::Id => "id",
            SemagicField::Subject => "subject",
            SemagicField::Flags => "flags",
            SemagicField::Date => "date",
            SemagicField::Body => "body",
            SemagicField::Music => "music",
            SemagicField::Mood => "mood",
            SemagicField::Avatar => "avatar",
        }
    }
}

/// How the bytes of a field are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Little-endian unsigned integer of the given width
    LeUint(usize),
    /// 32-bit little-endian seconds since the Unix epoch
    EpochSeconds,
    /// UTF-16LE text; the first `skip_chars` characters are a length artifact
    Utf16Text { skip_chars: usize },
    /// Kept as-is
    Raw,
}

impl FieldKind {
    fn name(&self) -> &'static str {
        match self {
            FieldKind::LeUint(_) => "integer",
            FieldKind::EpochSeconds => "timestamp",
            FieldKind::Utf16Text { .. } => "text",
            FieldKind::Raw => "bytes",
        }
    }
}

/// Byte range inside a chunk.
///
/// Offsets follow slice-from-end rules: a negative offset counts back from the
/// end of the chunk, `end: None` means the end of the chunk, and any offset
/// past either edge is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteWindow {
    pub start: isize,
    pub end: Option<isize>,
}

impl ByteWindow {
    pub const WHOLE: ByteWindow = ByteWindow {
        start: 0,
        end: None,
    };

    pub const fn new(start: isize, end: isize) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub const fn tail(start: isize) -> Self {
        Self { start, end: None }
    }

    pub fn apply<'a>(&self, chunk: &'a [u8]) -> &'a [u8] {
        let len = chunk.len();
        let resolve = |offset: isize| -> usize {
            if offset < 0 {
                len.saturating_sub(offset.unsigned_abs())
            } else {
                offset.unsigned_abs().min(len)
            }
        };

        let start = resolve(self.start);
        let end = self.end.map_or(len, resolve);
        if end <= start {
            &chunk[start..start]
        } else {
            &chunk[start..end]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: SemagicField,
    pub chunk: usize,
    pub window: ByteWindow,
    pub kind: FieldKind,
}

pub const SEMAGIC_LAYOUT: &[FieldSpec] = &[
    FieldSpec {
        field: SemagicField::Id,
        chunk: 11,
        window: ByteWindow::new(0, 2),
        kind: FieldKind::LeUint(2),
    },
    FieldSpec {
        field: SemagicField::Body,
        chunk: 14,
        window: ByteWindow::WHOLE,
        kind: FieldKind::Utf16Text { skip_chars: 1 },
    },
    // Chunk 15 is the subject followed by a 24-byte trailer: 8 flag bytes,
    // the timestamp, and 12 bytes nobody has identified yet.
    FieldSpec {
        field: SemagicField::Subject,
        chunk: 15,
        window: ByteWindow::new(0, -24),
        kind: FieldKind::Utf16Text { skip_chars: 0 },
    },
    FieldSpec {
        field: SemagicField::Flags,
        chunk: 15,
        window: ByteWindow::new(-24, -16),
        kind: FieldKind::Raw,
    },
    FieldSpec {
        field: SemagicField::Date,
        chunk: 15,
        window: ByteWindow::new(-16, -12),
        kind: FieldKind::EpochSeconds,
    },
    FieldSpec {
        field: SemagicField::Music,
        chunk: 16,
        window: ByteWindow::WHOLE,
        kind: FieldKind::Utf16Text { skip_chars: 0 },
    },
    FieldSpec {
        field: SemagicField::Mood,
        chunk: 17,
        window: ByteWindow::tail(-4),
        kind: FieldKind::Utf16Text { skip_chars: 0 },
    },
    FieldSpec {
        field: SemagicField::Avatar,
        chunk: 18,
        window: ByteWindow::WHOLE,
        kind: FieldKind::Utf16Text { skip_chars: 0 },
    },
];

/// Smallest chunk count a layout can be decoded from
pub const fn min_chunks(layout: &[FieldSpec]) -> usize {
    let mut highest = 0;
    let mut i = 0;
    while i < layout.len() {
        if layout[i].chunk + 1 > highest {
            highest = layout[i].chunk + 1;
        }
        i += 1;
    }
    highest
}

pub const SEMAGIC_MIN_CHUNKS: usize = min_chunks(SEMAGIC_LAYOUT);

#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldValue {
    Uint(u64),
    Time(DateTime<Utc>),
    Text(Option<String>),
    Bytes(Vec<u8>),
}

#[derive(Default)]
struct EntryBuilder {
    id: Option<u32>,
    date: Option<DateTime<Utc>>,
    subject: Option<String>,
    body: Option<String>,
    music: Option<String>,
    mood: Option<String>,
    avatar: Option<String>,
    flags: Vec<u8>,
}

impl EntryBuilder {
    fn set(&mut self, field: SemagicField, kind: FieldKind, value: FieldValue) -> Result<(), DecodeError> {
        let mismatch = || DecodeError::KindMismatch {
            field: field.name(),
            kind: kind.name(),
        };

        match (field, value) {
            (SemagicField::Id, FieldValue::Uint(value)) => {
                let id = u32::try_from(value).map_err(|_| DecodeError::OutOfRange {
                    field: field.name(),
                    value,
                })?;
                self.id = Some(id);
            }
            (SemagicField::Date, FieldValue::Time(date)) => self.date = Some(date),
            (SemagicField::Flags, FieldValue::Bytes(bytes)) => self.flags = bytes,
            (SemagicField::Subject, FieldValue::Text(text)) => self.subject = text,
            (SemagicField::Body, FieldValue::Text(text)) => self.body = text,
            (SemagicField::Music, FieldValue::Text(text)) => self.music = text,
            (SemagicField::Mood, FieldValue::Text(text)) => self.mood = text,
            (SemagicField::Avatar, FieldValue::Text(text)) => self.avatar = text,
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    fn build(self) -> Result<RawSemagicEntry, DecodeError> {
        Ok(RawSemagicEntry {
            id: self.id.ok_or(DecodeError::MissingField("id"))?,
            date: self.date.ok_or(DecodeError::MissingField("date"))?,
            subject: self.subject,
            body: self.body,
            music: self.music,
            mood: self.mood,
            avatar: self.avatar,
            flags: self.flags,
        })
    }
}

/// Table-driven decoder for semagic buffers
#[derive(Debug, Clone, Copy)]
pub struct SemagicDecoder {
    layout: &'static [FieldSpec],
    min_chunks: usize,
}

impl Default for SemagicDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SemagicDecoder {
    pub fn new() -> Self {
        Self::with_layout(SEMAGIC_LAYOUT)
    }

    pub fn with_layout(layout: &'static [FieldSpec]) -> Self {
        Self {
            layout,
            min_chunks: min_chunks(layout),
        }
    }

    pub fn layout(&self) -> &'static [FieldSpec] {
        self.layout
    }

    /// Decode one buffer.
    ///
    /// Fails without producing a partial entry if the buffer has fewer chunks
    /// than the layout references or any field cannot be interpreted.
    pub fn decode(&self, buffer: &[u8]) -> Result<RawSemagicEntry, DecodeError> {
        let chunks = DelimitedChunks::split(buffer, &SEMAGIC_DELIMITER);
        if chunks.len() < self.min_chunks {
            return Err(DecodeError::ChunkCount {
                expected: self.min_chunks,
                found: chunks.len(),
            });
        }

        let mut builder = EntryBuilder::default();
        for spec in self.layout {
            let chunk = chunks.get(spec.chunk).ok_or(DecodeError::ChunkCount {
                expected: spec.chunk + 1,
                found: chunks.len(),
            })?;
            let value = decode_field(spec, spec.window.apply(chunk))?;
            builder.set(spec.field, spec.kind, value)?;
        }
        builder.build()
    }

    pub fn decode_file(
        &self,
        path: &Path,
        buffer: &[u8],
    ) -> Result<RawSemagicEntry, FileDecodeError> {
        self.decode(buffer)
            .map_err(|source| FileDecodeError::new(path, source))
    }
}

fn decode_field(spec: &FieldSpec, bytes: &[u8]) -> Result<FieldValue, DecodeError> {
    let field = spec.field.name();
    let codec = |source: CodecError| DecodeError::Codec { field, source };

    match spec.kind {
        FieldKind::LeUint(width) => decode_le_uint(bytes, width)
            .map(FieldValue::Uint)
            .map_err(codec),
        FieldKind::EpochSeconds => decode_epoch_seconds(bytes)
            .map(FieldValue::Time)
            .map_err(codec),
        FieldKind::Utf16Text { skip_chars } => {
            let text = decode_utf16le(bytes).ok_or(DecodeError::InvalidUtf16 { field })?;
            let text: String = text.chars().skip(skip_chars).collect();
            Ok(FieldValue::Text((!text.is_empty()).then_some(text)))
        }
        FieldKind::Raw => Ok(FieldValue::Bytes(bytes.to_vec())),
    }
}

/// Decode UTF-16LE, ignoring a trailing odd byte. `None` on unpaired surrogates.
pub fn decode_utf16le(bytes: &[u8]) -> Option<String> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    pub(crate) fn sample_buffer(id: u16, subject: &str, body: &str, date: DateTime<Utc>) -> Vec<u8> {
        let mut chunks: Vec<Vec<u8>> = vec![Vec::new(); SEMAGIC_MIN_CHUNKS];
        chunks[11] = id.to_le_bytes().to_vec();
        chunks[14] = utf16(&format!("X{}", body));
        let mut trailer = utf16(subject);
        trailer.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        trailer.extend_from_slice(&(date.timestamp() as u32).to_le_bytes());
        trailer.extend_from_slice(&[0; 12]);
        chunks[15] = trailer;
        chunks[16] = utf16("Radiohead");
        chunks[17] = utf16("xxhi");
        chunks[18] = utf16("default");

        let mut buffer = vec![0, 0, 0];
        for (index, chunk) in chunks.iter().enumerate() {
            if index > 0 {
                buffer.extend_from_slice(&SEMAGIC_DELIMITER);
                buffer.push(0);
            }
            buffer.extend_from_slice(chunk);
        }
        buffer
    }
}
