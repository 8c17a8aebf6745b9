use std::ops::Range;

use memchr::memmem;

/// Split `buffer` on every occurrence of `delimiter`, returning byte ranges.
///
/// Scanning is bit-compatible with the legacy client's own reader:
///
/// - every chunk starts `delimiter.len()` bytes after the current scan offset,
///   so the first chunk skips a `delimiter.len()`-byte header and later chunks
///   skip the byte that follows the previous delimiter (the field length prefix)
/// - after a match at `i` the scan resumes at `i + 1`, not `i + delimiter.len()`,
///   so adjacent or overlapping delimiters each produce their own (possibly empty) chunk
///
/// The result always holds `occurrences + 1` ranges. A start offset that runs past
/// the next match or the end of the buffer collapses into an empty range.
pub fn split_ranges(buffer: &[u8], delimiter: &[u8]) -> Vec<Range<usize>> {
    if delimiter.is_empty() {
        return vec![0..buffer.len()];
    }

    let finder = memmem::Finder::new(delimiter);
    let mut ranges = Vec::new();
    let mut scan = 0usize;

    while scan < buffer.len() {
        let Some(found) = finder.find(&buffer[scan..]) else {
            break;
        };
        let position = scan + found;
        let start = (scan + delimiter.len()).min(position);
        ranges.push(start..position);
        scan = position + 1;
    }

    let start = (scan + delimiter.len()).min(buffer.len());
    ranges.push(start..buffer.len());
    ranges
}

/// Ordered view over the chunks of a delimiter-segmented buffer.
///
/// Borrowed from the source buffer and consumed by whichever decoder asked for it.
#[derive(Debug, Clone)]
pub struct DelimitedChunks<'a> {
    buffer: &'a [u8],
    ranges: Vec<Range<usize>>,
}

impl<'a> DelimitedChunks<'a> {
    pub fn split(buffer: &'a [u8], delimiter: &[u8]) -> Self {
        Self {
            buffer,
            ranges: split_ranges(buffer, delimiter),
        }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Chunk at position `index`, if present
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        self.ranges
            .get(index)
            .map(|range| &self.buffer[range.clone()])
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.ranges.iter().map(|range| &self.buffer[range.clone()])
    }
}
