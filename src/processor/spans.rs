//! Run-length spans of tile values.
//!
//! A row is stored as `(value, length - 1)` byte pairs. Runs longer than
//! 256 cells are split into 256-cell pieces, so the length byte never has
//! to represent zero.

/// A maximal run of one value starting at column `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub value: u8,
    pub start: usize,
    pub len: usize,
}

/// One `(value, length - 1)` pair as written to the row data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    /// Index of the span this piece belongs to.
    pub span: usize,
    /// First column covered by the piece.
    pub column: usize,
    /// Byte offset of the value byte within the encoded row.
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedRow {
    pub bytes: Vec<u8>,
    pub pieces: Vec<Piece>,
}

/// Merge adjacent identical values.
pub fn spans(values: &[u8]) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::new();
    for (column, &value) in values.iter().enumerate() {
        match out.last_mut() {
            Some(span) if span.value == value => span.len += 1,
            _ => out.push(Span { value, start: column, len: 1 }),
        }
    }
    out
}

pub fn encode_spans(spans: &[Span]) -> EncodedRow {
    let mut row = EncodedRow::default();
    for (index, span) in spans.iter().enumerate() {
        let mut remaining = span.len;
        let mut column = span.start;
        while remaining > 256 {
            row.pieces.push(Piece { span: index, column, offset: row.bytes.len() });
            row.bytes.extend_from_slice(&[span.value, 0xff]);
            remaining -= 256;
            column += 256;
        }
        if remaining > 0 {
            row.pieces.push(Piece { span: index, column, offset: row.bytes.len() });
            row.bytes.extend_from_slice(&[span.value, (remaining - 1) as u8]);
        }
    }
    row
}

/// Expand encoded span pairs back into one value per column.
///
/// A trailing odd byte is ignored.
pub fn decode_spans(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for pair in bytes.chunks_exact(2) {
        out.extend(std::iter::repeat(pair[0]).take(pair[1] as usize + 1));
    }
    out
}

/// Convenience: spans then bytes.
pub fn encode_row(values: &[u8]) -> EncodedRow {
    encode_spans(&spans(values))
}
