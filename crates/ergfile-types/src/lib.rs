//! Signal model and row layout for ergfile archives.
//!
//! An archive row is the concatenation, in declaration order, of every
//! signal's fixed-width little-endian field. This crate holds the type map
//! from sidecar type tokens to element kinds, the per-signal metadata
//! record, and the derived row layout (stride plus per-column byte
//! offsets).

use tracing::warn;

/// Size of the opaque header at the start of every binary archive file.
pub const ARCHIVE_HEADER_BYTES: usize = 16;

/// Element kind of one signal column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    F32,
    F64,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    /// Raw field of 1..=8 bytes, copied without interpretation.
    Bytes(u8),
    /// Unrecognized type token; occupies zero bytes and poisons the layout.
    Unknown,
}

impl SignalKind {
    /// Map a sidecar `File.At.<i>.Type` token to an element kind.
    ///
    /// `"<n> Bytes"` tokens parse their leading integer; widths outside
    /// 1..=8 are reported and collapse to [`SignalKind::Unknown`].
    #[must_use]
    pub fn from_type_token(token: &str) -> Self {
        match token {
            "Float" => SignalKind::F32,
            "Double" => SignalKind::F64,
            "LongLong" => SignalKind::I64,
            "ULongLong" => SignalKind::U64,
            "Int" => SignalKind::I32,
            "UInt" => SignalKind::U32,
            "Short" => SignalKind::I16,
            "UShort" => SignalKind::U16,
            "Char" => SignalKind::I8,
            "UChar" => SignalKind::U8,
            _ if token.contains("Bytes") => {
                let digits: String = token
                    .chars()
                    .take_while(|ch| ch.is_ascii_digit())
                    .collect();
                match digits.parse::<u8>() {
                    Ok(n) if (1..=8).contains(&n) => SignalKind::Bytes(n),
                    _ => {
                        warn!(token, "unrecognized byte-width type token");
                        SignalKind::Unknown
                    }
                }
            }
            _ => SignalKind::Unknown,
        }
    }

    /// Width of one element in the packed row.
    #[must_use]
    pub const fn size_bytes(self) -> usize {
        match self {
            SignalKind::I8 | SignalKind::U8 => 1,
            SignalKind::I16 | SignalKind::U16 => 2,
            SignalKind::F32 | SignalKind::I32 | SignalKind::U32 => 4,
            SignalKind::F64 | SignalKind::I64 | SignalKind::U64 => 8,
            SignalKind::Bytes(n) => n as usize,
            SignalKind::Unknown => 0,
        }
    }

    /// Whether the kind has a native numeric representation the scaling
    /// pass can operate in.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, SignalKind::Bytes(_) | SignalKind::Unknown)
    }
}

/// Metadata for one named signal column.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Signal identifier, e.g. `Car.v`.
    pub name: String,
    pub kind: SignalKind,
    /// Unit string from the sidecar, empty when undeclared.
    pub unit: String,
    /// Scaling factor, 1.0 when undeclared.
    pub factor: f64,
    /// Scaling offset, 0.0 when undeclared.
    pub offset: f64,
}

impl Signal {
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.kind.size_bytes()
    }

    /// Whether extraction must run the scaling pass for this signal.
    #[must_use]
    pub fn is_scaled(&self) -> bool {
        self.factor != 1.0 || self.offset != 0.0
    }
}

/// Byte layout of one packed sample row.
#[derive(Debug, Clone, Default)]
pub struct RowLayout {
    row_size: usize,
    offsets: Vec<usize>,
}

impl RowLayout {
    /// Derive the layout from signals in declaration order.
    #[must_use]
    pub fn from_signals(signals: &[Signal]) -> Self {
        let mut offsets = Vec::with_capacity(signals.len());
        let mut row_size = 0;
        for signal in signals {
            offsets.push(row_size);
            row_size += signal.size_bytes();
        }
        RowLayout { row_size, offsets }
    }

    /// Stride of one sample row in bytes.
    #[must_use]
    pub fn row_size(&self) -> usize {
        self.row_size
    }

    /// Byte offset of column `index` within a row.
    ///
    /// # Panics
    /// Panics when `index` is out of range; callers resolve names to valid
    /// indices before asking for offsets.
    #[must_use]
    pub fn column_offset(&self, index: usize) -> usize {
        self.offsets[index]
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.offsets.len()
    }
}
