//! Typed column buffers and the scaling pass.

use ergfile_types::SignalKind;

/// One extracted signal column in its native element type.
///
/// Ownership transfers to the caller; the buffer is independent of the
/// mapped archive.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    /// Raw fields of `width` bytes each, concatenated.
    Bytes { width: usize, data: Vec<u8> },
}

impl Column {
    /// Number of samples in the column.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::F32(v) => v.len(),
            Column::F64(v) => v.len(),
            Column::I8(v) => v.len(),
            Column::U8(v) => v.len(),
            Column::I16(v) => v.len(),
            Column::U16(v) => v.len(),
            Column::I32(v) => v.len(),
            Column::U32(v) => v.len(),
            Column::I64(v) => v.len(),
            Column::U64(v) => v.len(),
            Column::Bytes { width, data } => data.len() / width,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode a gathered little-endian byte column into its native type.
    ///
    /// `raw.len()` must be a multiple of the element size; the extractor
    /// guarantees it.
    pub(crate) fn from_raw(kind: SignalKind, raw: &[u8]) -> Column {
        match kind {
            SignalKind::F32 => Column::F32(decode(raw, f32::from_le_bytes)),
            SignalKind::F64 => Column::F64(decode(raw, f64::from_le_bytes)),
            SignalKind::I8 => Column::I8(decode(raw, i8::from_le_bytes)),
            SignalKind::U8 => Column::U8(raw.to_vec()),
            SignalKind::I16 => Column::I16(decode(raw, i16::from_le_bytes)),
            SignalKind::U16 => Column::U16(decode(raw, u16::from_le_bytes)),
            SignalKind::I32 => Column::I32(decode(raw, i32::from_le_bytes)),
            SignalKind::U32 => Column::U32(decode(raw, u32::from_le_bytes)),
            SignalKind::I64 => Column::I64(decode(raw, i64::from_le_bytes)),
            SignalKind::U64 => Column::U64(decode(raw, u64::from_le_bytes)),
            SignalKind::Bytes(width) => Column::Bytes {
                width: width as usize,
                data: raw.to_vec(),
            },
            SignalKind::Unknown => Column::Bytes {
                width: 0,
                data: Vec::new(),
            },
        }
    }

    /// Apply `value * factor + offset` in the column's native type.
    ///
    /// `factor` and `offset` are cast to the element type first, so
    /// non-integer scalings truncate on integer columns and integer
    /// arithmetic wraps; this mirrors the original tooling and is kept
    /// deliberately. `Bytes` columns are never scaled.
    pub(crate) fn scale(&mut self, factor: f64, offset: f64) {
        macro_rules! scale_integers {
            ($values:expr, $ty:ty) => {{
                let factor = factor as $ty;
                let offset = offset as $ty;
                for value in $values.iter_mut() {
                    *value = value.wrapping_mul(factor).wrapping_add(offset);
                }
            }};
        }

        match self {
            Column::F32(values) => {
                let factor = factor as f32;
                let offset = offset as f32;
                for value in values.iter_mut() {
                    *value = *value * factor + offset;
                }
            }
            Column::F64(values) => {
                for value in values.iter_mut() {
                    *value = *value * factor + offset;
                }
            }
            Column::I8(values) => scale_integers!(values, i8),
            Column::U8(values) => scale_integers!(values, u8),
            Column::I16(values) => scale_integers!(values, i16),
            Column::U16(values) => scale_integers!(values, u16),
            Column::I32(values) => scale_integers!(values, i32),
            Column::U32(values) => scale_integers!(values, u32),
            Column::I64(values) => scale_integers!(values, i64),
            Column::U64(values) => scale_integers!(values, u64),
            Column::Bytes { .. } => {}
        }
    }
}

/// Widen a gathered byte column straight to f64, one cast per element.
///
/// `Bytes` fields have no numeric reading and widen as 0.0.
pub(crate) fn widen_raw(kind: SignalKind, raw: &[u8]) -> Vec<f64> {
    match kind {
        SignalKind::F32 => decode_to_f64(raw, |b| f64::from(f32::from_le_bytes(b))),
        SignalKind::F64 => decode_to_f64(raw, f64::from_le_bytes),
        SignalKind::I8 => decode_to_f64(raw, |b| f64::from(i8::from_le_bytes(b))),
        SignalKind::U8 => raw.iter().map(|&b| f64::from(b)).collect(),
        SignalKind::I16 => decode_to_f64(raw, |b| f64::from(i16::from_le_bytes(b))),
        SignalKind::U16 => decode_to_f64(raw, |b| f64::from(u16::from_le_bytes(b))),
        SignalKind::I32 => decode_to_f64(raw, |b| f64::from(i32::from_le_bytes(b))),
        SignalKind::U32 => decode_to_f64(raw, |b| f64::from(u32::from_le_bytes(b))),
        SignalKind::I64 => decode_to_f64(raw, |b| i64::from_le_bytes(b) as f64),
        SignalKind::U64 => decode_to_f64(raw, |b| u64::from_le_bytes(b) as f64),
        SignalKind::Bytes(width) => vec![0.0; raw.len() / width as usize],
        SignalKind::Unknown => Vec::new(),
    }
}

fn decode<const N: usize, T>(raw: &[u8], convert: impl Fn([u8; N]) -> T) -> Vec<T> {
    raw.chunks_exact(N).map(|chunk| convert(array(chunk))).collect()
}

fn decode_to_f64<const N: usize>(raw: &[u8], convert: impl Fn([u8; N]) -> f64) -> Vec<f64> {
    decode(raw, convert)
}

fn array<const N: usize>(chunk: &[u8]) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(chunk);
    bytes
}
