//! Byte-class scans for the sidecar text parser.
//!
//! All scans process 32 bytes per step on AVX2-capable hosts and fall back
//! to scalar loops for tails, short inputs, and lesser tiers. Results are
//! identical across tiers.

use crate::SimdLevel;

/// ASCII whitespace the sidecar format trims: space, tab, CR, LF.
#[inline]
fn is_ws(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

/// Separator class found by [`find_separator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `#`: the line is a comment.
    Comment,
    /// `=`: single-line entry.
    Equals,
    /// `:`: multi-line entry opener.
    Colon,
}

/// Offset of the first occurrence of `needle`, if any.
#[must_use]
pub fn find_byte(haystack: &[u8], needle: u8, level: SimdLevel) -> Option<usize> {
    #[cfg(target_arch = "x86_64")]
    if level >= SimdLevel::Avx2 && haystack.len() >= 32 {
        // SAFETY: Avx2 level implies the host supports the feature.
        return unsafe { find_byte_avx2(haystack, needle) };
    }
    let _ = level;
    memchr::memchr(needle, haystack)
}

/// Offset and class of the first `#`, `=`, or `:` in `line`.
///
/// Strict first occurrence: whichever of the three classes appears
/// earliest wins, on every tier.
#[must_use]
pub fn find_separator(line: &[u8], level: SimdLevel) -> Option<(usize, Separator)> {
    #[cfg(target_arch = "x86_64")]
    if level >= SimdLevel::Avx2 && line.len() >= 32 {
        // SAFETY: Avx2 level implies the host supports the feature.
        return unsafe { find_separator_avx2(line) };
    }
    let _ = level;
    find_separator_scalar(line, 0)
}

/// Count of whitespace bytes at the start of `buf`.
#[must_use]
pub fn skip_leading_ws(buf: &[u8], level: SimdLevel) -> usize {
    #[cfg(target_arch = "x86_64")]
    if level >= SimdLevel::Avx2 && buf.len() >= 32 {
        // SAFETY: Avx2 level implies the host supports the feature.
        return unsafe { skip_leading_ws_avx2(buf) };
    }
    let _ = level;
    skip_leading_ws_scalar(buf, 0)
}

/// Range of `buf` with leading and trailing whitespace removed.
///
/// Returns `(start, end)` with `start <= end`; an all-whitespace input
/// collapses to `(len, len)`.
#[must_use]
pub fn trim(buf: &[u8], level: SimdLevel) -> (usize, usize) {
    let start = skip_leading_ws(buf, level);
    if start == buf.len() {
        return (buf.len(), buf.len());
    }
    // Trailing trim walks backwards; the run is short in practice and a
    // reversed wide scan buys nothing.
    let mut end = buf.len();
    while end > start && is_ws(buf[end - 1]) {
        end -= 1;
    }
    (start, end)
}

fn find_separator_scalar(line: &[u8], from: usize) -> Option<(usize, Separator)> {
    line[from..].iter().enumerate().find_map(|(i, &byte)| {
        let class = match byte {
            b'#' => Separator::Comment,
            b'=' => Separator::Equals,
            b':' => Separator::Colon,
            _ => return None,
        };
        Some((from + i, class))
    })
}

fn skip_leading_ws_scalar(buf: &[u8], from: usize) -> usize {
    buf[from..]
        .iter()
        .position(|&byte| !is_ws(byte))
        .map_or(buf.len(), |i| from + i)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn find_byte_avx2(haystack: &[u8], needle: u8) -> Option<usize> {
    use std::arch::x86_64::*;

    let splat = _mm256_set1_epi8(needle as i8);
    let mut i = 0;
    while i + 32 <= haystack.len() {
        let block = _mm256_loadu_si256(haystack.as_ptr().add(i).cast());
        let mask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(block, splat)) as u32;
        if mask != 0 {
            return Some(i + mask.trailing_zeros() as usize);
        }
        i += 32;
    }
    memchr::memchr(needle, &haystack[i..]).map(|off| i + off)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn find_separator_avx2(line: &[u8]) -> Option<(usize, Separator)> {
    use std::arch::x86_64::*;

    let hash = _mm256_set1_epi8(b'#' as i8);
    let equals = _mm256_set1_epi8(b'=' as i8);
    let colon = _mm256_set1_epi8(b':' as i8);

    let mut i = 0;
    while i + 32 <= line.len() {
        let block = _mm256_loadu_si256(line.as_ptr().add(i).cast());
        let any = _mm256_or_si256(
            _mm256_cmpeq_epi8(block, hash),
            _mm256_or_si256(
                _mm256_cmpeq_epi8(block, equals),
                _mm256_cmpeq_epi8(block, colon),
            ),
        );
        let mask = _mm256_movemask_epi8(any) as u32;
        if mask != 0 {
            let offset = i + mask.trailing_zeros() as usize;
            let class = match line[offset] {
                b'#' => Separator::Comment,
                b'=' => Separator::Equals,
                _ => Separator::Colon,
            };
            return Some((offset, class));
        }
        i += 32;
    }
    find_separator_scalar(line, i)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn skip_leading_ws_avx2(buf: &[u8]) -> usize {
    use std::arch::x86_64::*;

    let space = _mm256_set1_epi8(b' ' as i8);
    let tab = _mm256_set1_epi8(b'\t' as i8);
    let cr = _mm256_set1_epi8(b'\r' as i8);
    let lf = _mm256_set1_epi8(b'\n' as i8);

    let mut i = 0;
    while i + 32 <= buf.len() {
        let block = _mm256_loadu_si256(buf.as_ptr().add(i).cast());
        let ws = _mm256_or_si256(
            _mm256_or_si256(
                _mm256_cmpeq_epi8(block, space),
                _mm256_cmpeq_epi8(block, tab),
            ),
            _mm256_or_si256(_mm256_cmpeq_epi8(block, cr), _mm256_cmpeq_epi8(block, lf)),
        );
        let mask = _mm256_movemask_epi8(ws) as u32;
        if mask != u32::MAX {
            return i + (!mask).trailing_zeros() as usize;
        }
        i += 32;
    }
    skip_leading_ws_scalar(buf, i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> Vec<SimdLevel> {
        SimdLevel::detect().supported_levels().to_vec()
    }

    #[test]
    fn test_find_byte_all_levels() {
        let mut text = vec![b'x'; 100];
        text[67] = b'\n';
        for level in levels() {
            assert_eq!(find_byte(&text, b'\n', level), Some(67), "level {level}");
            assert_eq!(find_byte(&text, b'?', level), None, "level {level}");
            assert_eq!(find_byte(b"", b'\n', level), None, "level {level}");
        }
    }

    #[test]
    fn test_find_byte_short_input() {
        for level in levels() {
            assert_eq!(find_byte(b"ab\ncd", b'\n', level), Some(2), "level {level}");
        }
    }

    #[test]
    fn test_find_separator_classes() {
        for level in levels() {
            let long_pad = " ".repeat(40);
            let eq = format!("{long_pad}key = value");
            let colon = format!("{long_pad}key: value");
            let hash = format!("{long_pad}# comment");
            assert_eq!(
                find_separator(eq.as_bytes(), level),
                Some((44, Separator::Equals)),
                "level {level}"
            );
            assert_eq!(
                find_separator(colon.as_bytes(), level),
                Some((43, Separator::Colon)),
                "level {level}"
            );
            assert_eq!(
                find_separator(hash.as_bytes(), level),
                Some((40, Separator::Comment)),
                "level {level}"
            );
            assert_eq!(find_separator(b"no separator here", level), None);
        }
    }

    #[test]
    fn test_find_separator_first_wins() {
        for level in levels() {
            // '=' precedes ':' and '#'; first occurrence decides the class
            // identically on every tier.
            let line = format!("Path = /tmp:/var # note {}", "x".repeat(40));
            assert_eq!(
                find_separator(line.as_bytes(), level),
                Some((5, Separator::Equals)),
                "level {level}"
            );
        }
    }

    #[test]
    fn test_skip_leading_ws() {
        for level in levels() {
            assert_eq!(skip_leading_ws(b"   abc", level), 3, "level {level}");
            assert_eq!(skip_leading_ws(b"abc", level), 0);
            assert_eq!(skip_leading_ws(b"\t\r\n ", level), 4);
            assert_eq!(skip_leading_ws(b"", level), 0);
            let long = format!("{}end", " ".repeat(70));
            assert_eq!(skip_leading_ws(long.as_bytes(), level), 70, "level {level}");
        }
    }

    #[test]
    fn test_trim() {
        for level in levels() {
            assert_eq!(trim(b"  hi  ", level), (2, 4), "level {level}");
            assert_eq!(trim(b"hi", level), (0, 2));
            assert_eq!(trim(b"   ", level), (3, 3));
            assert_eq!(trim(b"", level), (0, 0));
            let padded = format!("{}core{}", " ".repeat(50), "\t".repeat(50));
            assert_eq!(trim(padded.as_bytes(), level), (50, 54), "level {level}");
        }
    }
}
