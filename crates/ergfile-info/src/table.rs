//! The ordered key/value table backing a parsed sidecar.

use std::fs;
use std::path::Path;

use ergfile_arena::{ArenaRef, DualArena};
use ergfile_error::{ErgError, Result};
use ergfile_simd::SimdLevel;

/// Starting chunk size for each arena before any pre-sizing.
const INITIAL_ARENA_BYTES: usize = 256 * 1024;

/// Starting entry capacity.
const INITIAL_ENTRIES: usize = 64;

/// Average bytes of sidecar text per entry, used to pre-size the table.
const BYTES_PER_ENTRY_ESTIMATE: usize = 150;

/// One committed key/value pair.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Entry {
    pub(crate) key: ArenaRef,
    pub(crate) value: ArenaRef,
}

/// A parsed sidecar: ordered entries over a dual arena.
#[derive(Debug)]
pub struct InfoFile {
    pub(crate) entries: Vec<Entry>,
    pub(crate) arena: DualArena,
    pub(crate) simd: SimdLevel,
}

impl InfoFile {
    /// Empty table using the host's detected SIMD level.
    #[must_use]
    pub fn new() -> Self {
        Self::with_level(SimdLevel::detect())
    }

    /// Empty table pinned to a specific scan tier (tests drive all tiers
    /// through this).
    #[must_use]
    pub fn with_level(level: SimdLevel) -> Self {
        InfoFile {
            entries: Vec::with_capacity(INITIAL_ENTRIES),
            arena: DualArena::with_capacity(INITIAL_ARENA_BYTES),
            simd: level,
        }
    }

    /// Parse a sidecar file into a fresh table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut info = InfoFile::new();
        info.parse_file(path)?;
        Ok(info)
    }

    /// Read `path` whole and append its entries to this table.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| ErgError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.reserve_for(data.len());
        self.parse_bytes(&data);
        Ok(())
    }

    /// Pre-size the table for `input_len` bytes of sidecar text so the
    /// common parse is allocation-free: one entry per ~150 bytes, a third
    /// of the input as key bytes, five thirds as value bytes.
    pub fn reserve_for(&mut self, input_len: usize) {
        self.entries
            .reserve(input_len.div_ceil(BYTES_PER_ENTRY_ESTIMATE));
        self.arena.keys.reserve(input_len / 3);
        self.arena.values.reserve(input_len * 5 / 3);
    }

    /// Number of committed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the first entry whose key equals `key`, UTF-8 checked on
    /// the hit.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_bytes(key.as_bytes())
            .and_then(|value| std::str::from_utf8(value).ok())
    }

    /// Verbatim value bytes of the first entry whose key equals `key`.
    #[must_use]
    pub fn get_bytes(&self, key: &[u8]) -> Option<&[u8]> {
        self.position_of(key)
            .map(|index| self.arena.values.get(self.entries[index].value))
    }

    /// Update the first entry for `key` in place, or append a new one.
    pub fn set(&mut self, key: &str, value: &str) {
        let position = self.position_of(key.as_bytes());
        let value_ref = self.arena.values.push_bytes(value.as_bytes());
        match position {
            Some(index) => self.entries[index].value = value_ref,
            None => {
                let key_ref = self.arena.keys.push_bytes(key.as_bytes());
                self.entries.push(Entry {
                    key: key_ref,
                    value: value_ref,
                });
            }
        }
    }

    /// Entries in insertion order as `(key, value)` byte slices.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries.iter().map(|entry| {
            (
                self.arena.keys.get(entry.key),
                self.arena.values.get(entry.value),
            )
        })
    }

    pub(crate) fn push_entry(&mut self, key: ArenaRef, value: ArenaRef) {
        self.entries.push(Entry { key, value });
    }

    /// Linear scan with an early length check; keys live in their own
    /// arena precisely because this walk is the lookup cost.
    fn position_of(&self, key: &[u8]) -> Option<usize> {
        self.entries.iter().position(|entry| {
            entry.key.len() == key.len() && self.arena.keys.get(entry.key) == key
        })
    }
}

impl Default for InfoFile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table() {
        let info = InfoFile::new();
        assert!(info.is_empty());
        assert_eq!(info.get("anything"), None);
    }

    #[test]
    fn test_set_appends_and_updates() {
        let mut info = InfoFile::new();
        info.set("A", "1");
        info.set("B", "2");
        assert_eq!(info.get("A"), Some("1"));
        assert_eq!(info.get("B"), Some("2"));

        info.set("A", "updated");
        assert_eq!(info.get("A"), Some("updated"));
        assert_eq!(info.len(), 2, "update must not append");

        let keys: Vec<_> = info.iter().map(|(k, _)| k.to_vec()).collect();
        assert_eq!(keys, vec![b"A".to_vec(), b"B".to_vec()]);
    }

    #[test]
    fn test_lookup_returns_first_duplicate() {
        let mut info = InfoFile::new();
        let k1 = info.arena.keys.push_bytes(b"dup");
        let v1 = info.arena.values.push_bytes(b"first");
        info.push_entry(k1, v1);
        let k2 = info.arena.keys.push_bytes(b"dup");
        let v2 = info.arena.values.push_bytes(b"second");
        info.push_entry(k2, v2);

        assert_eq!(info.get("dup"), Some("first"));
    }

    #[test]
    fn test_open_missing_file_is_fatal() {
        let err = InfoFile::open("/nonexistent/sidecar.info").unwrap_err();
        assert!(matches!(err, ErgError::Open { .. }));
    }

    #[test]
    fn test_reserve_for_makes_room() {
        let mut info = InfoFile::new();
        info.reserve_for(3_000_000);
        assert!(info.entries.capacity() >= 20_000);
        assert!(info.arena.keys.capacity() >= 1_000_000);
        assert!(info.arena.values.capacity() >= 5_000_000);
    }
}
