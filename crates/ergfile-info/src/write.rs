//! Sidecar serialization.
//!
//! Inverse of the parser for well-formed tables: single-line values render
//! as `Key = value`, values containing newlines render as `Key:` with one
//! tab-indented continuation line per segment.

use std::fs;
use std::path::Path;

use ergfile_error::Result;

use crate::table::InfoFile;

impl InfoFile {
    /// Render the table in sidecar syntax, entries in insertion order.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * 32);
        for (key, value) in self.iter() {
            if value.contains(&b'\n') {
                out.extend_from_slice(key);
                out.extend_from_slice(b":\n");
                for segment in value.split(|&byte| byte == b'\n') {
                    out.push(b'\t');
                    out.extend_from_slice(segment);
                    out.push(b'\n');
                }
            } else {
                out.extend_from_slice(key);
                out.extend_from_slice(b" = ");
                out.extend_from_slice(value);
                out.push(b'\n');
            }
        }
        out
    }

    /// Write the rendered table to `path`.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_bytes())?;
        Ok(())
    }
}
