//! The sidecar line parser.
//!
//! Works directly on the input buffer: lines are located with SIMD newline
//! scans, classified by their first `#`/`=`/`:` byte, and committed into
//! the arenas without intermediate per-line copies. A multi-line value
//! accumulates in one reusable scratch buffer and is copied into the value
//! arena exactly once, on commit.

use ergfile_arena::ArenaRef;
use ergfile_simd::{find_byte, find_separator, trim, Separator};

use crate::table::InfoFile;

impl InfoFile {
    /// Append every well-formed entry in `data` to the table.
    ///
    /// Malformed lines (no separator before end of line) are skipped
    /// silently; the format is permissive. A multi-line entry still open
    /// at the end of input is committed.
    pub fn parse_bytes(&mut self, data: &[u8]) {
        let level = self.simd;
        let mut pos = 0;
        let mut pending_key: Option<ArenaRef> = None;
        let mut scratch: Vec<u8> = Vec::new();

        while pos < data.len() {
            let rest = &data[pos..];
            let (line_len, advance) = match find_byte(rest, b'\n', level) {
                Some(newline) => (newline, newline + 1),
                None => (rest.len(), rest.len()),
            };
            let mut line = &rest[..line_len];
            pos += advance;

            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            if line.is_empty() {
                continue;
            }

            let (trim_start, trim_end) = trim(line, level);
            if trim_start >= trim_end || line[trim_start] == b'#' {
                // Blank or comment; never closes an open multi-line entry.
                continue;
            }

            let is_continuation =
                line[0] == b'\t' || (line[0] == b' ' && line.len() > 1);
            if is_continuation {
                if pending_key.is_some() {
                    let content = &line[trim_start..trim_end];
                    if !content.is_empty() {
                        if !scratch.is_empty() {
                            scratch.push(b'\n');
                        }
                        scratch.extend_from_slice(content);
                    }
                }
                continue;
            }

            // Any other line ends an open multi-line entry.
            if let Some(key) = pending_key.take() {
                let value = self.arena.values.push_bytes(&scratch);
                self.push_entry(key, value);
                scratch.clear();
            }

            let trimmed = &line[trim_start..trim_end];
            match find_separator(trimmed, level) {
                None | Some((_, Separator::Comment)) => {}
                Some((sep, Separator::Equals)) => {
                    let (ks, ke) = trim(&trimmed[..sep], level);
                    let key = self.arena.keys.push_bytes(&trimmed[ks..ke]);
                    let rhs = &trimmed[sep + 1..];
                    let (vs, ve) = trim(rhs, level);
                    let value = self.arena.values.push_bytes(&rhs[vs..ve]);
                    self.push_entry(key, value);
                }
                Some((sep, Separator::Colon)) => {
                    let (ks, ke) = trim(&trimmed[..sep], level);
                    pending_key = Some(self.arena.keys.push_bytes(&trimmed[ks..ke]));
                    scratch.clear();
                    let tail = &trimmed[sep + 1..];
                    let (ts, te) = trim(tail, level);
                    scratch.extend_from_slice(&tail[ts..te]);
                }
            }
        }

        if let Some(key) = pending_key.take() {
            let value = self.arena.values.push_bytes(&scratch);
            self.push_entry(key, value);
        }
    }
}
