//! Runtime-dispatched byte scans and strided gather kernels.
//!
//! Two hot paths live here: character scans the sidecar parser runs over
//! hundreds of megabytes of text, and the strided column gathers the
//! signal extractor runs over gigabytes of packed rows. Both dispatch once
//! on a [`SimdLevel`] probed at startup and fall back to scalar loops on
//! unsupported hardware, so every entry point is portable and every wide
//! kernel has a byte-identical scalar twin.

mod gather;
mod level;
mod scan;

pub use gather::gather;
pub use level::SimdLevel;
pub use scan::{find_byte, find_separator, skip_leading_ws, trim, Separator};
