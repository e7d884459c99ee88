//! Projection of the generic sidecar table onto the signal schema.

use ergfile_error::{ErgError, Result};
use ergfile_info::InfoFile;
use ergfile_types::{Signal, SignalKind};

/// Derive the ordered signal schema from a parsed sidecar.
///
/// Signals are declared as `File.At.<i>.Name`/`File.At.<i>.Type` with `i`
/// counting from 1; the walk stops at the first absent index. Per-signal
/// unit and scaling come from `Quantity.<name>.*` and default to `""`,
/// `1.0` and `0.0`.
pub(crate) fn bind_signals(info: &InfoFile) -> Result<Vec<Signal>> {
    let byte_order = info.get("File.ByteOrder").ok_or_else(|| ErgError::MissingKey {
        key: "File.ByteOrder".to_string(),
    })?;
    if byte_order != "LittleEndian" {
        return Err(ErgError::UnsupportedByteOrder {
            value: byte_order.to_string(),
        });
    }

    let mut signals = Vec::new();
    for index in 1usize.. {
        let Some(name) = info.get(&format!("File.At.{index}.Name")) else {
            break;
        };
        let type_key = format!("File.At.{index}.Type");
        let token = info
            .get(&type_key)
            .ok_or_else(|| ErgError::MissingKey { key: type_key })?;

        let name = name.to_string();
        let kind = SignalKind::from_type_token(token);
        let unit = info
            .get(&format!("Quantity.{name}.Unit"))
            .unwrap_or_default()
            .to_string();
        let factor = scale_value(info.get(&format!("Quantity.{name}.Factor")), 1.0);
        let offset = scale_value(info.get(&format!("Quantity.{name}.Offset")), 0.0);

        signals.push(Signal {
            name,
            kind,
            unit,
            factor,
            offset,
        });
    }
    Ok(signals)
}

/// Absent keys take the documented default; malformed numbers collapse to
/// 0.0 like the original tooling's `atof`.
fn scale_value(text: Option<&str>, default: f64) -> f64 {
    text.map_or(default, |value| value.trim().parse().unwrap_or(0.0))
}
