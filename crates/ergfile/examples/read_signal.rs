//! Print one signal from an archive.
//!
//! ```text
//! read_signal <archive> <signal>
//! ```
//!
//! Exits 0 on success, 1 on any fatal error or when the signal does not
//! exist.

use std::process::ExitCode;

use ergfile::ErgFile;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let (Some(path), Some(name)) = (args.next(), args.next()) else {
        eprintln!("usage: read_signal <archive> <signal>");
        return ExitCode::FAILURE;
    };

    let archive = match ErgFile::open(&path) {
        Ok(archive) => archive,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let Some(info) = archive.signal_info(&name) else {
        eprintln!("error: signal `{name}` not found in {path}");
        return ExitCode::FAILURE;
    };
    let unit = if info.unit.is_empty() {
        String::new()
    } else {
        format!(" [{}]", info.unit)
    };

    let Some(values) = archive.signal_as_f64(&name) else {
        eprintln!("error: archive {path} holds no samples");
        return ExitCode::FAILURE;
    };

    println!("{name}{unit}: {} samples", values.len());
    for value in &values {
        println!("{value}");
    }
    ExitCode::SUCCESS
}
