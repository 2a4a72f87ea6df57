//! Opens a persisted language data bundle and prints its entry table.
//!
//! Mirrors `inspect_redb`'s "open the thing, print what's in it" shape,
//! ported from redb tables to `LanguageDataBundle`'s entry table.

use anyhow::{Context, Result};
use ocr_recognition_controller::LanguageDataBundle;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: inspect_bundle <bundle-path> [--zip]");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    let as_zip = args.get(2).map(|s| s.as_str()) == Some("--zip")
        || path.extension().and_then(|e| e.to_str()) == Some("zip");

    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    println!("Opened bundle: {}", path.display());

    let bundle = if as_zip {
        LanguageDataBundle::read_zip(file).map_err(|e| anyhow::anyhow!(e.to_string()))?
    } else {
        LanguageDataBundle::read_flat(BufReader::new(file))
            .map_err(|e| anyhow::anyhow!(e.to_string()))?
    };

    println!("{} entries:", bundle.len());
    for entry in bundle.entries() {
        println!(
            "  {:<16} {:>10} bytes",
            entry.kind.file_suffix(),
            entry.bytes.len()
        );
    }

    Ok(())
}
