// The capture logic is shared with `provenance::build`, which consumer
// build scripts call; here it records this package's own build.
#[allow(dead_code)]
#[path = "src/build/capture.rs"]
mod capture;

use std::env;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR")?;
    let capture = capture::capture(Path::new(&manifest_dir), &|var| env::var(var).ok());

    for line in capture.instructions() {
        println!("{line}");
    }
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/build/capture.rs");

    Ok(())
}
