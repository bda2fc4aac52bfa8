#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub use stepgraph_test_utils::{builders, fake_clock, init_tracing, with_timeout};

/// Write `contents` to `<dir>/Steps.toml` and return the path.
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("Steps.toml");
    fs::write(&path, contents).unwrap();
    path
}

/// Path of the demo config shipped with the crate.
pub fn demo_config(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}
