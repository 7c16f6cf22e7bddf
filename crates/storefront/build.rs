//! Fingerprints static assets so they can be served with immutable caching.
//!
//! Each asset is copied to a `derived/` directory next to it with the first
//! eight hex digits of its SHA-256 in the file name, and the digest is
//! exported to the crate as a compile-time environment variable.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// (path under the crate root, env var carrying its hash)
const ASSETS: [(&str, &str); 2] = [
    ("static/css/main.css", "CSS_HASH"),
    ("static/js/checkout.js", "CHECKOUT_JS_HASH"),
];

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    for (asset, var) in ASSETS {
        fingerprint(Path::new(&manifest_dir), asset, var);
    }
}

fn fingerprint(root: &Path, asset: &str, var: &str) {
    let source = root.join(asset);
    println!("cargo:rerun-if-changed={}", source.display());

    let content = match fs::read(&source) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {asset}: {e}");
            println!("cargo:rustc-env={var}=");
            return;
        }
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let short = &digest[..8];
    println!("cargo:rustc-env={var}={short}");

    let (Some(dir), Some(stem), Some(ext)) = (
        source.parent(),
        source.file_stem().and_then(|s| s.to_str()),
        source.extension().and_then(|s| s.to_str()),
    ) else {
        panic!("asset path {asset} has no file name");
    };
    let derived_dir = dir.join("derived");
    fs::create_dir_all(&derived_dir).expect("Failed to create derived asset directory");
    fs::copy(&source, derived_dir.join(format!("{stem}.{short}.{ext}")))
        .expect("Failed to copy asset to derived directory");
}
