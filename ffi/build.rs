//! Generate `include/countries.h` from the `extern "C"` surface.
//!
//! Header generation is best effort: a cbindgen failure prints a warning and
//! never fails the build.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let Ok(crate_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let header = PathBuf::from(&crate_dir).join("include").join("countries.h");

    let config = cbindgen::Config {
        usize_is_size_t: true,
        ..Default::default()
    };
    let generated = cbindgen::Builder::new()
        .with_config(config)
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("COUNTRIES_H")
        .with_documentation(true)
        .generate();

    match generated {
        Ok(bindings) => {
            bindings.write_to_file(header);
        }
        Err(err) => println!("cargo:warning=cbindgen failed: {err}"),
    }
}
