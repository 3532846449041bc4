//! Generate `include/restclient.h` from the `extern "C"` surface.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()));
    let config = cbindgen::Config {
        language: cbindgen::Language::C,
        include_guard: Some("RESTCLIENT_H".to_string()),
        cpp_compat: true,
        ..cbindgen::Config::default()
    };

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            let include = crate_dir.join("include");
            if let Err(err) = std::fs::create_dir_all(&include) {
                println!("cargo:warning=cannot create {}: {err}", include.display());
                return;
            }
            bindings.write_to_file(include.join("restclient.h"));
        }
        Err(err) => println!("cargo:warning=cbindgen failed: {err}"),
    }
}
