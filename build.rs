/// Points the linker at the native `typst_ffi` library when the `native`
/// feature is enabled. The `#[link]` attribute in `src/ffi.rs` names the
/// library itself; this only supplies the search directory.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=TYPST_FFI_LIB_DIR");

    if std::env::var_os("CARGO_FEATURE_NATIVE").is_none() {
        return;
    }

    match std::env::var_os("TYPST_FFI_LIB_DIR") {
        Some(dir) => {
            let dir = std::path::PathBuf::from(dir);
            println!("cargo:rustc-link-search=native={}", dir.display());
        }
        None => {
            println!(
                "cargo:warning=TYPST_FFI_LIB_DIR is not set; relying on the default linker search path for typst_ffi"
            );
        }
    }
}
