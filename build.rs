use std::env;

fn main() {
    let mut build = cc::Build::new();

    build
        .include("native")
        .file("native/numeric.c")
        .flag_if_supported("-std=c99")
        .flag_if_supported("-O2")
        .warnings(true);

    build.compile("numbridge_numeric");

    // cbrt lives in libm outside of macOS
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_family = env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();
    if target_family == "unix" && target_os != "macos" {
        println!("cargo:rustc-link-lib=m");
    }

    println!("cargo:rerun-if-changed=native/numeric.h");
    println!("cargo:rerun-if-changed=native/numeric.c");
}
