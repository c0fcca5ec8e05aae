fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Version and build time for the health endpoint and startup log
    built::write_built_file().expect("Failed to acquire build-time information");
}
