fn main() {
    // Stamp the binary so /api/app-info can report when it was built
    let build_timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    println!("cargo:rustc-env=BUILD_TIMESTAMP={build_timestamp}");
    println!("cargo:rerun-if-changed=build.rs");

    // Enables static linking of the vcruntime library on Windows builds
    static_vcruntime::metabuild();
}
