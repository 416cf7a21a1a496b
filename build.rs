//! Build script for proto compilation.
//!
//! Compiles `proto/provider.proto` into `OUT_DIR`; the generated types are
//! pulled in by `src/generated.rs`. Only the server side is generated, the
//! plugin never dials the host.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_prost_build::configure()
        .build_client(false)
        .compile_protos(&["proto/provider.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/provider.proto");

    Ok(())
}
