fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "gen-proto")]
    {
        println!("cargo:warning=Feature 'gen-proto' enabled: Running protobuf codegen");

        tonic_build::configure()
            .build_server(false)
            .out_dir("src/proto")
            .emit_rerun_if_changed(false)
            .compile_protos(&["proto/lastff.proto"], &["proto"])?;

        println!("cargo:rerun-if-changed=proto");
    }
    Ok(())
}
