fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/hds.proto");
    println!("cargo:rerun-if-env-changed=HDS_REGENERATE_PROTO");

    // The generated code is checked in under src/generated, so regular builds
    // do not need protoc. Set HDS_REGENERATE_PROTO=1 after editing the proto.
    if std::env::var_os("HDS_REGENERATE_PROTO").is_none() {
        return Ok(());
    }

    tonic_build::configure()
        .out_dir("src/generated")
        .compile_protos(&["proto/hds.proto"], &["proto/"])
        .unwrap_or_else(|e| panic!("protobuf compile error: {}", e));

    Ok(())
}
