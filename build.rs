fn main() {
    // Only run gRPC codegen when the "grpc" feature is enabled.
    // Cargo sets CARGO_FEATURE_GRPC when compiling with --features grpc.
    if std::env::var("CARGO_FEATURE_GRPC").is_ok() {
        let service = tonic_build::manual::Service::builder()
            .name("ConfigAdminService")
            .package("netcfg.admin")
            .method(
                tonic_build::manual::Method::builder()
                    .name("rollback_network_change")
                    .route_name("RollbackNetworkChange")
                    .input_type("crate::grpc::RollbackRequest")
                    .output_type("crate::grpc::RollbackResponse")
                    .codec_path("tonic::codec::ProstCodec")
                    .build(),
            )
            .method(
                tonic_build::manual::Method::builder()
                    .name("list_snapshots")
                    .route_name("ListSnapshots")
                    .input_type("crate::grpc::ListSnapshotsRequest")
                    .output_type("crate::grpc::SnapshotMessage")
                    .codec_path("tonic::codec::ProstCodec")
                    .server_streaming()
                    .build(),
            )
            .method(
                tonic_build::manual::Method::builder()
                    .name("compact_changes")
                    .route_name("CompactChanges")
                    .input_type("crate::grpc::CompactChangesRequest")
                    .output_type("crate::grpc::CompactChangesResponse")
                    .codec_path("tonic::codec::ProstCodec")
                    .build(),
            )
            .build();

        tonic_build::manual::Builder::new().compile(&[service]);
    }
}
