//! Generated gRPC bindings for the Activation Scheduler's wire contract
//! (`function.proto`). The `tonic_build` invocation in `build.rs` compiles
//! the IDL at build time, mirroring the original `common/proto` /
//! `google.golang.org/grpc` pairing.

tonic::include_proto!("litefunctions.scheduler.v1");
