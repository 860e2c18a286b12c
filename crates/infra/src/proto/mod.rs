//! Protobuf/gRPC types for the queue service.
//!
//! `lastff.v1.rs` is generated by `tonic-build`; regenerate with
//! `cargo build -p lastff-infra --features gen-proto`.

#[allow(clippy::all, missing_docs)]
pub mod lastff {
    pub mod v1 {
        include!("lastff.v1.rs");
    }
}

pub use lastff::v1::*;
