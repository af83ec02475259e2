//! Protobuf message types for edatool simulation data.
//!
//! `edatool.sim.v1.rs` is `prost` output for `protos/edatool/sim/v1/sim.proto`,
//! kept in-tree so that building does not require `protoc`.

pub mod edatool {
    pub mod sim {
        pub mod v1 {
            include!("edatool.sim.v1.rs");
        }
    }
}
