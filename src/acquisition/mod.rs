// src/acquisition/mod.rs
//! Sample ingestion: line protocol, shared buffer and reader thread

pub mod ingest;
pub mod protocol;
pub mod sample_buffer;

pub use ingest::*;
pub use protocol::*;
pub use sample_buffer::*;
