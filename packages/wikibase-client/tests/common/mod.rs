// Common test utilities

pub mod stub_server;

pub use stub_server::*;
