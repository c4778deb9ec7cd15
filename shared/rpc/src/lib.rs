//! Binary RPC transport shared by the gateway and the domain backends.
//!
//! Each call is one TCP connection exchange: the client writes a request
//! frame carrying a protobuf envelope (method name, metadata pairs, payload)
//! and reads back either a response frame with the encoded response message
//! or an error frame with an encoded [`Status`].

pub mod client;
pub mod frame;
pub mod metadata;
pub mod server;
pub mod status;

pub use client::Channel;
pub use metadata::Metadata;
pub use server::RpcServer;
pub use status::{Code, Status};
