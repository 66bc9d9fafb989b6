//! # Chainpay Server
//!
//! Newline-delimited JSON-RPC 2.0 front end for the [`chainpay`] engine.
//!
//! Clients discover operations with `tools/list` and invoke them with
//! `tools/call`; every tool also answers as a direct method. Guidance
//! templates are served through `prompts/list` and `prompts/get`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod prompts;
pub mod protocol;
pub mod server;
pub mod tools;

pub use protocol::{Request, Response};
pub use server::Server;
pub use tools::{Tool, ToolRegistry};
