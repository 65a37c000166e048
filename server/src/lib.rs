//! ragctx front end
//!
//! Loads the retrieval core once and exposes it three ways:
//! - `ask`: answer one question from the command line
//! - `serve`: line-delimited JSON over stdio, the `/ask` contract per line
//! - `inspect`: preflight the index against the encoder and print statistics

pub mod cli;
pub mod commands;
pub mod error;
pub mod protocol;
pub mod transport;

pub use error::{ServerError, ServerResult};
pub use protocol::{handle_line, WireBody, WireResponse};
pub use transport::StdioServer;
