mod error;
mod handlers;
mod response;
mod router;
mod server;

pub use server::{build_runtime, Server, ServerConfig};
