//! Model Context Protocol (MCP) request handling
//!
//! Decodes JSON-RPC messages, negotiates the protocol version and routes MCP
//! methods onto the operation registry.

pub mod rpc;
pub mod server;
