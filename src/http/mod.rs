//! HTTP transport for the Model Context Protocol
//!
//! Serves the `/mcp` JSON-RPC endpoint next to health and discovery routes.

pub mod handlers;
