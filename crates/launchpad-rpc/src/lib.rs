// crates/launchpad-rpc/src/lib.rs
//
// launchpad-rpc: JSON-RPC and artifact transfer server for Launchpad.
//
// Hosts a tonic service that carries a JSON-RPC envelope for catalog reads
// and admin calls, plus streaming HTTP routes for artifact upload and
// download. Mutations are gated by an injected `Authorizer`.

pub mod body;
pub mod handlers;
pub mod middleware;
pub mod server;

// Re-export the main server types for ergonomic access.
pub use middleware::{Authorizer, TokenAuthorizer};
pub use server::{JsonRpcRequest, JsonRpcResponse, LaunchpadRpcServer, RpcConfig};
