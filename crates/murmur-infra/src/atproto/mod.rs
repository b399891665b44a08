//! AT Protocol XRPC adapter: session credentials and the social client.

pub mod session;
pub mod xrpc;

pub use session::{AuthSession, LoginCredentials};
pub use xrpc::XrpcClient;
