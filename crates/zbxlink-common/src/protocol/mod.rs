pub mod error;
pub mod jsonrpc;
pub mod trapper;


pub use error::{Result, ZbxError};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use trapper::{ItemValue, SenderRequest, SENDER_DATA_REQUEST};
