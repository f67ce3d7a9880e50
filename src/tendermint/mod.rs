//! Tendermint RPC stream client and wire protocol

pub mod messages;
pub mod reserves;
pub mod websocket;

pub use websocket::TendermintWsClient;
