//! Broker execution seam: client trait, wire types, paper implementation.

pub mod client;
pub mod error;
pub mod paper;
pub mod types;

pub use client::BrokerClient;
pub use error::BrokerError;
pub use paper::PaperBroker;
pub use types::{
    BrokerOrder, BrokerOrderStatus, BrokerPosition, OrderKind, OrderRequest, OrderSide,
};
