//! Domain layer: value objects, delivery policy and the registry contract.
//!
//! Nothing here touches sockets; the transport hands the domain a
//! [`Connection`] wrapping an outbound channel.

pub mod entity;
pub mod error;
pub mod registry;
pub mod value_object;

pub use entity::{Connection, MessageQueue, PusherChannel, QueuedMessage};
pub use error::{ClientIdError, RegistryError};
pub use registry::{
    BroadcastReport, ConnectOutcome, ConnectionRegistry, Delivery, FileDelivery, RegistryConfig,
    RegistrySnapshot,
};
pub use value_object::{ClientId, ConnectionId, Timestamp};

#[cfg(test)]
pub use registry::MockConnectionRegistry;
