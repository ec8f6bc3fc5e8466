//! UseCase layer: one struct per transport event.

mod connect_client;
mod disconnect_client;
mod error;
mod relay_frame;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{ConnectError, RelayError};
pub use relay_frame::{RelayFrameUseCase, RelayOutcome};
