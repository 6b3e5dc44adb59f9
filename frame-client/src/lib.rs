//! Frame Client - embedded side of the frame bus
//!
//! Sends commands to the host and matches replies to requests by
//! correlation id. Envelopes without an id (host pushes) are delivered to
//! subscribers.
//!
//! ```no_run
//! use frame_client::{FrameClient, FrameClientConfig};
//!
//! # async fn demo() -> frame_client::ClientResult<()> {
//! let client = FrameClient::connect("127.0.0.1:8081", FrameClientConfig::default()).await?;
//! client.ready().await?;
//! let orders = client.fetch_orders().await?;
//! println!("{} orders", orders.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::FrameClient;
pub use config::FrameClientConfig;
pub use error::{ClientError, ClientResult};

// Re-export protocol types
pub use shared::message::{AdminAction, Command, CorrelationId, Envelope, MessageType};
