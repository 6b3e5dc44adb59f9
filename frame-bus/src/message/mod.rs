//! Host-side message bus
//!
//! ```text
//!  frame ──► Transport ──► FrameBus loop ──► DispatchRouter ──► CommandHandler
//!                              │                   │
//!                     IFRAME_READY opens      Reply / AppError
//!                              ▼                   ▼
//!  frame ◄── Transport ◄── ReadinessGate ◄──── Emitter
//! ```
//!
//! Every request carrying an `id` gets exactly one reply with that `id`:
//! handlers return values and only the router hands them to the emitter.

pub mod bus;
pub mod emitter;
pub mod gate;
pub mod handler;
pub mod router;

pub use bus::FrameBus;
pub use emitter::Emitter;
pub use gate::ReadinessGate;
pub use handler::{CommandHandler, Reply, RequestContext};
pub use router::DispatchRouter;

pub use shared::message::{CorrelationId, Envelope, MessageType};
pub use shared::transport;
pub use shared::transport::{MemoryTransport, TcpTransport, Transport};
