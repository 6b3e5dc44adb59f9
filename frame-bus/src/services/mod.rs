//! Host-side collaborators the handlers depend on

pub mod mailer;
pub mod session;

pub use mailer::{LogMailer, Mailer, OutgoingEmail};
pub use session::SessionState;
