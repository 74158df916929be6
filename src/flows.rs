//! Session flows: PKCE handshake generation, callback parsing, the self-rescheduling refresh
//! timer, and the [`AuthSession`] state machine tying them together.

pub mod callback;
pub mod pkce;
pub mod refresh;
pub mod session;

pub use callback::*;
pub use pkce::*;
pub use refresh::*;
pub use session::*;
