//! Auth-domain data: scopes, the persisted credential, and the PKCE handshake.

pub mod credential;
pub mod handshake;
pub mod scope;

pub use credential::*;
pub use handshake::*;
pub use scope::*;
