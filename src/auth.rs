//! Identity-domain identifiers, ordered scope lists, and redacted secrets.

pub mod id;
pub mod scope;
pub mod secret;

pub use id::*;
pub use scope::*;
pub use secret::*;
