//! Protocol layer: framing codec, method table, validation, and negotiation.

pub mod codec;
pub mod method;
pub mod negotiation;
pub mod validator;

pub use method::{notifications, Method};
pub use validator::Coercion;
