pub mod auth;

pub use auth::{session_gate, AuthUser};
