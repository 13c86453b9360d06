//! Session domain module.
//!
//! Sessions hold the ordered turn history that later generation calls
//! build on. Created on first message, appended to by every call.

mod aggregate;
mod errors;

pub use aggregate::{Session, Turn};
pub use errors::SessionError;
