//! Shared helpers used by the compiler and the dev server.

pub mod hash;
pub mod mime;
pub mod path;
