//! Common utils.

pub mod closable;

pub use closable::{Closable, Closer};
