//! Core utilities shared by every layer (must be declared first in lib.rs so
//! the exported macros are visible everywhere).

#[macro_use]
pub mod utils;
