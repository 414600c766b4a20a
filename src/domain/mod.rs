//! Domain data and policy: tile grids, tunables, capture payloads, colours.

pub mod capture;
pub mod color;
pub mod settings;
pub mod tiles;
