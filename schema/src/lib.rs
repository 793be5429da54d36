// Battle Engine Schema - Shared type definitions
// This crate contains the core enums and data structs shared between the
// battle engine and anything that feeds it data (rosters, move tables,
// trainer profiles). It deliberately depends on nothing but serde.

pub use battle_data::*;
pub use move_data::*;
pub use pokemon_types::*;
pub use species_data::*;

pub mod battle_data;
pub mod move_data;
pub mod pokemon_types;
pub mod species_data;
