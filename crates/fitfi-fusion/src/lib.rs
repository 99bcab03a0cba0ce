pub mod archetypes;
pub mod blend;
pub mod scoring;

pub use archetypes::*;
pub use blend::*;
pub use scoring::*;
