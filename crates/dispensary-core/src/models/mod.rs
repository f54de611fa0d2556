//! Domain models for the dispensary system.

mod consultation;
mod medicine;
mod patient;
mod prescription;

pub use consultation::*;
pub use medicine::*;
pub use patient::*;
pub use prescription::*;
