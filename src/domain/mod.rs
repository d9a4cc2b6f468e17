// Domain layer: value types and ports. No dependencies on the form engine.

pub mod model;
pub mod ports;
