// Domain layer: reading models and the ports the service talks through.

pub mod model;
pub mod ports;
