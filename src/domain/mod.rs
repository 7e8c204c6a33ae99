// Domain layer: import model and the ports the importer talks through.

pub mod model;
pub mod ports;
