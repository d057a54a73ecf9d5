// Domain layer: core models, the output schema and ports (interfaces).

pub mod model;
pub mod ports;
pub mod schema;
