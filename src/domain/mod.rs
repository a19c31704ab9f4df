// Domain layer: the table model, aggregation results and the ports the pipeline is built on.

pub mod model;
pub mod ports;
pub mod summary;
