// Domain layer: request-shaping types and the seams to the remote service.

pub mod model;
pub mod ports;
