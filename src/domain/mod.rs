// Domain layer: session models and ports. No I/O here; adapters implement the ports.

pub mod model;
pub mod ports;
