// Domain layer: core models and ports (interfaces). Geometry types come from
// geo-types; everything else is plain data.

pub mod model;
pub mod ports;
