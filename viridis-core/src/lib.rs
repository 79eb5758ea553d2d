// Shared palette, geo and aggregation logic for the Viridis color service.

pub mod average;
pub mod color;
pub mod geo;
pub mod idle;
pub mod model;
pub mod palette;
pub mod throttle;
pub mod validate;
