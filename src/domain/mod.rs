// Domain layer - Plain data and value functions
pub mod sample;
pub mod segment;
pub mod signal;
pub mod time_scale;
pub mod units;
pub mod view;
