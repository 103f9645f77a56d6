pub mod config;
pub mod easing;
pub mod simulate;
