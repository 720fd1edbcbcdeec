/// Event system module - broken down into manageable components
mod core;
mod emitters;
mod handlers;
mod stats;
mod tests;

pub use core::EventSystem;
pub use stats::EventSystemStats;
