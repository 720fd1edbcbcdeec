//! # Weather Modules
//!
//! Frame-driven environment simulation for regions:
//!
//! - [`CloudModule`] - cloud cover diffusion over a 16×16 grid
//! - [`WindModule`] - wind vectors from a pluggable [`WindModel`]
//!
//! Both subscribe to the scene's `core:frame` event and do their work every
//! N frames on a separate task, then publish a module event with a summary of
//! the new grid.
//!
//! ## Module Organization
//!
//! - [`grid`] - grid geometry and sampling shared by both modules
//! - [`cloud`] - cloud cover
//! - [`wind`] - wind models and the wind module
//! - [`events`] - module events published after each update

pub mod cloud;
pub mod events;
pub mod grid;
pub mod wind;

#[cfg(test)]
mod test_support;

pub use cloud::{CloudCover, CloudModule, CloudSettings};
pub use events::{CloudCoverUpdatedEvent, WindUpdatedEvent};
pub use grid::Vec2;
pub use wind::{
    create_wind_model, wind_models, ConfigurableWind, SimpleRandomWind, WindError, WindModel,
    WindModule, WindSettings,
};
