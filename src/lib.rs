//! Terminal flight-destination map: fetches prices for the visible area,
//! clusters nearby destinations by zoom and labels the most relevant ones.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod departure;
pub mod destinations;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod logging;
pub mod map;
pub mod ui;
