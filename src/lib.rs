//! CollageFE — drag ingredient images onto a base surface, then move, scale
//! and rotate each placed sticker with the mouse, two-finger gestures, or
//! the button strip. Near-white ingredient backgrounds are keyed out with a
//! feathered chroma-key filter.

#[macro_use]
pub mod logger;

pub mod app;
pub mod cli;
pub mod components;
pub mod config;
pub mod controller;
pub mod ops;
pub mod scene;
