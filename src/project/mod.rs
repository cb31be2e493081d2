//! Project module for Mix project root discovery
//!
//! Provides nearest and umbrella root lookup based on the `mix.exs` marker.

pub mod locator;

pub use locator::*;
