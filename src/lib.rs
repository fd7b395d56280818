//! Syndication feed normalizer.
//!
//! Every supported format is validated structurally and converted into a
//! JSON Feed 1.1 model; see [`feed`] for the pipeline, [`render`] for the
//! HTML listing and [`config`] for the TOML configuration.

pub mod config;
pub mod feed;
pub mod render;
