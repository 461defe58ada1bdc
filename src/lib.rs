//! Animated git history graphs for presentation slides.
//!
//! A JSON document describes branches, commits and a step script; the crate
//! resolves it into positioned blocks and replays the steps one at a time
//! through an abstract rendering [`render::Surface`].
//!
//! The binary `gitslides` demonstrates usage: it loads a document, advances
//! steps, and prints the resulting scene as JSON or a static SVG snapshot.

pub mod block;
pub mod branch;
pub mod document;
pub mod geometry;
pub mod graph;
pub mod registry;
pub mod render;
pub mod svg;
pub mod text;
