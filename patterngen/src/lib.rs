pub mod types;
pub mod error;
pub mod layout;
pub mod render;
pub mod bitmap;
pub mod synth;
pub mod family;
pub mod dictionary;
pub mod marker;
pub mod source;
pub mod geometry;
pub mod traversal;
pub mod canvas;
pub mod pattern;
pub mod config;
