//! Real-time viewer for procedurally generated meshes.
//!
//! Geometry comes from `meshgen`; this crate uploads it, draws it with a
//! swappable shader program under a perspective camera, and exposes an egui
//! control panel for the generation parameters.

pub mod app;
pub mod camera;
pub mod config;
pub mod geometry;
pub mod renderer;
pub mod shader;
pub mod time;
pub mod ui;
