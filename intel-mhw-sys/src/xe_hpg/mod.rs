//! Xe_HPG (DG2 / Arc) command layouts.

pub mod render;
