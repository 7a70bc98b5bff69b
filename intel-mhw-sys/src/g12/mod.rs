//! Gen12 (Tiger Lake family) command layouts.

pub mod avp;
pub mod hcp;
pub mod mfx;
pub mod mi;
pub mod render;
pub mod vdenc;
