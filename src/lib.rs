//! Command construction for Intel media engines.
//!
//! The interface objects in this crate turn high level requests ("flush the render
//! caches", "program CFE_STATE", "bind a VDENC source surface") into the bit-exact
//! command DWords defined in [`sys`], appending them to a [`cmdbuffer::CommandBuffer`]
//! together with the relocations the submission path needs to patch GPU addresses.
//!
//! Start with [`factory::create_hal_for_generation`], which bundles every interface for a
//! product family on top of an [`os::OsInterface`].

pub use intel_mhw_sys as sys;
pub use intel_mhw_sys::MhwStatus;

pub mod caps;
pub mod cmdbuffer;
pub mod constants;
pub mod factory;
pub mod mi;
pub mod os;
pub mod render;
pub mod resource;
pub mod settings;
pub mod utils;
pub mod vdbox;
pub mod ve;
pub mod vebox;
pub mod vp9;

pub use factory::{create_hal_for_generation, HwInterface};

#[cfg(test)]
mod tests;
