//! Gen9 layouts still used unchanged by later generations.

pub mod huc;
pub mod vebox;
