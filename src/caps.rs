//! Per-platform hardware capabilities.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::constants::{Generation, MocsUsage, ProductFamily};

/// L3 cache control register programmed by [`enable_l3_cache`](crate::render::enable_l3_cache).
pub const L3_CACHE_CNTL_REGISTER: u32 = 0xB134;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwCaps {
    pub family: ProductFamily,
    pub generation: Generation,
    /// Hardware threads the media/compute front end may dispatch.
    pub max_threads: u32,
    pub eu_count: u32,
    pub slice_count: u32,
    pub subslice_count: u32,
    pub max_dual_subslices: u32,
    pub vdbox_count: u32,
    pub page_size: u32,
    /// Command streamer timestamp frequency.
    pub timestamp_frequency_hz: u64,
    /// MOCS table index per [`MocsUsage`].
    pub mocs: [u32; 10],
    pub l3_cache_cntl_value: u32,
}

impl HwCaps {
    pub fn mocs_index(&self, usage: MocsUsage) -> u32 {
        self.mocs[usage.repr() as usize]
    }
}

// Gen12 MOCS: index 2 is LLC/L3 write-back, 3 bypasses LLC, 1 is uncached.
const GEN12_MOCS: [u32; 10] = [2, 2, 2, 2, 3, 3, 2, 2, 2, 1];
// Xe_HPG has no LLC; 1 is L3 write-back and 3 is uncached.
const XE_HPG_MOCS: [u32; 10] = [1, 1, 1, 1, 1, 3, 1, 1, 1, 3];

fn tigerlake() -> HwCaps {
    HwCaps {
        family: ProductFamily::TigerlakeLp,
        generation: Generation::Gen12,
        max_threads: 672,
        eu_count: 96,
        slice_count: 1,
        subslice_count: 6,
        max_dual_subslices: 6,
        vdbox_count: 2,
        page_size: 4096,
        timestamp_frequency_hz: 12_500_000,
        mocs: GEN12_MOCS,
        l3_cache_cntl_value: 0xA000_0420,
    }
}

fn dg1() -> HwCaps {
    HwCaps {
        family: ProductFamily::Dg1,
        vdbox_count: 2,
        ..tigerlake()
    }
}

fn dg2() -> HwCaps {
    HwCaps {
        family: ProductFamily::Dg2,
        generation: Generation::XeHpg,
        max_threads: 4096,
        eu_count: 512,
        slice_count: 8,
        subslice_count: 32,
        max_dual_subslices: 32,
        vdbox_count: 2,
        page_size: 4096,
        timestamp_frequency_hz: 19_200_000,
        mocs: XE_HPG_MOCS,
        l3_cache_cntl_value: 0xD000_0020,
    }
}

fn acm() -> HwCaps {
    HwCaps {
        family: ProductFamily::Acm,
        max_threads: 1024,
        eu_count: 128,
        slice_count: 2,
        subslice_count: 8,
        max_dual_subslices: 8,
        ..dg2()
    }
}

static CAPS: Lazy<HashMap<ProductFamily, HwCaps>> = Lazy::new(|| {
    [tigerlake(), dg1(), dg2(), acm()]
        .into_iter()
        .map(|caps| (caps.family, caps))
        .collect()
});

/// Capabilities of `family`, if the family is supported.
pub fn caps_for(family: ProductFamily) -> Option<&'static HwCaps> {
    CAPS.get(&family)
}
