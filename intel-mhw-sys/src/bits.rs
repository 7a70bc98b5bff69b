//! Field packing helpers shared by every command layout.

/// Mask covering bits `lo..=hi` of a DWord.
#[inline]
pub const fn mask(lo: u32, hi: u32) -> u32 {
    let width = hi - lo + 1;
    if width >= 32 {
        u32::MAX
    } else {
        ((1u32 << width) - 1) << lo
    }
}

#[inline]
pub const fn get(dw: u32, lo: u32, hi: u32) -> u32 {
    (dw & mask(lo, hi)) >> lo
}

/// Writes `value` into bits `lo..=hi`. Bits above the field width are dropped.
#[inline]
pub fn set(dw: &mut u32, lo: u32, hi: u32, value: u32) {
    let m = mask(lo, hi);
    *dw = (*dw & !m) | ((value << lo) & m);
}

/// Packs a value into a field at construction time, for DWord defaults.
#[inline]
pub const fn field(lo: u32, hi: u32, value: u32) -> u32 {
    (value << lo) & mask(lo, hi)
}
