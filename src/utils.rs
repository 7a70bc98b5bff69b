use crate::constants::SurfaceFormat;

pub const PAGE_SIZE: u32 = 4096;

/// Rounds `value` up to a multiple of `alignment`. An alignment of zero returns `value`.
pub fn align_up(value: u32, alignment: u32) -> u32 {
    if alignment == 0 {
        return value;
    }
    let rem = value % alignment;
    if rem == 0 {
        value
    } else {
        value + (alignment - rem)
    }
}

pub fn align_down(value: u32, alignment: u32) -> u32 {
    if alignment == 0 {
        return value;
    }
    value - value % alignment
}

/// Number of 4KB pages needed to hold `size` bytes.
pub fn page_count(size: u32) -> u32 {
    ((size as u64 + PAGE_SIZE as u64 - 1) / PAGE_SIZE as u64) as u32
}

/// Mask keeping every bit at or above `lsb`.
pub fn mask_bits(lsb: u32) -> u32 {
    if lsb >= 32 {
        0
    } else {
        u32::MAX << lsb
    }
}

/// Bits of precision per sample of each plane.
pub fn surface_format_to_plane_bits(format: SurfaceFormat) -> u32 {
    match format {
        SurfaceFormat::Nv12
        | SurfaceFormat::Yuy2
        | SurfaceFormat::Ayuv
        | SurfaceFormat::Y8
        | SurfaceFormat::Argb
        | SurfaceFormat::Abgr => 8,
        SurfaceFormat::P010 | SurfaceFormat::Y210 | SurfaceFormat::Y410 => 10,
        SurfaceFormat::P016 => 16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_ceil() {
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(4096), 1);
        assert_eq!(page_count(4097), 2);
        assert_eq!(page_count(u32::MAX), 0x10_0000);
    }

    #[test]
    fn alignment() {
        assert_eq!(align_up(1, 64), 64);
        assert_eq!(align_up(128, 64), 128);
        assert_eq!(align_up(7, 0), 7);
        assert_eq!(align_down(127, 64), 64);
        assert_eq!(mask_bits(12), 0xFFFF_F000);
        assert_eq!(mask_bits(0), u32::MAX);
        assert_eq!(mask_bits(32), 0);
    }

    #[test]
    fn plane_bits() {
        assert_eq!(surface_format_to_plane_bits(SurfaceFormat::Nv12), 8);
        assert_eq!(surface_format_to_plane_bits(SurfaceFormat::P010), 10);
    }
}
