use bitflags::bitflags;
use enum_repr::EnumRepr;

#[EnumRepr(type = "u32")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[doc = " The ProductFamily enumerator itemizes the platforms a hardware interface can be requested for."]
pub enum ProductFamily {
    #[doc = "< Skylake, Gen9 media."]
    Skylake = 18,
    #[doc = "< Kaby Lake, Gen9.5 media."]
    Kabylake = 19,
    #[doc = "< Ice Lake LP, Gen11 media."]
    IcelakeLp = 30,
    #[doc = "< Tiger Lake LP, Gen12 media."]
    TigerlakeLp = 33,
    #[doc = "< DG1 discrete, Gen12 media."]
    Dg1 = 1210,
    #[doc = "< DG2 discrete, Xe_HPG render with Xe_HPM media."]
    Dg2 = 1270,
    #[doc = "< Alchemist derivatives sharing the DG2 media block."]
    Acm = 1272,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Command layout generation. Interfaces are selected by generation, not by product.
pub enum Generation {
    Gen9,
    Gen12,
    XeHpg,
}

#[EnumRepr(type = "u32")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[doc = " The EngineClass enumerator itemizes the hardware engines a GPU context can target."]
pub enum EngineClass {
    #[doc = "< 3D/media render engine (RCS)."]
    Render = 0,
    #[doc = "< Video decode/encode box (VCS)."]
    Video = 1,
    #[doc = "< Video enhancement box (VECS)."]
    VideoEnhance = 2,
    #[doc = "< Copy engine (BCS)."]
    Blitter = 3,
    #[doc = "< Compute command streamer (CCS)."]
    Compute = 4,
}

#[EnumRepr(type = "u32")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[doc = " The MocsUsage enumerator selects a cache policy for a resource. Each generation maps usages to its own MOCS table index."]
pub enum MocsUsage {
    #[doc = "< Generation default (usually cached in L3 and LLC)."]
    Default = 0,
    #[doc = "< Dynamic, surface and instruction state heaps."]
    StateHeap = 1,
    #[doc = "< Surfaces read by the codec but never written back."]
    CodecInputSurface = 2,
    #[doc = "< Reconstructed / reference pictures."]
    CodecReferenceSurface = 3,
    #[doc = "< Bitstream buffers."]
    Bitstream = 4,
    #[doc = "< Streamout and statistics buffers, bypass LLC."]
    StreamOut = 5,
    #[doc = "< Row store scratch buffers."]
    RowStore = 6,
    #[doc = "< VEBOX/SFC input and output surfaces."]
    VpSurface = 7,
    #[doc = "< HuC firmware data and region buffers."]
    HucData = 8,
    #[doc = "< Uncached; used for status reports the CPU polls."]
    Uncached = 9,
}

#[EnumRepr(type = "u32")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[doc = " The SurfaceFormat enumerator itemizes surface layouts the video engines consume."]
pub enum SurfaceFormat {
    #[doc = "< 8-bit 4:2:0, interleaved UV plane."]
    Nv12 = 0,
    #[doc = "< 10-bit 4:2:0 in 16-bit containers."]
    P010 = 1,
    #[doc = "< 16-bit 4:2:0."]
    P016 = 2,
    #[doc = "< 8-bit packed 4:2:2."]
    Yuy2 = 3,
    #[doc = "< 10-bit packed 4:2:2."]
    Y210 = 4,
    #[doc = "< 8-bit packed 4:4:4 with alpha."]
    Ayuv = 5,
    #[doc = "< 10-bit packed 4:4:4."]
    Y410 = 6,
    #[doc = "< 8-bit luma only."]
    Y8 = 7,
    #[doc = "< 8-bit BGRA."]
    Argb = 8,
    #[doc = "< 8-bit RGBA."]
    Abgr = 9,
}

#[EnumRepr(type = "u32")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileType {
    Linear = 0,
    TileX = 1,
    TileY = 2,
    #[doc = "< 4 (Tile4 / TileF) layout used by Xe_HPG."]
    Tile4 = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How a PIPE_CONTROL treats the render caches.
pub enum FlushMode {
    /// Flush every write cache.
    WriteCache,
    /// Invalidate every read-only cache.
    ReadCache,
    /// Use the caller's [`PipeControlFlags`] verbatim.
    Custom,
}

bitflags! {
    #[doc = " Access intent for a resource referenced by a command."]
    #[derive(Default)]
    pub struct ResourceAccess: u32 {
        #[doc = "< The engine reads the resource."]
        const READ = 1;
        #[doc = "< The engine writes the resource."]
        const WRITE = 2;
        const READ_WRITE = Self::READ.bits | Self::WRITE.bits;
    }
}

bitflags! {
    #[doc = " Cache control used by PIPE_CONTROL in custom flush mode."]
    #[derive(Default)]
    pub struct PipeControlFlags: u32 {
        const RENDER_TARGET_CACHE_FLUSH = 1 << 0;
        const DC_FLUSH = 1 << 1;
        const CONSTANT_CACHE_INVALIDATE = 1 << 2;
        const STATE_CACHE_INVALIDATE = 1 << 3;
        const VF_CACHE_INVALIDATE = 1 << 4;
        const INSTRUCTION_CACHE_INVALIDATE = 1 << 5;
        const TEXTURE_CACHE_INVALIDATE = 1 << 6;
        const TLB_INVALIDATE = 1 << 7;
        const CS_STALL = 1 << 8;
        const GENERIC_MEDIA_STATE_CLEAR = 1 << 9;
        const HDC_PIPELINE_FLUSH = 1 << 10;
    }
}

bitflags! {
    #[doc = " VEBOX stages enabled for one VEBOX_STATE."]
    #[derive(Default)]
    pub struct VeboxFeatures: u32 {
        #[doc = "< Denoise."]
        const DN = 1 << 0;
        #[doc = "< Deinterlace."]
        const DI = 1 << 1;
        #[doc = "< Image enhancement and color processing."]
        const IECP = 1 << 2;
        #[doc = "< Local adaptive contrast enhancement."]
        const LACE = 1 << 3;
        const GAMUT_EXPANSION = 1 << 4;
        const GAMUT_COMPRESSION = 1 << 5;
        const FORWARD_GAMMA = 1 << 6;
        #[doc = "< Output alpha plane."]
        const ALPHA_PLANE = 1 << 7;
    }
}

bitflags! {
    #[doc = " Platform feature bits reported by the OS layer."]
    #[derive(Default)]
    pub struct SkuFlags: u32 {
        #[doc = "< Per-engine virtual engine scheduling is available."]
        const VIRTUAL_ENGINE = 1 << 0;
        #[doc = "< The platform has more than one VDBOX."]
        const VDBOX2 = 1 << 1;
        #[doc = "< The render engine is fronted by a compute command streamer."]
        const CCS_NODE = 1 << 2;
        #[doc = "< Lossless render/media compression."]
        const E2E_COMPRESSION = 1 << 3;
        #[doc = "< Flat CCS compression, no aux table."]
        const FLAT_PHYS_CCS = 1 << 4;
        #[doc = "< The scaler/format converter follows the VEBOX."]
        const SFC = 1 << 5;
        #[doc = "< Local device memory, discrete GPU."]
        const LOCAL_MEMORY = 1 << 6;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_family_repr() {
        assert_eq!(ProductFamily::TigerlakeLp.repr(), 33);
        assert_eq!(ProductFamily::from_repr(1270), Some(ProductFamily::Dg2));
        assert_eq!(ProductFamily::from_repr(7), None);
    }

    #[test]
    fn flag_sets_default_to_empty() {
        assert!(ResourceAccess::default().is_empty());
        assert!(PipeControlFlags::default().is_empty());
        assert!(VeboxFeatures::default().is_empty());
        assert!(SkuFlags::default().is_empty());
    }

    #[test]
    fn access_flags_combine() {
        assert_eq!(ResourceAccess::READ | ResourceAccess::WRITE, ResourceAccess::READ_WRITE);
        assert!(!ResourceAccess::READ.contains(ResourceAccess::WRITE));
    }
}
