#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::new_without_default)]

//! Bit-exact hardware command layouts for Intel media engines, grouped by the
//! generation that introduced each layout.

use std::fmt;

#[macro_use]
mod macros;

pub mod bits;
pub mod g12;
pub mod g9;
pub mod xe_hpg;

/// Hardware command type (bits 29..=31 of DWord 0).
pub const COMMAND_TYPE_MI: u32 = 0;
pub const COMMAND_TYPE_GFXPIPE: u32 = 3;
pub const COMMAND_TYPE_PARALLEL_VIDEO_PIPE: u32 = 3;

/// A fixed size command whose in-memory layout is the wire format read by the
/// command streamer.
pub trait HwCommand: Copy + Default {
    const BYTE_SIZE: usize;
    const NAME: &'static str;

    fn as_dwords(&self) -> &[u32];
    fn as_dwords_mut(&mut self) -> &mut [u32];

    fn as_bytes(&self) -> Vec<u8> {
        self.as_dwords()
            .iter()
            .flat_map(|dw| dw.to_le_bytes())
            .collect()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Copy)]
#[repr(i32)]
pub enum MhwStatus {
    #[doc = "< Operation completed."]
    Success = 0,
    #[doc = "< Destination buffer or table would overflow."]
    NoSpace = 1,
    #[doc = "< A parameter is outside the documented domain, or the wrong generation variant was supplied."]
    InvalidParameter = 2,
    #[doc = "< A resource or context handle is not known to the OS layer."]
    InvalidHandle = 3,
    #[doc = "< A required reference was absent."]
    NullPointer = 5,
    #[doc = "< The requested command or feature has no implementation for this generation."]
    Unimplemented = 17,
    #[doc = "< The product family is not registered."]
    PlatformNotSupported = 29,
    #[doc = "< Unknown error."]
    Unknown = -1,
}

impl MhwStatus {
    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }
}

impl From<i32> for MhwStatus {
    fn from(v: i32) -> Self {
        match v {
            0 => Self::Success,
            1 => Self::NoSpace,
            2 => Self::InvalidParameter,
            3 => Self::InvalidHandle,
            5 => Self::NullPointer,
            17 => Self::Unimplemented,
            29 => Self::PlatformNotSupported,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for MhwStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Success => "success",
            Self::NoSpace => "no space left in destination",
            Self::InvalidParameter => "invalid parameter",
            Self::InvalidHandle => "invalid handle",
            Self::NullPointer => "required reference is null",
            Self::Unimplemented => "not implemented",
            Self::PlatformNotSupported => "platform not supported",
            Self::Unknown => "unknown error",
        };
        write!(f, "{} ({})", text, *self as i32)
    }
}

impl std::error::Error for MhwStatus {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mhw_status() {
        assert_eq!(MhwStatus::from(2), MhwStatus::InvalidParameter);
        assert_eq!(MhwStatus::from(-77), MhwStatus::Unknown);
        assert_eq!(MhwStatus::from(MhwStatus::NoSpace as i32), MhwStatus::NoSpace);
        assert!(MhwStatus::Success.is_success());
    }

    #[test]
    fn display_carries_code() {
        assert_eq!(MhwStatus::NullPointer.to_string(), "required reference is null (5)");
    }
}
