//! Pixel formats understood on both sides of the context boundary.

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

/// Memory layout of a single pixel.
///
/// The numeric tag (`repr(u32)`) is what travels with a bitmap when it
/// crosses an FFI or serialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum PixelFormat {
    B8G8R8A8 = 0,
    B8G8R8X8 = 1,
    R8G8B8A8 = 2,
    R8G8B8X8 = 3,
    B8G8R8 = 4,
    R8G8B8 = 5,
    /// 8-bit intensity (greyscale).
    I8 = 6,
    /// 8-bit alpha only.
    A8 = 7,
    R32G32B32A32F = 8,
    /// 32-bit float intensity.
    I32F = 9,
}

impl PixelFormat {
    /// Resolve a numeric format tag.
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::from_u32(tag)
    }

    /// Numeric tag of this format.
    pub fn tag(self) -> u32 {
        self.to_u32().unwrap_or_default()
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::B8G8R8A8
            | PixelFormat::B8G8R8X8
            | PixelFormat::R8G8B8A8
            | PixelFormat::R8G8B8X8 => 4,
            PixelFormat::B8G8R8 | PixelFormat::R8G8B8 => 3,
            PixelFormat::I8 | PixelFormat::A8 => 1,
            PixelFormat::R32G32B32A32F => 16,
            PixelFormat::I32F => 4,
        }
    }

    /// Whether the format stores a meaningful alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            PixelFormat::B8G8R8A8
                | PixelFormat::R8G8B8A8
                | PixelFormat::A8
                | PixelFormat::R32G32B32A32F
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, PixelFormat::R32G32B32A32F | PixelFormat::I32F)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
