//! Plain data shared by every glmux layer.
//!
//! Nothing in this crate talks to a GPU. It holds the types that cross the
//! context boundary (pixel formats, geometry, CPU bitmaps), the error
//! taxonomy, logging setup and the convolution kernel math used by the blur
//! filters.

pub mod bitmap;
pub mod error;
pub mod geom;
pub mod glsl;
pub mod kernel;
pub mod log;
pub mod pixel_format;

pub use bitmap::Bitmap;
pub use error::{GlError, GlResult};
pub use geom::{next_power_of_two, DPoint, DRect, IntPoint, IntRect};
pub use glsl::GlslVersion;
pub use kernel::{blur_kernel_radius, compute_kernel, compute_kernel_with, KernelParams};
pub use pixel_format::PixelFormat;
