//! Byte views over plain GPU-bound data.

/// View a `#[repr(C)]` value as raw bytes for buffer uploads.
///
/// # Safety
///
/// Only implement on `#[repr(C)]` types made of plain numeric fields with no
/// padding, pointers or references.
pub unsafe trait AsBytes: Sized {
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: guaranteed by the implementor contract above.
        unsafe {
            std::slice::from_raw_parts(self as *const Self as *const u8, std::mem::size_of::<Self>())
        }
    }
}

/// Byte view over a slice of plain values.
pub fn slice_as_bytes<T: AsBytes>(items: &[T]) -> &[u8] {
    // SAFETY: `T: AsBytes` has no padding, so the slice is densely packed.
    unsafe { std::slice::from_raw_parts(items.as_ptr() as *const u8, std::mem::size_of_val(items)) }
}

unsafe impl AsBytes for f32 {}
unsafe impl AsBytes for u32 {}
unsafe impl AsBytes for [f32; 4] {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_are_densely_packed() {
        let texels = [[1.0f32, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]];
        let bytes = slice_as_bytes(&texels);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[16..20], &5.0f32.to_ne_bytes());
        assert_eq!(7u32.as_bytes(), &7u32.to_ne_bytes());
    }
}
