//! glium backend over a GL context owned by the host.

use std::cell::Cell;
use std::sync::Once;

static LOAD_GL: Once = Once::new();

/// Resolve GL entry points through `gl_loader`. Runs once per process.
pub fn load_gl() {
    LOAD_GL.call_once(|| {
        gl_loader::init_gl();
        gl::load_with(|s| gl_loader::get_proc_address(s).cast());
        tracing::debug!("GL entry points loaded");
    });
}

/// Backend that never owns the context: buffer swaps and context switches
/// stay with the host, only the framebuffer size is tracked here.
#[derive(Debug)]
pub(crate) struct HostBackend {
    size: Cell<(u32, u32)>,
}

impl HostBackend {
    pub(crate) fn new(size: (u32, u32)) -> Self {
        load_gl();
        Self {
            size: Cell::new(size),
        }
    }

    pub(crate) fn size(&self) -> (u32, u32) {
        self.size.get()
    }
}

/// # Safety
///
/// Valid only while the host keeps its context current on this thread.
unsafe impl glium::backend::Backend for HostBackend {
    fn swap_buffers(&self) -> Result<(), glium::SwapBuffersError> {
        Ok(())
    }

    unsafe fn get_proc_address(&self, symbol: &str) -> *const std::os::raw::c_void {
        gl_loader::get_proc_address(symbol).cast()
    }

    fn get_framebuffer_dimensions(&self) -> (u32, u32) {
        self.size.get()
    }

    fn is_current(&self) -> bool {
        unsafe { !gl::GetString(gl::VERSION).is_null() }
    }

    unsafe fn make_current(&self) {}

    fn resize(&self, new_size: (u32, u32)) {
        self.size.set(new_size);
    }
}
