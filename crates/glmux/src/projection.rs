//! Quad geometry mapping a source image onto a destination rectangle.

use glmux_context::bytes::slice_as_bytes;
use glmux_context::{BufferKind, BufferUsage, DrawCall, GlContext, Vertex, QUAD_INDICES, VERTEX_STRIDE};
use glmux_core::{GlResult, IntPoint, IntRect};

/// Column-major orthographic projection with depth range `[-1, 1]`.
pub fn ortho(left: f32, right: f32, bottom: f32, top: f32) -> [f32; 16] {
    let mut m = [0.0; 16];
    m[0] = 2.0 / (right - left);
    m[5] = 2.0 / (top - bottom);
    m[10] = -1.0;
    m[12] = -(right + left) / (right - left);
    m[13] = -(top + bottom) / (top - bottom);
    m[15] = 1.0;
    m
}

/// Quad covering the destination rectangle in source pixel space, with
/// texture coordinates `dest_rect / src_size`, drawn through an
/// orthographic transform onto a viewport the size of the destination.
#[derive(Debug)]
pub struct ImagingProjection {
    src_size: IntPoint,
    dest_rect: IntRect,
    vertex_buffer: u32,
    index_buffer: u32,
    transform: [f32; 16],
}

impl ImagingProjection {
    pub fn new(ctx: &mut dyn GlContext, src_size: IntPoint, dest_rect: IntRect) -> GlResult<Self> {
        let vertices = quad_vertices(src_size, dest_rect);
        let vertex_buffer =
            ctx.create_buffer(BufferKind::Vertex, BufferUsage::StaticDraw, 4 * VERTEX_STRIDE)?;
        let index_buffer = ctx.create_buffer(
            BufferKind::Index,
            BufferUsage::StaticDraw,
            std::mem::size_of_val(&QUAD_INDICES),
        )?;
        ctx.write_buffer(vertex_buffer, 0, slice_as_bytes(&vertices))?;
        ctx.write_buffer(index_buffer, 0, slice_as_bytes(&QUAD_INDICES))?;
        let transform = ortho(
            dest_rect.tl.x as f32,
            dest_rect.br.x as f32,
            dest_rect.tl.y as f32,
            dest_rect.br.y as f32,
        );
        Ok(Self {
            src_size,
            dest_rect,
            vertex_buffer,
            index_buffer,
            transform,
        })
    }

    /// Projection that maps a texture of `size` one to one onto a target of
    /// the same size.
    pub fn identity(ctx: &mut dyn GlContext, size: IntPoint) -> GlResult<Self> {
        Self::new(ctx, size, IntRect::from_size(size))
    }

    pub fn src_size(&self) -> IntPoint {
        self.src_size
    }

    pub fn dest_rect(&self) -> IntRect {
        self.dest_rect
    }

    pub fn transform(&self) -> &[f32; 16] {
        &self.transform
    }

    /// Set the viewport to cover the destination.
    pub fn activate(&self, ctx: &mut dyn GlContext) {
        ctx.set_viewport(IntRect::from_size(self.dest_rect.size()));
    }

    /// Draw call for the quad with `program`; add samplers and uniforms
    /// before submitting it.
    pub fn draw_call(&self, program: u32) -> DrawCall {
        DrawCall::new(
            program,
            self.vertex_buffer,
            self.index_buffer,
            QUAD_INDICES.len(),
        )
        .transform(self.transform)
    }

    pub fn release(self, ctx: &mut dyn GlContext) -> GlResult<()> {
        ctx.delete_buffer(self.vertex_buffer)?;
        ctx.delete_buffer(self.index_buffer)
    }
}

fn quad_vertices(src_size: IntPoint, dest_rect: IntRect) -> [Vertex; 4] {
    let (w, h) = (src_size.x.max(1) as f32, src_size.y.max(1) as f32);
    let (l, t) = (dest_rect.tl.x as f32, dest_rect.tl.y as f32);
    let (r, b) = (dest_rect.br.x as f32, dest_rect.br.y as f32);
    let v = |x: f32, y: f32| Vertex {
        pos: [x, y, 0.0],
        tex_coord: [x / w, y / h],
    };
    [v(l, t), v(r, t), v(r, b), v(l, b)]
}
