use glmux_context::bytes::slice_as_bytes;
use glmux_context::context::IDENTITY;
use glmux_context::{
    BufferKind, BufferUsage, DrawCall, GlContext, ProgramSource, SoftContext, TextureDesc, Uniform,
    Vertex, WrapMode, QUAD_INDICES,
};
use glmux_core::{Bitmap, GlError, IntPoint, IntRect, PixelFormat};
use pretty_assertions::assert_eq;

fn quad_buffers(ctx: &mut SoftContext) -> (u32, u32) {
    let vertices = [
        Vertex { pos: [-1.0, -1.0, 0.0], tex_coord: [0.0, 0.0] },
        Vertex { pos: [1.0, -1.0, 0.0], tex_coord: [1.0, 0.0] },
        Vertex { pos: [1.0, 1.0, 0.0], tex_coord: [1.0, 1.0] },
        Vertex { pos: [-1.0, 1.0, 0.0], tex_coord: [0.0, 1.0] },
    ];
    let vbo = ctx
        .create_buffer(BufferKind::Vertex, BufferUsage::StaticDraw, 4 * 20)
        .unwrap();
    ctx.write_buffer(vbo, 0, slice_as_bytes(&vertices)).unwrap();
    let ibo = ctx
        .create_buffer(BufferKind::Index, BufferUsage::StaticDraw, 6 * 4)
        .unwrap();
    ctx.write_buffer(ibo, 0, slice_as_bytes(&QUAD_INDICES)).unwrap();
    (vbo, ibo)
}

fn gradient(size: IntPoint) -> Bitmap {
    let mut bmp = Bitmap::new(size, PixelFormat::R8G8B8A8);
    for y in 0..size.y {
        for x in 0..size.x {
            bmp.set_pixel(x, y, [x as f32 / 255.0, y as f32 / 255.0, 0.0, 1.0]);
        }
    }
    bmp
}

#[test]
fn upload_then_read_back_through_a_framebuffer() {
    let mut ctx = SoftContext::new();
    let size = IntPoint::new(4, 3);
    let tex = ctx
        .create_texture(&TextureDesc::new(size, PixelFormat::R8G8B8A8))
        .unwrap();
    let src = gradient(size);
    ctx.upload_texture(tex, &src).unwrap();
    let fbo = ctx.create_framebuffer(&[tex]).unwrap();

    let back = ctx
        .read_pixels(fbo, 0, IntRect::from_size(size), PixelFormat::R8G8B8A8)
        .unwrap();
    assert_eq!(back, src);

    let bgra = ctx
        .read_pixels(fbo, 0, IntRect::from_size(size), PixelFormat::B8G8R8A8)
        .unwrap();
    assert_eq!(bgra.format(), PixelFormat::B8G8R8A8);
    assert_eq!(bgra.pixel(3, 2), src.pixel(3, 2));
}

#[test]
fn pixel_buffer_transfer_fills_texture() {
    let mut ctx = SoftContext::new();
    let size = IntPoint::new(2, 2);
    let tex = ctx
        .create_texture(&TextureDesc::new(size, PixelFormat::R8G8B8A8))
        .unwrap();
    let pbo = ctx
        .create_buffer(BufferKind::PixelUnpack, BufferUsage::StreamDraw, 16)
        .unwrap();
    let src = gradient(size);
    ctx.write_buffer(pbo, 0, src.pixels()).unwrap();
    ctx.buffer_to_texture(pbo, tex, size, PixelFormat::R8G8B8A8)
        .unwrap();
    assert_eq!(ctx.texture_image(tex).unwrap(), &src);
}

#[test]
fn oversized_writes_report_the_map_call() {
    let mut ctx = SoftContext::new();
    let pbo = ctx
        .create_buffer(BufferKind::PixelUnpack, BufferUsage::StreamDraw, 8)
        .unwrap();
    let err = ctx.write_buffer(pbo, 4, &[0; 8]).unwrap_err();
    assert_eq!(err.op(), Some("MapBuffer()"));
}

#[test]
fn draw_runs_the_registered_shader_over_the_viewport() {
    let mut ctx = SoftContext::new();
    ctx.register_shader("copy", |frag| {
        let c = frag.sample("tex", frag.tex_coord);
        [c[0], c[1], c[2], frag.float("alpha")]
    });
    let size = IntPoint::new(4, 4);
    let src_tex = ctx
        .create_texture(&TextureDesc::new(size, PixelFormat::R8G8B8A8))
        .unwrap();
    let src = gradient(size);
    ctx.upload_texture(src_tex, &src).unwrap();
    let dst_tex = ctx
        .create_texture(&TextureDesc::new(size, PixelFormat::R8G8B8A8))
        .unwrap();
    let fbo = ctx.create_framebuffer(&[dst_tex]).unwrap();
    let program = ctx
        .compile_program(&ProgramSource::new("copy", "", ""))
        .unwrap();
    let (vbo, ibo) = quad_buffers(&mut ctx);

    ctx.bind_framebuffer(Some(fbo)).unwrap();
    ctx.set_viewport(IntRect::from_size(size));
    ctx.draw(
        &DrawCall::new(program, vbo, ibo, 6)
            .transform(IDENTITY)
            .sampler("tex", src_tex)
            .uniform("alpha", Uniform::Float(1.0)),
    )
    .unwrap();
    ctx.bind_framebuffer(None).unwrap();

    assert_eq!(ctx.texture_image(dst_tex).unwrap(), &src);
}

#[test]
fn border_wrap_samples_transparent_black() {
    let mut ctx = SoftContext::new();
    ctx.register_shader("shifted", |frag| {
        frag.sample("tex", [frag.tex_coord[0] + 0.5, frag.tex_coord[1]])
    });
    let size = IntPoint::new(2, 1);
    let desc = TextureDesc::new(size, PixelFormat::R32G32B32A32F)
        .with_wrap(WrapMode::ClampToBorder, WrapMode::ClampToBorder);
    let src_tex = ctx.create_texture(&desc).unwrap();
    let mut src = Bitmap::new(size, PixelFormat::R32G32B32A32F);
    src.fill([1.0; 4]);
    ctx.upload_texture(src_tex, &src).unwrap();
    let dst_tex = ctx
        .create_texture(&TextureDesc::new(size, PixelFormat::R32G32B32A32F))
        .unwrap();
    let fbo = ctx.create_framebuffer(&[dst_tex]).unwrap();
    let program = ctx
        .compile_program(&ProgramSource::new("shifted", "", ""))
        .unwrap();
    let (vbo, ibo) = quad_buffers(&mut ctx);

    ctx.bind_framebuffer(Some(fbo)).unwrap();
    ctx.set_viewport(IntRect::from_size(size));
    ctx.draw(&DrawCall::new(program, vbo, ibo, 6).sampler("tex", src_tex))
        .unwrap();

    let out = ctx.texture_image(dst_tex).unwrap();
    assert_eq!(out.pixel(0, 0), [1.0; 4]);
    assert_eq!(out.pixel(1, 0), [0.0; 4]);
}

#[test]
fn programs_without_a_software_shader_are_unsupported() {
    let mut ctx = SoftContext::new();
    let err = ctx
        .compile_program(&ProgramSource::new("missing", "", ""))
        .unwrap_err();
    assert!(matches!(err, GlError::Unsupported(_)));
}

#[test]
fn injected_failures_fire_once() {
    let mut ctx = SoftContext::new();
    ctx.fail_next("create_texture");
    let desc = TextureDesc::new(IntPoint::new(1, 1), PixelFormat::A8);
    assert!(ctx.create_texture(&desc).is_err());
    assert!(ctx.create_texture(&desc).is_ok());
    assert_eq!(ctx.object_counts().textures, 1);
}

#[test]
fn pot_padding_uses_the_border_colour() {
    let mut ctx = SoftContext::new();
    let desc = TextureDesc::new(IntPoint::new(3, 3), PixelFormat::R32G32B32A32F)
        .with_pot([0.0, 0.0, 1.0, 1.0]);
    let tex = ctx.create_texture(&desc).unwrap();
    let mut src = Bitmap::new(IntPoint::new(3, 3), PixelFormat::R32G32B32A32F);
    src.fill([1.0; 4]);
    ctx.upload_texture(tex, &src).unwrap();

    let image = ctx.texture_image(tex).unwrap();
    assert_eq!(image.size(), IntPoint::new(4, 4));
    assert_eq!(image.pixel(2, 2), [1.0; 4]);
    assert_eq!(image.pixel(3, 3), [0.0, 0.0, 1.0, 1.0]);
}
