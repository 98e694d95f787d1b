use glmux::{Framebuffer, GlTexture, ImagingProjection, PixelBuffer};
use glmux_context::{BufferUsage, GlContext, SoftContext, WrapMode};
use glmux_core::{Bitmap, GlError, IntPoint, IntRect, PixelFormat};
use pretty_assertions::assert_eq;

fn ramp(size: IntPoint, format: PixelFormat) -> Bitmap {
    let mut bmp = Bitmap::new(size, format);
    for y in 0..size.y {
        for x in 0..size.x {
            bmp.set_pixel(x, y, [x as f32 / 4.0, y as f32 / 4.0, 0.5, 1.0]);
        }
    }
    bmp
}

#[test]
fn textures_from_bitmaps() {
    let mut ctx = SoftContext::new();
    let src = ramp(IntPoint::new(3, 2), PixelFormat::R32G32B32A32F);
    let tex = GlTexture::from_bitmap(&mut ctx, &src).unwrap();
    assert_eq!(tex.size(), IntPoint::new(3, 2));
    assert_eq!(tex.format(), PixelFormat::R32G32B32A32F);
    assert_eq!(ctx.texture_image(tex.id()).unwrap(), &src);

    let mut next = src.clone();
    next.fill([0.0, 0.0, 0.0, 1.0]);
    tex.upload(&mut ctx, &next).unwrap();
    assert_eq!(ctx.texture_image(tex.id()).unwrap(), &next);

    tex.release(&mut ctx).unwrap();
    assert_eq!(ctx.object_counts().textures, 0);
}

#[test]
fn pixel_buffer_converts_into_its_format() {
    let mut ctx = SoftContext::new();
    let size = IntPoint::new(4, 4);
    let tex = GlTexture::with_format(&mut ctx, size, PixelFormat::R8G8B8A8, WrapMode::Repeat)
        .unwrap();
    assert_eq!(tex.desc().wrap_s, WrapMode::Repeat);
    let pbo = PixelBuffer::new(&mut ctx, size, PixelFormat::R8G8B8A8, BufferUsage::StreamDraw)
        .unwrap();

    let src = ramp(size, PixelFormat::B8G8R8A8);
    pbo.move_bitmap_to_texture(&mut ctx, &src, &tex).unwrap();
    let image = ctx.texture_image(tex.id()).unwrap();
    assert_eq!(image.format(), PixelFormat::R8G8B8A8);
    assert_eq!(image.pixel(3, 2), src.pixel(3, 2));
}

#[test]
fn pixel_buffer_rejects_mismatched_sizes() {
    let mut ctx = SoftContext::new();
    let pbo = PixelBuffer::new(
        &mut ctx,
        IntPoint::new(2, 2),
        PixelFormat::R8G8B8A8,
        BufferUsage::StreamDraw,
    )
    .unwrap();
    let big = GlTexture::with_format(
        &mut ctx,
        IntPoint::new(4, 4),
        PixelFormat::R8G8B8A8,
        WrapMode::ClampToEdge,
    )
    .unwrap();

    let err = pbo.move_to_texture(&mut ctx, &big).unwrap_err();
    assert!(matches!(err, GlError::SizeMismatch { op: "PixelBuffer::move_to_texture", .. }));
    let err = pbo
        .move_bitmap_to_texture(&mut ctx, &Bitmap::new(IntPoint::new(3, 3), PixelFormat::R8G8B8A8), &big)
        .unwrap_err();
    assert!(matches!(err, GlError::SizeMismatch { .. }));
}

#[test]
fn framebuffer_copies_every_attachment() {
    let mut ctx = SoftContext::new();
    let size = IntPoint::new(2, 3);
    let fbo = Framebuffer::new(&mut ctx, size, PixelFormat::R32G32B32A32F, 2).unwrap();
    assert_eq!(fbo.num_textures(), 2);
    assert_eq!(ctx.object_counts().textures, 4);

    let a = ramp(size, PixelFormat::R32G32B32A32F);
    let mut b = Bitmap::new(size, PixelFormat::R32G32B32A32F);
    b.fill([0.25; 4]);
    fbo.attachment(0).upload(&mut ctx, &a).unwrap();
    fbo.attachment(1).upload(&mut ctx, &b).unwrap();

    fbo.copy_to_dest_texture(&mut ctx).unwrap();
    assert_eq!(ctx.texture_image(fbo.dest_texture(0).id()).unwrap(), &a);
    assert_eq!(ctx.texture_image(fbo.dest_texture(1).id()).unwrap(), &b);
    assert_eq!(fbo.image(&mut ctx).unwrap(), a);

    fbo.activate(&mut ctx).unwrap();
    assert_eq!(ctx.bound_framebuffer(), Some(fbo.id()));
    fbo.deactivate(&mut ctx).unwrap();
    assert_eq!(ctx.bound_framebuffer(), None);

    fbo.release(&mut ctx).unwrap();
    let left = ctx.object_counts();
    assert_eq!((left.textures, left.framebuffers), (0, 0));
}

#[test]
fn projection_sets_a_destination_sized_viewport() {
    let mut ctx = SoftContext::new();
    let projection = ImagingProjection::new(
        &mut ctx,
        IntPoint::new(10, 10),
        IntRect::from_coords(-2, -2, 12, 8),
    )
    .unwrap();
    projection.activate(&mut ctx);
    assert_eq!(ctx.viewport(), IntRect::from_size(IntPoint::new(14, 10)));
    assert_eq!(ctx.object_counts().buffers, 2);

    projection.release(&mut ctx).unwrap();
    assert_eq!(ctx.object_counts().buffers, 0);
}
