use glmux::blur::{blur_program_source, BLUR_PROGRAM};
use glmux::{register_software_shaders, BlurFilter};
use glmux_context::{GlContext, SoftContext};
use glmux_core::{compute_kernel, Bitmap, IntPoint, IntRect, PixelFormat};
use pretty_assertions::assert_eq;

fn blur_context() -> SoftContext {
    let mut ctx = SoftContext::new();
    register_software_shaders(&mut ctx);
    ctx
}

fn single_dot(size: IntPoint, format: PixelFormat) -> Bitmap {
    let mut bmp = Bitmap::new(size, format);
    bmp.set_pixel(size.x / 2, size.y / 2, [1.0; 4]);
    bmp
}

fn alpha_sum(bmp: &Bitmap) -> f64 {
    let size = bmp.size();
    let mut sum = 0.0;
    for y in 0..size.y {
        for x in 0..size.x {
            sum += f64::from(bmp.pixel(x, y)[3]);
        }
    }
    sum
}

#[test]
fn blur_spreads_a_dot_and_keeps_its_mass() {
    let mut ctx = blur_context();
    let mut blur = BlurFilter::new(
        PixelFormat::R32G32B32A32F,
        PixelFormat::R32G32B32A32F,
        true,
    );
    blur.set_std_dev(&mut ctx, 1.0, 1.0).unwrap();
    blur.set_dimensions(&mut ctx, IntPoint::new(9, 9)).unwrap();
    assert_eq!(blur.filter().dest_rect(), IntRect::from_coords(-3, -3, 12, 12));

    let out = blur
        .apply(&mut ctx, &single_dot(IntPoint::new(9, 9), PixelFormat::R32G32B32A32F))
        .unwrap();
    assert_eq!(out.size(), IntPoint::new(15, 15));
    assert!((alpha_sum(&out) - 1.0).abs() < 1e-4, "alpha sum {}", alpha_sum(&out));

    let kernel = compute_kernel(1.0, 1.0);
    let c = kernel.len() / 2;
    let center = out.pixel(7, 7);
    assert!((center[3] - kernel[c] * kernel[c]).abs() < 1e-5);
    // Colour is not darkened by the transparent surroundings.
    assert!((center[0] - 1.0).abs() < 1e-5);
    assert!((out.pixel(8, 7)[3] - kernel[c] * kernel[c + 1]).abs() < 1e-5);
    assert_eq!(out.pixel(0, 0), [0.0; 4]);
}

#[test]
fn blur_is_symmetric() {
    let mut ctx = blur_context();
    let mut blur = BlurFilter::new(
        PixelFormat::R32G32B32A32F,
        PixelFormat::R32G32B32A32F,
        true,
    );
    blur.set_std_dev(&mut ctx, 1.5, 1.0).unwrap();
    blur.set_dimensions(&mut ctx, IntPoint::new(7, 7)).unwrap();
    let out = blur
        .apply(&mut ctx, &single_dot(IntPoint::new(7, 7), PixelFormat::R32G32B32A32F))
        .unwrap();

    let size = out.size();
    for y in 0..size.y {
        for x in 0..size.x {
            let a = out.pixel(x, y)[3];
            let mirrored = out.pixel(size.x - 1 - x, size.y - 1 - y)[3];
            let transposed = out.pixel(y, x)[3];
            assert!((a - mirrored).abs() < 1e-6);
            assert!((a - transposed).abs() < 1e-6);
        }
    }
}

#[test]
fn byte_input_comes_back_in_its_own_format() {
    let mut ctx = blur_context();
    let mut blur = BlurFilter::new(
        PixelFormat::B8G8R8A8,
        PixelFormat::R32G32B32A32F,
        true,
    );
    blur.set_std_dev(&mut ctx, 1.0, 1.0).unwrap();
    blur.set_dimensions(&mut ctx, IntPoint::new(9, 9)).unwrap();

    let out = blur
        .apply(&mut ctx, &single_dot(IntPoint::new(9, 9), PixelFormat::B8G8R8A8))
        .unwrap();
    assert_eq!(out.format(), PixelFormat::B8G8R8A8);
    assert_eq!(out.size(), IntPoint::new(15, 15));

    let kernel = compute_kernel(1.0, 1.0);
    let c = kernel.len() / 2;
    assert!((out.pixel(7, 7)[3] - kernel[c] * kernel[c]).abs() <= 1.0 / 255.0);
}

#[test]
fn zero_std_dev_copies_the_source() {
    let mut ctx = blur_context();
    let mut blur = BlurFilter::new(PixelFormat::R8G8B8A8, PixelFormat::R8G8B8A8, true);
    blur.set_dimensions(&mut ctx, IntPoint::new(5, 5)).unwrap();

    let src = single_dot(IntPoint::new(5, 5), PixelFormat::R8G8B8A8);
    assert_eq!(blur.apply(&mut ctx, &src).unwrap(), src);
}

#[test]
fn changing_std_dev_resizes_and_keeps_objects_balanced() {
    let mut ctx = blur_context();
    let mut blur = BlurFilter::new(
        PixelFormat::R32G32B32A32F,
        PixelFormat::R32G32B32A32F,
        true,
    );
    blur.set_std_dev(&mut ctx, 1.0, 1.0).unwrap();
    blur.set_dimensions(&mut ctx, IntPoint::new(6, 6)).unwrap();
    let counts = ctx.object_counts();

    blur.set_std_dev(&mut ctx, 2.0, 1.0).unwrap();
    assert_eq!(blur.filter().dest_rect(), IntRect::from_coords(-6, -6, 12, 12));
    assert_eq!(ctx.object_counts(), counts);

    let out = blur
        .apply(&mut ctx, &single_dot(IntPoint::new(6, 6), PixelFormat::R32G32B32A32F))
        .unwrap();
    assert_eq!(out.size(), IntPoint::new(18, 18));

    blur.release(&mut ctx).unwrap();
    let left = ctx.object_counts();
    assert_eq!((left.textures, left.buffers, left.framebuffers, left.programs), (0, 0, 0, 0));
}

#[test]
fn gpu_source_matches_the_registered_program() {
    let source = blur_program_source();
    assert_eq!(source.name, BLUR_PROGRAM);
    assert!(source.fragment.contains("void unPreMultiplyAlpha"));
    assert!(source.fragment.contains("uniform sampler2D kernelTex;"));
    assert!(blur_context().has_shader(BLUR_PROGRAM));
}

#[test]
#[should_panic(expected = "not configured")]
fn unconfigured_blur_panics() {
    let mut ctx = blur_context();
    let mut blur = BlurFilter::new(PixelFormat::R8G8B8A8, PixelFormat::R8G8B8A8, true);
    let _ = blur.apply(&mut ctx, &Bitmap::new(IntPoint::new(2, 2), PixelFormat::R8G8B8A8));
}
