use std::collections::HashMap;

use glmux::{write_vertex_array, ContextMultiplexer, FlushError};
use glmux_context::{GlContext, SoftContext, TextureDesc, Vertex, WrapMode, QUAD_INDICES};
use glmux_core::{Bitmap, GlError, IntPoint, PixelFormat};
use pretty_assertions::assert_eq;

fn solid(size: IntPoint, rgba: [f32; 4]) -> Bitmap {
    let mut bmp = Bitmap::new(size, PixelFormat::R8G8B8A8);
    bmp.fill(rgba);
    bmp
}

fn desc() -> TextureDesc {
    TextureDesc::new(IntPoint::new(2, 2), PixelFormat::R8G8B8A8)
}

#[test]
fn every_context_gets_its_own_texture() {
    let mux = ContextMultiplexer::new();
    let mut a = SoftContext::new();
    let mut b = SoftContext::new();
    let tex = mux.request_texture_from_bitmap(
        solid(IntPoint::new(2, 2), [1.0, 0.0, 0.0, 1.0]),
        false,
        WrapMode::ClampToEdge,
        WrapMode::ClampToEdge,
    );
    assert_eq!(mux.pending_len(), 2);

    mux.flush(&mut [&mut a as &mut dyn GlContext, &mut b]).unwrap();
    assert!(mux.is_empty());

    let on_a = tex.gl_id(a.id()).unwrap();
    let on_b = tex.gl_id(b.id()).unwrap();
    assert_eq!(a.texture_image(on_a).unwrap().pixel(1, 1), [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(b.texture_image(on_b).unwrap().pixel(0, 0), [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(a.object_counts().textures, 1);
    assert_eq!(b.object_counts().textures, 1);
}

#[test]
fn create_and_delete_in_one_flush_leaves_nothing_behind() {
    let mux = ContextMultiplexer::new();
    let mut a = SoftContext::new();
    let mut b = SoftContext::new();
    let tex = mux.request_texture(desc());
    mux.schedule_texture_delete(&tex);
    drop(tex);

    mux.flush(&mut [&mut a as &mut dyn GlContext, &mut b]).unwrap();

    assert_eq!(a.object_counts().textures, 0);
    assert_eq!(b.object_counts().textures, 0);
    assert!(mux.is_empty());
}

#[test]
fn last_upload_before_a_flush_wins() {
    let mux = ContextMultiplexer::new();
    let mut ctx = SoftContext::new();
    let tex = mux.request_texture(desc());
    mux.schedule_upload(&tex, solid(IntPoint::new(2, 2), [1.0, 0.0, 0.0, 1.0]));
    mux.schedule_upload(&tex, solid(IntPoint::new(2, 2), [0.0, 1.0, 0.0, 1.0]));
    assert_eq!(mux.pending_len(), 2);

    mux.flush_one(&mut ctx).unwrap();
    let id = tex.gl_id(ctx.id()).unwrap();
    assert_eq!(ctx.texture_image(id).unwrap().pixel(0, 0), [0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn a_failing_context_is_rolled_back_alone() {
    let mux = ContextMultiplexer::new();
    let mut good = SoftContext::new();
    let mut bad = SoftContext::new();
    bad.fail_next("upload_texture");
    let tex = mux.request_texture_from_bitmap(
        solid(IntPoint::new(2, 2), [1.0; 4]),
        false,
        WrapMode::ClampToEdge,
        WrapMode::ClampToEdge,
    );

    let FlushError { failures } = mux
        .flush(&mut [&mut good as &mut dyn GlContext, &mut bad])
        .unwrap_err();

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, bad.id());
    assert!(matches!(&failures[0].1, GlError::Operation { op, .. } if op == "upload_texture"));
    assert!(tex.is_realized_on(good.id()));
    assert!(!tex.is_realized_on(bad.id()));
    assert_eq!(good.object_counts().textures, 1);
    assert_eq!(bad.object_counts().textures, 0);
    assert!(mux.is_empty());
}

#[test]
fn dropping_the_last_handle_schedules_deletion() {
    let mux = ContextMultiplexer::new();
    let mut ctx = SoftContext::new();
    let tex = mux.request_texture(desc());
    let copy = tex.clone();
    mux.flush_one(&mut ctx).unwrap();
    assert_eq!(ctx.object_counts().textures, 1);

    drop(tex);
    assert!(mux.is_empty());
    drop(copy);
    assert_eq!(mux.pending_len(), 1);

    mux.flush_one(&mut ctx).unwrap();
    assert_eq!(ctx.object_counts().textures, 0);
}

#[test]
fn gone_contexts_are_forgotten_without_gl_calls() {
    let mux = ContextMultiplexer::new();
    let mut a = SoftContext::new();
    let mut b = SoftContext::new();
    let tex = mux.request_texture(desc());
    mux.flush(&mut [&mut a as &mut dyn GlContext, &mut b]).unwrap();

    mux.context_gone(b.id());
    assert!(tex.is_realized_on(a.id()));
    assert!(!tex.is_realized_on(b.id()));

    drop(tex);
    mux.flush_one(&mut a).unwrap();
    assert_eq!(a.object_counts().textures, 0);
    // Never deleted through the multiplexer once forgotten.
    assert_eq!(b.object_counts().textures, 1);
}

#[test]
fn reset_discards_pending_work() {
    let mux = ContextMultiplexer::new();
    let mut ctx = SoftContext::new();
    let _tex = mux.request_texture(desc());
    mux.schedule_delete(42);
    assert_eq!(mux.pending_len(), 2);

    mux.reset();
    assert!(mux.is_empty());
    mux.flush_one(&mut ctx).unwrap();
    assert_eq!(ctx.object_counts().textures, 0);
}

#[test]
fn raw_deletes_skip_unknown_ids() {
    let mux = ContextMultiplexer::new();
    let mut ctx = SoftContext::new();
    let id = ctx.create_texture(&desc()).unwrap();
    mux.schedule_delete(id);
    mux.schedule_delete(id + 100);

    mux.flush_one(&mut ctx).unwrap();
    assert!(!ctx.is_texture(id));
}

#[test]
fn clones_share_the_same_queues() {
    let mux = ContextMultiplexer::new();
    let other = mux.clone();
    let _tex = other.request_texture(desc());
    assert_eq!(mux.pending_len(), 1);
}

#[test]
fn vertex_arrays_are_realised_and_released() {
    let mux = ContextMultiplexer::new();
    let mut ctx = SoftContext::new();
    let array = mux.create_vertex_array(4, 6);
    mux.flush_one(&mut ctx).unwrap();
    assert_eq!(ctx.object_counts().buffers, 2);

    let vertices = [Vertex::default(); 4];
    write_vertex_array(&mut ctx, &array, &vertices, &QUAD_INDICES).unwrap();
    let (_, ibo) = array.buffers(ctx.id()).unwrap();
    assert_eq!(ctx.buffer_data(ibo).unwrap().len(), 24);

    let err = write_vertex_array(&mut ctx, &array, &[Vertex::default(); 5], &[]).unwrap_err();
    assert_eq!(err.op(), Some("write_vertex_array"));

    drop(array);
    mux.flush_one(&mut ctx).unwrap();
    assert_eq!(ctx.object_counts().buffers, 0);
}

#[test]
fn explicit_buffer_deletes_target_their_context() {
    let mux = ContextMultiplexer::new();
    let mut a = SoftContext::new();
    let mut b = SoftContext::new();
    let on_a = a
        .create_buffer(
            glmux_context::BufferKind::Vertex,
            glmux_context::BufferUsage::StaticDraw,
            16,
        )
        .unwrap();
    let on_b = b
        .create_buffer(
            glmux_context::BufferKind::Vertex,
            glmux_context::BufferUsage::StaticDraw,
            16,
        )
        .unwrap();
    mux.schedule_buffer_delete(HashMap::from([(a.id(), vec![on_a])]));

    mux.flush(&mut [&mut a as &mut dyn GlContext, &mut b]).unwrap();
    assert!(!a.is_buffer(on_a));
    assert!(b.is_buffer(on_b));
}

#[test]
fn raw_delete_of_a_shared_texture_unlinks_the_handle() {
    let mux = ContextMultiplexer::new();
    let mut ctx = SoftContext::new();
    let tex = mux.request_texture(desc());
    mux.flush_one(&mut ctx).unwrap();
    let id = tex.gl_id(ctx.id()).unwrap();

    mux.schedule_delete(id);
    mux.flush_one(&mut ctx).unwrap();
    assert!(!ctx.is_texture(id));
    assert!(!tex.is_realized_on(ctx.id()));

    drop(tex);
    assert!(mux.is_empty());
    let other = mux.request_texture(desc());
    mux.flush_one(&mut ctx).unwrap();
    assert!(other.is_realized_on(ctx.id()));
    assert_eq!(ctx.object_counts().textures, 1);
}

#[test]
fn stale_deletes_do_not_undo_creates() {
    let mux = ContextMultiplexer::new();
    let mut ctx = SoftContext::new();
    let mut ids = HashMap::new();
    ids.insert(ctx.id(), vec![99]);
    mux.schedule_buffer_delete(ids);
    let tex = mux.request_texture(desc());

    mux.flush_one(&mut ctx).unwrap();
    assert!(tex.is_realized_on(ctx.id()));
    assert_eq!(ctx.object_counts().textures, 1);
}
