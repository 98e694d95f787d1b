//! Deferred, per-context realisation of shared GPU resources.
//!
//! Callers record intents (create, upload, delete) from any thread without a
//! current context. [`ContextMultiplexer::flush`] later replays the pending
//! batch once on every context the host hands in, in a fixed kind order:
//! creates, then uploads, then deletes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use glmux_context::bytes::slice_as_bytes;
use glmux_context::{
    BufferKind, BufferUsage, ContextId, GlContext, TextureDesc, WrapMode, VERTEX_STRIDE,
};
use glmux_core::{Bitmap, GlError, GlResult, IntPoint, PixelFormat};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Physical object ids keyed by the context that owns them.
pub type ContextIdMap = HashMap<ContextId, Vec<u32>>;

/// Failures of one [`ContextMultiplexer::flush`], one entry per context that
/// could not apply the batch.
#[derive(Debug, Error)]
#[error("flush failed on {} context(s): {}", .failures.len(), summary(.failures))]
pub struct FlushError {
    pub failures: Vec<(ContextId, GlError)>,
}

fn summary(failures: &[(ContextId, GlError)]) -> String {
    failures
        .iter()
        .map(|(ctx, err)| format!("{ctx}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Shared handles
// ---------------------------------------------------------------------------

struct TextureInner {
    id: u64,
    desc: TextureDesc,
    physical: Mutex<HashMap<ContextId, u32>>,
    pool: Weak<Queues>,
}

impl Drop for TextureInner {
    fn drop(&mut self) {
        let physical = std::mem::take(
            self.physical
                .get_mut()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        if physical.is_empty() {
            return;
        }
        if let Some(queues) = self.pool.upgrade() {
            trace!(handle = self.id, "last texture reference dropped, deleting");
            let ids = physical.into_iter().map(|(ctx, id)| (ctx, vec![id])).collect();
            lock(&queues.state).batch.push(PendingOp::DeleteTextures(ids));
        }
    }
}

/// Logical texture realised once on every flushed context.
///
/// Clones share the handle. When the last clone goes away every physical
/// texture it owns is scheduled for deletion.
#[derive(Clone)]
pub struct SharedTexture {
    inner: Arc<TextureInner>,
}

impl std::fmt::Debug for SharedTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTexture")
            .field("id", &self.inner.id)
            .field("desc", &self.inner.desc)
            .finish()
    }
}

impl SharedTexture {
    /// Logical id, stable across contexts.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.inner.desc
    }

    pub fn size(&self) -> IntPoint {
        self.inner.desc.size
    }

    pub fn format(&self) -> PixelFormat {
        self.inner.desc.format
    }

    /// Physical texture on `ctx`, once a flush has realised it there.
    pub fn gl_id(&self, ctx: ContextId) -> Option<u32> {
        lock(&self.inner.physical).get(&ctx).copied()
    }

    pub fn is_realized_on(&self, ctx: ContextId) -> bool {
        self.gl_id(ctx).is_some()
    }

    pub fn ptr_eq(&self, other: &SharedTexture) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

struct VertexArrayInner {
    id: u64,
    reserve_vertices: usize,
    reserve_indices: usize,
    physical: Mutex<HashMap<ContextId, (u32, u32)>>,
    pool: Weak<Queues>,
}

impl Drop for VertexArrayInner {
    fn drop(&mut self) {
        let physical = std::mem::take(
            self.physical
                .get_mut()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        if physical.is_empty() {
            return;
        }
        if let Some(queues) = self.pool.upgrade() {
            let ids = physical
                .into_iter()
                .map(|(ctx, (vbo, ibo))| (ctx, vec![vbo, ibo]))
                .collect();
            lock(&queues.state).batch.push(PendingOp::DeleteBuffers(ids));
        }
    }
}

/// Logical vertex/index buffer pair realised once per context.
#[derive(Clone)]
pub struct SharedVertexArray {
    inner: Arc<VertexArrayInner>,
}

impl SharedVertexArray {
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn reserved(&self) -> (usize, usize) {
        (self.inner.reserve_vertices, self.inner.reserve_indices)
    }

    /// `(vertex buffer, index buffer)` on `ctx`.
    pub fn buffers(&self, ctx: ContextId) -> Option<(u32, u32)> {
        lock(&self.inner.physical).get(&ctx).copied()
    }
}

// ---------------------------------------------------------------------------
// Command batch
// ---------------------------------------------------------------------------

/// What to delete for a [`PendingOp::DeleteTexture`].
#[derive(Debug)]
pub enum TextureTarget {
    /// Every physical texture of a handle, resolved at flush time.
    Shared(SharedTexture),
    /// A raw texture id, deleted on every flushed context.
    Raw(u32),
}

/// One recorded intent.
pub enum PendingOp {
    CreateTexture(SharedTexture),
    CreateVertexArray(SharedVertexArray),
    Upload(SharedTexture, Bitmap),
    DeleteTexture(TextureTarget),
    /// Per-context texture ids.
    DeleteTextures(ContextIdMap),
    /// Per-context buffer ids.
    DeleteBuffers(ContextIdMap),
}

impl PendingOp {
    fn rank(&self) -> u8 {
        match self {
            PendingOp::CreateTexture(_) | PendingOp::CreateVertexArray(_) => 0,
            PendingOp::Upload(..) => 1,
            PendingOp::DeleteTexture(_)
            | PendingOp::DeleteTextures(_)
            | PendingOp::DeleteBuffers(_) => 2,
        }
    }
}

impl std::fmt::Debug for PendingOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingOp::CreateTexture(t) => write!(f, "CreateTexture({})", t.id()),
            PendingOp::CreateVertexArray(v) => write!(f, "CreateVertexArray({})", v.id()),
            PendingOp::Upload(t, bmp) => write!(f, "Upload({}, {:?})", t.id(), bmp.size()),
            PendingOp::DeleteTexture(target) => write!(f, "DeleteTexture({target:?})"),
            PendingOp::DeleteTextures(ids) => write!(f, "DeleteTextures({ids:?})"),
            PendingOp::DeleteBuffers(ids) => write!(f, "DeleteBuffers({ids:?})"),
        }
    }
}

/// Pending operations in submission order.
#[derive(Debug, Default)]
pub struct CommandBatch {
    ops: Vec<PendingOp>,
}

impl CommandBatch {
    fn push(&mut self, op: PendingOp) {
        self.ops.push(op);
    }

    /// Queue an upload, replacing the bitmap of an upload already pending
    /// for the same handle.
    fn push_upload(&mut self, texture: &SharedTexture, bitmap: Bitmap) {
        for op in &mut self.ops {
            if let PendingOp::Upload(t, pending) = op {
                if t.ptr_eq(texture) {
                    *pending = bitmap;
                    return;
                }
            }
        }
        self.ops.push(PendingOp::Upload(texture.clone(), bitmap));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Operations in application order. Within one kind, submission order
    /// is kept.
    pub fn ordered(&self) -> Vec<&PendingOp> {
        let mut ops: Vec<&PendingOp> = self.ops.iter().collect();
        ops.sort_by_key(|op| op.rank());
        ops
    }

    fn forget_context(&mut self, ctx: ContextId) {
        for op in &mut self.ops {
            if let PendingOp::DeleteTextures(ids) | PendingOp::DeleteBuffers(ids) = op {
                ids.remove(&ctx);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Multiplexer
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    batch: CommandBatch,
    textures: Vec<Weak<TextureInner>>,
    vertex_arrays: Vec<Weak<VertexArrayInner>>,
}

#[derive(Default)]
struct Queues {
    state: Mutex<State>,
}

/// Objects one context realised during a flush, for rollback.
#[derive(Default)]
struct Realized {
    textures: Vec<(SharedTexture, u32)>,
    vertex_arrays: Vec<(SharedVertexArray, (u32, u32))>,
}

/// Owner of the deferred-operation queues.
///
/// Cheap to clone; clones share the same queues. Queuing never touches a GL
/// context and is safe from any thread. [`flush`](Self::flush) must run on
/// the thread that owns the contexts passed to it.
#[derive(Clone, Default)]
pub struct ContextMultiplexer {
    queues: Arc<Queues>,
}

impl ContextMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.queues.state)
    }

    /// Allocate a logical texture now; each context gets its physical
    /// texture at the next flush.
    pub fn request_texture(&self, desc: TextureDesc) -> SharedTexture {
        let texture = SharedTexture {
            inner: Arc::new(TextureInner {
                id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
                desc,
                physical: Mutex::new(HashMap::new()),
                pool: Arc::downgrade(&self.queues),
            }),
        };
        let mut state = self.state();
        state.textures.retain(|t| t.strong_count() > 0);
        state.textures.push(Arc::downgrade(&texture.inner));
        state.batch.push(PendingOp::CreateTexture(texture.clone()));
        trace!(handle = texture.id(), ?desc, "texture requested");
        texture
    }

    /// Texture sized and formatted after `bitmap`, with `bitmap` as its
    /// initial contents.
    pub fn request_texture_from_bitmap(
        &self,
        bitmap: Bitmap,
        mipmap: bool,
        wrap_s: WrapMode,
        wrap_t: WrapMode,
    ) -> SharedTexture {
        let desc = TextureDesc::new(bitmap.size(), bitmap.format())
            .with_mipmap(mipmap)
            .with_wrap(wrap_s, wrap_t);
        let texture = self.request_texture(desc);
        self.schedule_upload(&texture, bitmap);
        texture
    }

    /// Queue `bitmap` as the texture's new contents. A later call before the
    /// next flush replaces it.
    pub fn schedule_upload(&self, texture: &SharedTexture, bitmap: Bitmap) {
        let replaced = {
            let mut state = self.state();
            let before = state.batch.len();
            state.batch.push_upload(texture, bitmap);
            state.batch.len() == before
        };
        trace!(handle = texture.id(), replaced, "upload scheduled");
    }

    /// Delete every physical texture of `texture` at the next flush,
    /// including ones created by that same flush.
    pub fn schedule_texture_delete(&self, texture: &SharedTexture) {
        self.state()
            .batch
            .push(PendingOp::DeleteTexture(TextureTarget::Shared(texture.clone())));
    }

    /// Delete texture `id` on every context at the next flush.
    pub fn schedule_delete(&self, id: u32) {
        self.state()
            .batch
            .push(PendingOp::DeleteTexture(TextureTarget::Raw(id)));
    }

    /// Allocate a logical vertex array with room for the given vertex and
    /// index counts.
    pub fn create_vertex_array(&self, reserve_vertices: usize, reserve_indices: usize) -> SharedVertexArray {
        let array = SharedVertexArray {
            inner: Arc::new(VertexArrayInner {
                id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
                reserve_vertices,
                reserve_indices,
                physical: Mutex::new(HashMap::new()),
                pool: Arc::downgrade(&self.queues),
            }),
        };
        let mut state = self.state();
        state.vertex_arrays.retain(|v| v.strong_count() > 0);
        state.vertex_arrays.push(Arc::downgrade(&array.inner));
        state.batch.push(PendingOp::CreateVertexArray(array.clone()));
        array
    }

    /// Delete buffers by per-context id at the next flush.
    pub fn schedule_buffer_delete(&self, ids: ContextIdMap) {
        self.state().batch.push(PendingOp::DeleteBuffers(ids));
    }

    pub fn pending_len(&self) -> usize {
        self.state().batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().batch.is_empty()
    }

    /// Drop everything pending without touching any context.
    pub fn reset(&self) {
        let dropped = std::mem::take(&mut self.state().batch);
        debug!(ops = dropped.len(), "pending operations discarded");
    }

    /// Forget every physical object realised on `ctx`, which no longer
    /// exists. No GL calls are made.
    pub fn context_gone(&self, ctx: ContextId) {
        let (textures, arrays) = {
            let mut state = self.state();
            state.batch.forget_context(ctx);
            let textures: Vec<_> = state.textures.iter().filter_map(Weak::upgrade).collect();
            let arrays: Vec<_> = state
                .vertex_arrays
                .iter()
                .filter_map(Weak::upgrade)
                .collect();
            (textures, arrays)
        };
        for texture in &textures {
            lock(&texture.physical).remove(&ctx);
        }
        for array in &arrays {
            lock(&array.physical).remove(&ctx);
        }
        debug!(%ctx, "context gone");
    }

    /// Realise the pending batch on every context in `contexts`.
    ///
    /// Contexts are independent: if one fails, the objects this flush
    /// created on it are deleted again and the failure is reported, while
    /// the remaining contexts still apply the whole batch. The queue is
    /// empty afterwards either way.
    pub fn flush(&self, contexts: &mut [&mut dyn GlContext]) -> Result<(), FlushError> {
        let (batch, live) = {
            let mut state = self.state();
            let batch = std::mem::take(&mut state.batch);
            let live: Vec<SharedTexture> = state
                .textures
                .iter()
                .filter_map(Weak::upgrade)
                .map(|inner| SharedTexture { inner })
                .collect();
            (batch, live)
        };
        if batch.is_empty() {
            return Ok(());
        }
        debug!(ops = batch.len(), contexts = contexts.len(), "flushing");

        let ops = batch.ordered();
        let mut failures = Vec::new();
        for ctx in contexts.iter_mut() {
            let mut realized = Realized::default();
            if let Err(err) = apply_ops(&ops, &live, &mut **ctx, &mut realized) {
                error!(ctx = %ctx.id(), "flush failed: {err}");
                rollback(&mut **ctx, realized);
                failures.push((ctx.id(), err));
            }
        }
        drop(ops);
        // Handles released by the batch may schedule deletes; the queue lock
        // is not held here.
        drop(batch);
        drop(live);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(FlushError { failures })
        }
    }

    /// Single-context convenience for [`flush`](Self::flush).
    pub fn flush_one(&self, ctx: &mut dyn GlContext) -> Result<(), FlushError> {
        self.flush(&mut [ctx])
    }
}

/// Unlink raw texture `id` on `ctx` from any handle still mapping it, so
/// the handle's own delete never touches the id again.
fn forget_raw_texture(live: &[SharedTexture], ctx: ContextId, id: u32) {
    for texture in live {
        let mut physical = lock(&texture.inner.physical);
        if physical.get(&ctx) == Some(&id) {
            physical.remove(&ctx);
            debug!(%ctx, id, handle = texture.id(), "raw delete unlinked a shared texture");
        }
    }
}

fn apply_ops(
    ops: &[&PendingOp],
    live: &[SharedTexture],
    ctx: &mut dyn GlContext,
    realized: &mut Realized,
) -> GlResult<()> {
    let ctx_id = ctx.id();
    for op in ops {
        trace!(ctx = %ctx_id, ?op, "apply");
        match op {
            PendingOp::CreateTexture(texture) => {
                let id = ctx.create_texture(texture.desc())?;
                lock(&texture.inner.physical).insert(ctx_id, id);
                realized.textures.push(((*texture).clone(), id));
            }
            PendingOp::CreateVertexArray(array) => {
                let (vertices, indices) = array.reserved();
                let vbo = ctx.create_buffer(
                    BufferKind::Vertex,
                    BufferUsage::DynamicDraw,
                    vertices * VERTEX_STRIDE,
                )?;
                let ibo = match ctx.create_buffer(
                    BufferKind::Index,
                    BufferUsage::DynamicDraw,
                    indices * std::mem::size_of::<u32>(),
                ) {
                    Ok(ibo) => ibo,
                    Err(err) => {
                        let _ = ctx.delete_buffer(vbo);
                        return Err(err);
                    }
                };
                lock(&array.inner.physical).insert(ctx_id, (vbo, ibo));
                realized.vertex_arrays.push(((*array).clone(), (vbo, ibo)));
            }
            PendingOp::Upload(texture, bitmap) => {
                let id = texture.gl_id(ctx_id).ok_or_else(|| {
                    GlError::operation(
                        "upload",
                        format!("texture handle {} has no texture on {ctx_id}", texture.id()),
                    )
                })?;
                ctx.upload_texture(id, bitmap)?;
            }
            PendingOp::DeleteTexture(TextureTarget::Shared(texture)) => {
                let id = lock(&texture.inner.physical).remove(&ctx_id);
                if let Some(id) = id {
                    realized.textures.retain(|(_, t)| *t != id);
                    ctx.delete_texture(id)?;
                }
            }
            PendingOp::DeleteTexture(TextureTarget::Raw(id)) => {
                forget_raw_texture(live, ctx_id, *id);
                realized.textures.retain(|(_, t)| t != id);
                if ctx.is_texture(*id) {
                    ctx.delete_texture(*id)?;
                } else {
                    warn!(ctx = %ctx_id, id, "delete of unknown texture ignored");
                }
            }
            PendingOp::DeleteTextures(ids) => {
                for id in ids.get(&ctx_id).into_iter().flatten() {
                    if ctx.is_texture(*id) {
                        ctx.delete_texture(*id)?;
                    } else {
                        warn!(ctx = %ctx_id, id, "delete of unknown texture ignored");
                    }
                }
            }
            PendingOp::DeleteBuffers(ids) => {
                for id in ids.get(&ctx_id).into_iter().flatten() {
                    if ctx.is_buffer(*id) {
                        ctx.delete_buffer(*id)?;
                    } else {
                        warn!(ctx = %ctx_id, id, "delete of unknown buffer ignored");
                    }
                }
            }
        }
    }
    Ok(())
}

fn rollback(ctx: &mut dyn GlContext, realized: Realized) {
    let ctx_id = ctx.id();
    for (texture, id) in realized.textures {
        lock(&texture.inner.physical).remove(&ctx_id);
        if let Err(err) = ctx.delete_texture(id) {
            warn!(ctx = %ctx_id, id, "rollback delete failed: {err}");
        }
    }
    for (array, (vbo, ibo)) in realized.vertex_arrays {
        lock(&array.inner.physical).remove(&ctx_id);
        for id in [vbo, ibo] {
            if let Err(err) = ctx.delete_buffer(id) {
                warn!(ctx = %ctx_id, id, "rollback delete failed: {err}");
            }
        }
    }
}

/// Write `vertices` and `indices` into the vertex array's buffers on `ctx`.
pub fn write_vertex_array(
    ctx: &mut dyn GlContext,
    array: &SharedVertexArray,
    vertices: &[glmux_context::Vertex],
    indices: &[u32],
) -> GlResult<()> {
    let (vbo, ibo) = array.buffers(ctx.id()).ok_or_else(|| {
        GlError::operation(
            "write_vertex_array",
            format!("vertex array {} is not realised on {}", array.id(), ctx.id()),
        )
    })?;
    let (max_vertices, max_indices) = array.reserved();
    if vertices.len() > max_vertices || indices.len() > max_indices {
        return Err(GlError::operation(
            "write_vertex_array",
            format!(
                "{} vertices / {} indices exceed reservation {max_vertices} / {max_indices}",
                vertices.len(),
                indices.len()
            ),
        ));
    }
    ctx.write_buffer(vbo, 0, slice_as_bytes(vertices))?;
    ctx.write_buffer(ibo, 0, slice_as_bytes(indices))
}
