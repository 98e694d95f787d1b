//! Triangle rasterization at pixel centres.

use glmux_core::{IntPoint, IntRect};

use crate::context::Vertex;

fn transform_point(m: &[f32; 16], p: [f32; 3]) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (row, o) in out.iter_mut().enumerate() {
        *o = m[row] * p[0] + m[4 + row] * p[1] + m[8 + row] * p[2] + m[12 + row];
    }
    out
}

/// Window coordinate of a vertex after `transform` and the viewport mapping.
fn to_window(transform: &[f32; 16], viewport: IntRect, v: &Vertex) -> [f32; 2] {
    let clip = transform_point(transform, v.pos);
    let w = if clip[3] == 0.0 { 1.0 } else { clip[3] };
    let ndc = [clip[0] / w, clip[1] / w];
    [
        (ndc[0] + 1.0) * 0.5 * viewport.width() as f32 + viewport.tl.x as f32,
        (ndc[1] + 1.0) * 0.5 * viewport.height() as f32 + viewport.tl.y as f32,
    ]
}

/// Barycentric slack so centres on a shared edge are not lost to rounding.
const EDGE_TOLERANCE: f32 = 1e-5;

fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

/// Call `shade(x, y, frag_coord, tex_coord)` for every pixel whose centre
/// lies inside one of the indexed triangles, the viewport and the target.
pub(crate) fn rasterize(
    vertices: &[Vertex],
    indices: &[u32],
    transform: &[f32; 16],
    viewport: IntRect,
    target: IntPoint,
    mut shade: impl FnMut(i32, i32, [f32; 2], [f32; 2]),
) {
    let clip = IntRect::from_coords(
        viewport.tl.x.max(0),
        viewport.tl.y.max(0),
        viewport.br.x.min(target.x),
        viewport.br.y.min(target.y),
    );
    if clip.is_empty() {
        return;
    }

    for tri in indices.chunks_exact(3) {
        let Some(v) = tri
            .iter()
            .map(|&i| vertices.get(i as usize))
            .collect::<Option<Vec<_>>>()
        else {
            continue;
        };
        let p: Vec<[f32; 2]> = v.iter().map(|v| to_window(transform, viewport, v)).collect();
        let area = edge(p[0], p[1], p[2]);
        if area == 0.0 {
            continue;
        }

        let min_x = p.iter().map(|q| q[0]).fold(f32::INFINITY, f32::min);
        let max_x = p.iter().map(|q| q[0]).fold(f32::NEG_INFINITY, f32::max);
        let min_y = p.iter().map(|q| q[1]).fold(f32::INFINITY, f32::min);
        let max_y = p.iter().map(|q| q[1]).fold(f32::NEG_INFINITY, f32::max);
        let x0 = (min_x.floor() as i32).max(clip.tl.x);
        let x1 = (max_x.ceil() as i32).min(clip.br.x);
        let y0 = (min_y.floor() as i32).max(clip.tl.y);
        let y1 = (max_y.ceil() as i32).min(clip.br.y);

        for y in y0..y1 {
            for x in x0..x1 {
                let c = [x as f32 + 0.5, y as f32 + 0.5];
                let w0 = edge(p[1], p[2], c) / area;
                let w1 = edge(p[2], p[0], c) / area;
                let w2 = edge(p[0], p[1], c) / area;
                if w0 < -EDGE_TOLERANCE || w1 < -EDGE_TOLERANCE || w2 < -EDGE_TOLERANCE {
                    continue;
                }
                let uv = [
                    w0 * v[0].tex_coord[0] + w1 * v[1].tex_coord[0] + w2 * v[2].tex_coord[0],
                    w0 * v[0].tex_coord[1] + w1 * v[1].tex_coord[1] + w2 * v[2].tex_coord[1],
                ];
                shade(x, y, c, uv);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{IDENTITY, QUAD_INDICES};

    fn full_screen_quad() -> Vec<Vertex> {
        vec![
            Vertex { pos: [-1.0, -1.0, 0.0], tex_coord: [0.0, 0.0] },
            Vertex { pos: [1.0, -1.0, 0.0], tex_coord: [1.0, 0.0] },
            Vertex { pos: [1.0, 1.0, 0.0], tex_coord: [1.0, 1.0] },
            Vertex { pos: [-1.0, 1.0, 0.0], tex_coord: [0.0, 1.0] },
        ]
    }

    #[test]
    fn quad_covers_every_pixel_of_the_viewport() {
        let mut hits = vec![0u32; 16];
        rasterize(
            &full_screen_quad(),
            &QUAD_INDICES,
            &IDENTITY,
            IntRect::from_size(IntPoint::new(4, 4)),
            IntPoint::new(4, 4),
            |x, y, _, uv| {
                hits[(y * 4 + x) as usize] += 1;
                assert!((uv[0] - (x as f32 + 0.5) / 4.0).abs() < 1e-5);
                assert!((uv[1] - (y as f32 + 0.5) / 4.0).abs() < 1e-5);
            },
        );
        assert!(hits.iter().all(|&h| h >= 1));
    }

    #[test]
    fn drawing_is_clipped_to_the_target() {
        let mut count = 0;
        rasterize(
            &full_screen_quad(),
            &QUAD_INDICES,
            &IDENTITY,
            IntRect::from_size(IntPoint::new(8, 8)),
            IntPoint::new(3, 2),
            |x, y, _, _| {
                assert!(x < 3 && y < 2);
                count += 1;
            },
        );
        assert!(count >= 6);
    }
}
