// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capacity-bounded vertex/index output and the primitive batching loop.
//!
//! A [`DrawList`] is split into [`DrawBatch`]es. Every index inside a batch is
//! relative to the batch's first vertex and must fit the index type, so one
//! batch addresses at most `MAX_INDEX + 1` vertices.
//!
//! [`render_primitives`] streams primitives from a [`PrimitiveRenderer`] into
//! the list. It reserves space in bulk rather than per primitive, and tracks
//! how much of the open reservation was left unused by culled primitives so
//! that slack can be reused or released.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{Point, Rect};
use peniko::Color;
use smallvec::SmallVec;

use crate::transform::Transform2d;

/// Minimum number of primitives worth extending the open batch for.
const EXTEND_THRESHOLD: usize = 64;

/// Index type of a draw list.
pub trait DrawIndex: Copy + core::fmt::Debug + PartialEq {
    /// Largest representable index.
    const MAX_INDEX: u32;

    /// Converts a batch-relative vertex number.
    fn from_vertex(v: usize) -> Self;

    /// Widens to `u32`.
    fn to_u32(self) -> u32;
}

impl DrawIndex for u16 {
    const MAX_INDEX: u32 = Self::MAX as u32;

    #[inline]
    fn from_vertex(v: usize) -> Self {
        debug_assert!(v <= usize::from(Self::MAX), "vertex {v} exceeds u16 index range");
        Self::try_from(v).unwrap_or(Self::MAX)
    }

    #[inline]
    fn to_u32(self) -> u32 {
        u32::from(self)
    }
}

impl DrawIndex for u32 {
    const MAX_INDEX: u32 = u32::MAX;

    #[inline]
    fn from_vertex(v: usize) -> Self {
        debug_assert!(Self::try_from(v).is_ok(), "vertex {v} exceeds u32 index range");
        Self::try_from(v).unwrap_or(Self::MAX)
    }

    #[inline]
    fn to_u32(self) -> u32 {
        self
    }
}

/// One output vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    /// Position in render space.
    pub pos: [f32; 2],
    /// Texture coordinate (the white-pixel uv for solid fills).
    pub uv: [f32; 2],
    /// Straight-alpha RGBA8 color.
    pub color: [u8; 4],
}

/// A contiguous run of vertices and indices addressed by one index range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawBatch {
    /// First vertex of the batch in [`DrawList::vertices`].
    pub vtx_offset: usize,
    /// First index of the batch in [`DrawList::indices`].
    pub idx_offset: usize,
    /// Number of vertices written.
    pub vtx_count: usize,
    /// Number of indices written.
    pub idx_count: usize,
}

/// Triangle output split into index-addressable batches.
///
/// Writers must [`reserve`](Self::reserve) before writing and
/// [`unreserve`](Self::unreserve) what they end up not using. Writing past the
/// reservation is a bug and trips a debug assertion.
#[derive(Clone, Debug)]
pub struct DrawList<I: DrawIndex> {
    vertices: Vec<Vertex>,
    indices: Vec<I>,
    batches: SmallVec<[DrawBatch; 4]>,
    max_index: u32,
    reserved_vtx: usize,
    reserved_idx: usize,
    white_uv: [f32; 2],
}

impl<I: DrawIndex> Default for DrawList<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: DrawIndex> DrawList<I> {
    /// Creates an empty list addressing the full index range.
    pub fn new() -> Self {
        let mut batches = SmallVec::new();
        batches.push(DrawBatch::default());
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            batches,
            max_index: I::MAX_INDEX,
            reserved_vtx: 0,
            reserved_idx: 0,
            white_uv: [0.0, 0.0],
        }
    }

    /// Lowers the largest index a batch may use.
    ///
    /// Values above the index type's range are clamped to it.
    pub fn with_max_index(mut self, max_index: u32) -> Self {
        self.max_index = max_index.min(I::MAX_INDEX);
        self
    }

    /// Sets the uv written with solid fills.
    pub fn with_white_uv(mut self, uv: [f32; 2]) -> Self {
        self.white_uv = uv;
        self
    }

    /// Largest index a batch may use.
    pub fn max_index(&self) -> u32 {
        self.max_index
    }

    /// The uv to write with solid fills.
    pub fn white_uv(&self) -> [f32; 2] {
        self.white_uv
    }

    /// Vertices written to the open batch so far; the next vertex gets this
    /// index.
    pub fn vertex_cursor(&self) -> usize {
        self.current().vtx_count
    }

    /// Reserved vertices not yet written.
    pub fn reserved_vertices(&self) -> usize {
        self.reserved_vtx
    }

    /// Reserved indices not yet written.
    pub fn reserved_indices(&self) -> usize {
        self.reserved_idx
    }

    /// Reserves room for `idx_count` indices and `vtx_count` vertices.
    ///
    /// If the vertices do not fit the open batch's index range, a new batch is
    /// opened first.
    pub fn reserve(&mut self, idx_count: usize, vtx_count: usize) {
        if vtx_count > 0 && self.vertex_cursor() + vtx_count - 1 > self.max_index as usize {
            debug_assert!(
                self.reserved_vtx == 0,
                "opening a batch with {} vertices still reserved",
                self.reserved_vtx
            );
            self.begin_batch();
        }
        self.reserved_idx += idx_count;
        self.reserved_vtx += vtx_count;
        self.vertices.reserve(vtx_count);
        self.indices.reserve(idx_count);
    }

    /// Returns unused reservation.
    pub fn unreserve(&mut self, idx_count: usize, vtx_count: usize) {
        debug_assert!(
            idx_count <= self.reserved_idx && vtx_count <= self.reserved_vtx,
            "unreserving {idx_count}/{vtx_count} with only {}/{} reserved",
            self.reserved_idx,
            self.reserved_vtx
        );
        self.reserved_idx = self.reserved_idx.saturating_sub(idx_count);
        self.reserved_vtx = self.reserved_vtx.saturating_sub(vtx_count);
    }

    /// Closes the open batch and starts a new one.
    ///
    /// Does nothing while the open batch is still empty.
    pub fn begin_batch(&mut self) {
        let cur = *self.current();
        if cur.vtx_count == 0 && cur.idx_count == 0 {
            return;
        }
        log::trace!(
            "closing batch {} with {} vertices",
            self.batches.len() - 1,
            cur.vtx_count
        );
        self.batches.push(DrawBatch {
            vtx_offset: self.vertices.len(),
            idx_offset: self.indices.len(),
            vtx_count: 0,
            idx_count: 0,
        });
    }

    /// Writes one reserved vertex.
    #[inline]
    pub fn write_vertex(&mut self, pos: Point, uv: [f32; 2], color: [u8; 4]) {
        debug_assert!(self.reserved_vtx > 0, "vertex written without reservation");
        self.reserved_vtx = self.reserved_vtx.saturating_sub(1);
        #[allow(clippy::cast_possible_truncation, reason = "render space fits f32")]
        let pos = [pos.x as f32, pos.y as f32];
        self.vertices.push(Vertex { pos, uv, color });
        self.current_mut().vtx_count += 1;
    }

    /// Writes one reserved index, relative to the open batch.
    #[inline]
    pub fn write_index(&mut self, index: I) {
        debug_assert!(self.reserved_idx > 0, "index written without reservation");
        debug_assert!(index.to_u32() <= self.max_index, "index {index:?} out of range");
        self.reserved_idx = self.reserved_idx.saturating_sub(1);
        self.indices.push(index);
        self.current_mut().idx_count += 1;
    }

    /// Fills the axis-aligned rectangle spanned by `a` and `c` (render space).
    ///
    /// Fully transparent colors draw nothing.
    pub fn add_rect_filled(&mut self, a: Point, c: Point, color: Color) {
        let color = pack_color(color);
        if color[3] == 0 {
            return;
        }
        let uv = self.white_uv;
        self.reserve(6, 4);
        let base = self.vertex_cursor();
        self.write_vertex(a, uv, color);
        self.write_vertex(Point::new(c.x, a.y), uv, color);
        self.write_vertex(c, uv, color);
        self.write_vertex(Point::new(a.x, c.y), uv, color);
        for k in [0, 1, 2, 0, 2, 3] {
            self.write_index(I::from_vertex(base + k));
        }
    }

    /// All written vertices.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All written indices, batch-relative.
    pub fn indices(&self) -> &[I] {
        &self.indices
    }

    /// Batches that contain at least one vertex.
    pub fn batches(&self) -> impl Iterator<Item = &DrawBatch> {
        self.batches.iter().filter(|b| b.vtx_count > 0)
    }

    /// Vertices of one batch.
    pub fn batch_vertices(&self, batch: &DrawBatch) -> &[Vertex] {
        &self.vertices[batch.vtx_offset..batch.vtx_offset + batch.vtx_count]
    }

    /// Indices of one batch.
    pub fn batch_indices(&self, batch: &DrawBatch) -> &[I] {
        &self.indices[batch.idx_offset..batch.idx_offset + batch.idx_count]
    }

    /// Drops all geometry; keeps allocations and settings.
    pub fn clear(&mut self) {
        debug_assert!(
            self.reserved_vtx == 0 && self.reserved_idx == 0,
            "clearing a list with outstanding reservations"
        );
        self.vertices.clear();
        self.indices.clear();
        self.batches.clear();
        self.batches.push(DrawBatch::default());
        self.reserved_vtx = 0;
        self.reserved_idx = 0;
    }

    fn current(&self) -> &DrawBatch {
        // The batch list is never empty.
        &self.batches[self.batches.len() - 1]
    }

    fn current_mut(&mut self) -> &mut DrawBatch {
        let last = self.batches.len() - 1;
        &mut self.batches[last]
    }
}

/// Packs a color into straight-alpha RGBA8.
pub fn pack_color(color: Color) -> [u8; 4] {
    let c = color.to_rgba8();
    [c.r, c.g, c.b, c.a]
}

/// A solid axis-aligned rectangle in data space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectPrimitive {
    /// Corner at the smaller data coordinates.
    pub min: Point,
    /// Corner at the larger data coordinates.
    pub max: Point,
    /// Fill color.
    pub color: Color,
}

/// Random-access source of rectangle primitives.
pub trait RectSource {
    /// Number of primitives.
    fn count(&self) -> usize;

    /// Builds primitive `i`; `i < count()`.
    fn rect(&self, i: usize) -> RectPrimitive;
}

/// Writes single primitives into a [`DrawList`] whose space is already
/// reserved.
pub trait PrimitiveRenderer {
    /// Vertices written per drawn primitive.
    const VTX_CONSUMED: usize;
    /// Indices written per drawn primitive.
    const IDX_CONSUMED: usize;

    /// Number of primitives.
    fn count(&self) -> usize;

    /// Draws primitive `prim`; returns `false` if it was culled and nothing
    /// was written.
    fn render<I: DrawIndex>(
        &self,
        list: &mut DrawList<I>,
        clip: Rect,
        uv: [f32; 2],
        prim: usize,
    ) -> bool;
}

/// Draws [`RectSource`] primitives as two triangles each.
#[derive(Debug)]
pub struct RectRenderer<'a, S, T> {
    source: &'a S,
    transform: &'a T,
}

impl<'a, S: RectSource, T: Transform2d> RectRenderer<'a, S, T> {
    /// Draws `source` through `transform`.
    pub fn new(source: &'a S, transform: &'a T) -> Self {
        Self { source, transform }
    }
}

impl<S: RectSource, T: Transform2d> PrimitiveRenderer for RectRenderer<'_, S, T> {
    const VTX_CONSUMED: usize = 4;
    const IDX_CONSUMED: usize = 6;

    fn count(&self) -> usize {
        self.source.count()
    }

    #[inline]
    fn render<I: DrawIndex>(
        &self,
        list: &mut DrawList<I>,
        clip: Rect,
        uv: [f32; 2],
        prim: usize,
    ) -> bool {
        let rect = self.source.rect(prim);
        let p1 = self.transform.map(rect.min);
        let p3 = self.transform.map(rect.max);
        let color = pack_color(rect.color);
        if color[3] == 0 || !overlaps(clip, Rect::from_points(p1, p3)) {
            return false;
        }

        let base = list.vertex_cursor();
        list.write_vertex(p1, uv, color);
        list.write_vertex(Point::new(p1.x, p3.y), uv, color);
        list.write_vertex(p3, uv, color);
        list.write_vertex(Point::new(p3.x, p1.y), uv, color);
        // (P1, P2, P4) then (P2, P3, P4).
        for k in [0, 1, 3, 1, 2, 3] {
            list.write_index(I::from_vertex(base + k));
        }
        true
    }
}

/// Strict overlap; rectangles that only touch do not overlap.
fn overlaps(a: Rect, b: Rect) -> bool {
    b.y0 < a.y1 && b.y1 > a.y0 && b.x0 < a.x1 && b.x1 > a.x0
}

/// Counters reported by [`render_primitives`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Primitives written.
    pub drawn: usize,
    /// Primitives skipped as invisible.
    pub culled: usize,
    /// Calls to [`DrawList::reserve`].
    pub reservations: usize,
}

impl core::ops::AddAssign for RenderStats {
    fn add_assign(&mut self, rhs: Self) {
        self.drawn += rhs.drawn;
        self.culled += rhs.culled;
        self.reservations += rhs.reservations;
    }
}

/// Streams every primitive of `renderer` into `list`, culling against `clip`.
///
/// Space is reserved for a run of primitives at a time. Culled primitives
/// leave their share of the reservation unused; that slack is consumed by
/// the next run if it can stay in the open batch, and released otherwise.
/// On return no reservation is outstanding.
pub fn render_primitives<R: PrimitiveRenderer, I: DrawIndex>(
    renderer: &R,
    list: &mut DrawList<I>,
    clip: Rect,
) -> RenderStats {
    let vtx = R::VTX_CONSUMED;
    let idx_per = R::IDX_CONSUMED;
    let max_index = list.max_index() as usize;
    let uv = list.white_uv();

    let mut stats = RenderStats::default();
    let mut remaining = renderer.count();
    let mut culled = 0_usize;
    let mut prim = 0_usize;

    while remaining > 0 {
        let capacity = max_index.saturating_sub(list.vertex_cursor()) / vtx;
        let mut cnt = remaining.min(capacity);
        if cnt >= remaining.min(EXTEND_THRESHOLD) {
            if culled >= cnt {
                log::trace!("reusing slack of {culled} culled primitives for {cnt}");
                culled -= cnt;
            } else {
                let extra = cnt - culled;
                log::trace!("extending open batch by {extra} primitives");
                list.reserve(extra * idx_per, extra * vtx);
                stats.reservations += 1;
                culled = 0;
            }
        } else {
            if culled > 0 {
                list.unreserve(culled * idx_per, culled * vtx);
                culled = 0;
            }
            list.begin_batch();
            cnt = remaining.min(max_index / vtx);
            log::trace!("new batch for {cnt} primitives");
            list.reserve(cnt * idx_per, cnt * vtx);
            stats.reservations += 1;
        }
        if cnt == 0 {
            // An index range too small for a single primitive.
            log::warn!("draw list cannot address {vtx} vertices; dropping {remaining} primitives");
            break;
        }
        remaining -= cnt;
        for p in prim..prim + cnt {
            if renderer.render(list, clip, uv, p) {
                stats.drawn += 1;
            } else {
                culled += 1;
                stats.culled += 1;
            }
        }
        prim += cnt;
    }
    if culled > 0 {
        list.unreserve(culled * idx_per, culled * vtx);
    }
    debug_assert_eq!(list.reserved_vertices(), 0, "reservation left outstanding");
    stats
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use peniko::color::palette::css;

    use super::*;
    use crate::transform::Viewport;

    /// A row of unit squares along x; the colors come from `colors`, cycled.
    struct Strip {
        n: usize,
        colors: Vec<Color>,
    }

    impl RectSource for Strip {
        fn count(&self) -> usize {
            self.n
        }

        fn rect(&self, i: usize) -> RectPrimitive {
            let x = i as f64;
            RectPrimitive {
                min: Point::new(x, 0.0),
                max: Point::new(x + 1.0, 1.0),
                color: self.colors[i % self.colors.len()],
            }
        }
    }

    fn identity_viewport(w: f64) -> Viewport {
        // Data (x, y) lands on (x, 1 - y) over a w x 1 rect.
        Viewport::new(Rect::new(0.0, 0.0, w, 1.0), (0.0, w), (0.0, 1.0))
    }

    fn render_strip<I: DrawIndex>(strip: &Strip, list: &mut DrawList<I>) -> RenderStats {
        let vp = identity_viewport(strip.n as f64);
        let t = vp.transform();
        render_primitives(&RectRenderer::new(strip, &t), list, vp.rect)
    }

    #[test]
    fn rect_vertex_and_triangle_order() {
        let strip = Strip {
            n: 1,
            colors: vec![css::RED],
        };
        let mut list = DrawList::<u16>::new();
        let stats = render_strip(&strip, &mut list);
        assert_eq!(stats.drawn, 1);

        let pos: Vec<_> = list.vertices().iter().map(|v| v.pos).collect();
        // P1 = min, P2 = (min.x, max.y), P3 = max, P4 = (max.x, min.y), in
        // render space (data y is flipped).
        assert_eq!(pos, vec![[0.0, 1.0], [0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        assert_eq!(list.indices(), &[0, 1, 3, 1, 2, 3]);
        assert_eq!(list.vertices()[0].color, [255, 0, 0, 255]);
    }

    #[test]
    fn solid_fills_use_the_white_uv() {
        let strip = Strip {
            n: 2,
            colors: vec![css::RED],
        };
        let mut list = DrawList::<u16>::new();
        render_strip(&strip, &mut list);
        assert!(list.vertices().iter().all(|v| v.uv == [0.0, 0.0]));

        let mut list = DrawList::<u16>::new().with_white_uv([0.5, 0.25]);
        assert_eq!(list.white_uv(), [0.5, 0.25]);
        render_strip(&strip, &mut list);
        assert_eq!(list.vertices().len(), 8);
        assert!(list.vertices().iter().all(|v| v.uv == [0.5, 0.25]));
    }

    #[test]
    fn small_index_range_splits_batches() {
        let strip = Strip {
            n: 25,
            colors: vec![css::BLUE],
        };
        // 40 / 4 = 10 primitives per batch.
        let mut list = DrawList::<u16>::new().with_max_index(40);
        let stats = render_strip(&strip, &mut list);
        assert_eq!(stats.drawn, 25);

        let sizes: Vec<_> = list.batches().map(|b| b.vtx_count).collect();
        assert_eq!(sizes, vec![40, 40, 20]);
        for b in list.batches() {
            let max = list.batch_indices(b).iter().copied().max();
            assert!(max.is_some_and(|m| u32::from(m) <= 40), "{b:?}");
        }
        assert_eq!(list.reserved_vertices(), 0);
        assert_eq!(list.reserved_indices(), 0);
    }

    #[test]
    fn culled_primitives_release_their_reservation() {
        let strip = Strip {
            n: 10,
            colors: vec![css::GREEN, css::TRANSPARENT],
        };
        let mut list = DrawList::<u32>::new();
        let stats = render_strip(&strip, &mut list);
        assert_eq!((stats.drawn, stats.culled), (5, 5));
        assert_eq!(stats.reservations, 1);
        assert_eq!(list.vertices().len(), 20);
        assert_eq!(list.indices().len(), 30);
        assert_eq!(list.reserved_vertices(), 0);
    }

    #[test]
    fn off_screen_primitives_are_culled() {
        let strip = Strip {
            n: 4,
            colors: vec![css::GREEN],
        };
        let vp = identity_viewport(4.0);
        let t = vp.transform();
        // Clip to the left half; cells touching its edge do not count.
        let clip = Rect::new(0.0, 0.0, 2.0, 1.0);
        let mut list = DrawList::<u16>::new();
        let stats = render_primitives(&RectRenderer::new(&strip, &t), &mut list, clip);
        assert_eq!((stats.drawn, stats.culled), (2, 2));
    }

    #[test]
    fn slack_from_culling_is_reused_across_runs() {
        // 150 primitives, the first 120 invisible. 400 / 4 = 100 per batch.
        struct Sparse;
        impl RectSource for Sparse {
            fn count(&self) -> usize {
                150
            }
            fn rect(&self, i: usize) -> RectPrimitive {
                let x = i as f64;
                RectPrimitive {
                    min: Point::new(x, 0.0),
                    max: Point::new(x + 1.0, 1.0),
                    color: if i < 120 { css::TRANSPARENT } else { css::WHITE },
                }
            }
        }
        let vp = identity_viewport(150.0);
        let t = vp.transform();
        let mut list = DrawList::<u16>::new().with_max_index(400);
        let stats = render_primitives(&RectRenderer::new(&Sparse, &t), &mut list, vp.rect);
        assert_eq!((stats.drawn, stats.culled), (30, 120));
        // The first run of 100 is reserved once and entirely culled; the
        // remaining 50 fit in that slack without another reservation.
        assert_eq!(stats.reservations, 1);
        assert_eq!(list.batches().count(), 1);
        assert_eq!(list.vertices().len(), 120);
        assert_eq!(list.reserved_vertices(), 0);
    }

    #[test]
    fn add_rect_filled_skips_transparent() {
        let mut list = DrawList::<u16>::new();
        list.add_rect_filled(Point::ZERO, Point::new(2.0, 2.0), css::TRANSPARENT);
        assert!(list.vertices().is_empty());
        list.add_rect_filled(Point::ZERO, Point::new(2.0, 2.0), css::WHITE);
        assert_eq!(list.vertices().len(), 4);
        assert_eq!(list.indices(), &[0, 1, 2, 0, 2, 3]);
        list.clear();
        assert_eq!(list.batches().count(), 0);
    }
}
