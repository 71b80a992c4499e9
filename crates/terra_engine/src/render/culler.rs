//! Frustum culler for pending render items
//!
//! Filters drawable items against the camera's view frustum before
//! submission. The test is deliberately conservative: an item whose bounds
//! graze a frustum corner may slip through (a wasted draw), but an item
//! that is actually visible is never dropped.

use crate::collision::Frustum;
use crate::render::item::RenderItem;

/// Filter `items` against `frustum` into `visible`
///
/// An item passes when its world-space bounds intersect or lie inside all
/// six half-spaces. Output order is input order: this is a stable filter,
/// not a reorder — sorting for state batching happens later.
pub fn cull(items: &[RenderItem], frustum: &Frustum, visible: &mut Vec<RenderItem>) {
    visible.extend(
        items
            .iter()
            .filter(|item| frustum.intersects_aabb(&item.bounds))
            .copied(),
    );
}
