//! Per-frame render list and its buckets
//!
//! The render list collects pending drawable items for one frame,
//! partitioned by blend requirement. Both buckets are cleared (length
//! reset, capacity retained) at the start of every frame, so steady-state
//! frames allocate nothing. Single writer per frame, rendering thread only.

use crate::collision::Frustum;
use crate::render::culler;
use crate::render::item::RenderItem;

/// Blend partition of pending draw items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Items drawn without blending; always processed first
    Opaque,
    /// Alpha-blended items; processed after all opaque items
    Transparent,
}

impl Bucket {
    /// Fixed processing order: Opaque strictly before Transparent
    pub const PROCESSING_ORDER: [Self; 2] = [Self::Opaque, Self::Transparent];
}

/// Append-only item sequence plus its per-frame culled subset
#[derive(Debug, Default)]
pub struct RenderBucket {
    items: Vec<RenderItem>,
    visible: Vec<RenderItem>,
}

impl RenderBucket {
    /// Append an item for this frame
    pub fn push(&mut self, item: RenderItem) {
        self.items.push(item);
    }

    /// Items appended this frame, in append order
    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    /// Items that survived culling this frame
    pub fn visible(&self) -> &[RenderItem] {
        &self.visible
    }

    /// Number of pending items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no items were appended this frame
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reset both sequences for a new frame, retaining capacity
    pub fn clear(&mut self) {
        self.items.clear();
        self.visible.clear();
    }

    /// Run the conservative frustum filter into the visible sequence
    pub(crate) fn cull(&mut self, frustum: Option<&Frustum>) {
        self.visible.clear();
        match frustum {
            Some(frustum) => culler::cull(&self.items, frustum, &mut self.visible),
            // Culling disabled: pass everything through unchanged.
            None => self.visible.extend_from_slice(&self.items),
        }
    }

    /// Mutable access to the visible sequence, for sorting after culling
    pub(crate) fn visible_mut(&mut self) -> &mut Vec<RenderItem> {
        &mut self.visible
    }
}

/// Exactly two buckets of pending drawable items for one frame
#[derive(Debug, Default)]
pub struct RenderList {
    opaque: RenderBucket,
    transparent: RenderBucket,
}

impl RenderList {
    /// Create an empty render list
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty both buckets; must run exactly once at the start of each frame
    /// before any collaborator appends items
    pub fn clear(&mut self) {
        self.opaque.clear();
        self.transparent.clear();
    }

    /// Append an item to a bucket
    ///
    /// Classification into Opaque or Transparent is the collaborator's call
    /// at append time; the list does not inspect the material.
    pub fn push(&mut self, bucket: Bucket, item: RenderItem) {
        self.bucket_mut(bucket).push(item);
    }

    /// Shared access to a bucket
    pub fn bucket(&self, bucket: Bucket) -> &RenderBucket {
        match bucket {
            Bucket::Opaque => &self.opaque,
            Bucket::Transparent => &self.transparent,
        }
    }

    /// Mutable access to a bucket
    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut RenderBucket {
        match bucket {
            Bucket::Opaque => &mut self.opaque,
            Bucket::Transparent => &mut self.transparent,
        }
    }

    /// Total number of pending items across both buckets
    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    /// True when both buckets are empty
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty()
    }
}
