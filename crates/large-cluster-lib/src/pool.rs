//! Recycling pool for on-screen visuals
//!
//! Visuals are kept in one free list per [`ReuseClass`]. Since an element records the
//! class it was built for, releasing always files it back under that class and it can
//! never resurface as a visual of another kind.

use crate::{Coordinate, PresentableItem, ReuseClass, VisualContent};
use std::collections::HashMap;
use std::fmt;

/// Identity of a visual element for its whole lifetime, across recycling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "visual-{}", self.0)
    }
}

/// A recyclable visual
///
/// Content is not cleared on release; whoever reacquires the element overwrites it.
///
/// Each element is unique: it cannot be cloned, so an id lives in exactly one place,
/// either on screen, in the pool, or with the caller of
/// [`Coordinator::provide_visual`](crate::Coordinator::provide_visual).
///
/// ```compile_fail
/// use large_cluster_lib::*;
/// let mut pool = VisualPool::new();
/// let element = pool.acquire(ReuseClass::Pin);
/// let copy = element.clone();
/// ```
#[derive(Debug)]
pub struct VisualElement {
    id: ElementId,
    reuse_class: ReuseClass,
    pub(crate) content: VisualContent,
    pub(crate) coordinate: Coordinate,
    pub(crate) opacity: f32,
    pub(crate) item: Option<PresentableItem>,
}

impl VisualElement {
    pub(crate) fn new(id: ElementId, reuse_class: ReuseClass) -> Self {
        Self {
            id,
            reuse_class,
            content: VisualContent::default(),
            coordinate: Coordinate::default(),
            opacity: 1.0,
            item: None,
        }
    }

    #[inline]
    pub fn id(&self) -> ElementId {
        self.id
    }

    #[inline]
    pub fn reuse_class(&self) -> ReuseClass {
        self.reuse_class
    }

    #[inline]
    pub fn content(&self) -> &VisualContent {
        &self.content
    }

    /// Where the element is anchored on the map
    #[inline]
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Opacity the element rests at once any running animation finishes
    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Item currently bound to the element
    #[inline]
    pub fn item(&self) -> Option<&PresentableItem> {
        self.item.as_ref()
    }

    /// Detach the bound item, leaving the element without one
    pub fn take_item(&mut self) -> Option<PresentableItem> {
        self.item.take()
    }
}

/// Pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Elements constructed since the pool was created
    pub created: usize,
    /// Acquisitions served from a free list
    pub reused: usize,
    /// Elements currently waiting in free lists
    pub free: usize,
}

/// Free lists of visuals keyed by reuse class
#[derive(Debug, Default)]
pub struct VisualPool {
    free: HashMap<ReuseClass, Vec<VisualElement>>,
    next_id: u64,
    created: usize,
    reused: usize,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl VisualPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a free element of `class`, constructing one if the free list is empty
    pub fn acquire(&mut self, class: ReuseClass) -> VisualElement {
        if let Some(element) = self.free.get_mut(&class).and_then(Vec::pop) {
            self.reused += 1;
            return element;
        }

        self.next_id += 1;
        self.created += 1;
        let element = VisualElement::new(ElementId(self.next_id), class);
        tracing::trace!("Constructed {} for {:?}", element.id(), class);
        element
    }

    /// Return an element to the free list of its own class
    pub fn release(&mut self, element: VisualElement) {
        self.free
            .entry(element.reuse_class)
            .or_default()
            .push(element);
    }

    /// Number of free elements waiting under `class`
    pub fn free_count(&self, class: ReuseClass) -> usize {
        self.free.get(&class).map_or(0, Vec::len)
    }

    /// Drop every free element, returning how many were destroyed
    ///
    /// Elements that are currently acquired are owned by their holder and unaffected.
    pub fn evict_free(&mut self) -> usize {
        let evicted = self.free.values().map(Vec::len).sum();
        self.free.clear();
        if evicted > 0 {
            tracing::debug!("Evicted {} free visuals", evicted);
        }
        evicted
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created,
            reused: self.reused,
            free: self.free.values().map(Vec::len).sum(),
        }
    }
}
