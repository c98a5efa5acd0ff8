//! Presentation strategies
//!
//! Chooses how an item is drawn. Everything here is a pure function of
//! `(PresentableItem, DisplayMode)`: the active mode is passed in explicitly and the
//! produced content fully overwrites whatever a recycled element carried before.

use crate::{ClusterError, PresentableItem, Result, VisualElement, utils};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How cluster visuals are drawn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DisplayMode {
    /// Colored badge with the member count
    #[default]
    Count,
    /// Image with the member count drawn over it
    ImageCount,
    /// Image only
    Image,
}

impl DisplayMode {
    pub fn all() -> &'static [Self] {
        &[Self::Count, Self::ImageCount, Self::Image]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::ImageCount => "Image + count",
            Self::Image => "Image",
        }
    }

    /// Position in a segmented selector
    pub fn index(&self) -> usize {
        match self {
            Self::Count => 0,
            Self::ImageCount => 1,
            Self::Image => 2,
        }
    }

    /// Mode for a segmented selector index
    pub fn from_index(index: usize) -> Result<Self> {
        Self::all()
            .get(index)
            .copied()
            .ok_or(ClusterError::InvalidDisplayMode(index))
    }
}

impl TryFrom<usize> for DisplayMode {
    type Error = ClusterError;

    fn try_from(index: usize) -> Result<Self> {
        Self::from_index(index)
    }
}

/// Key of a pool of interchangeable visuals
///
/// Elements are only ever recycled within the same class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReuseClass {
    /// Plain point marker, used for every singleton regardless of mode
    Pin,
    Cluster(DisplayMode),
}

impl ReuseClass {
    pub fn is_cluster(&self) -> bool {
        matches!(self, ReuseClass::Cluster(_))
    }
}

/// Named artwork; the host maps these to actual textures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ImageRef {
    Marker,
    MarkerAlt,
}

/// Named colors; the host maps these to its theme
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Tint {
    Accent,
    White,
}

/// Everything a host needs to draw one visual
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VisualContent {
    /// Human-readable member count
    pub count_label: Option<String>,
    pub label_background: Option<Tint>,
    pub label_text: Option<Tint>,
    pub image: Option<ImageRef>,
    /// Marker color for plain pins
    pub pin_tint: Option<Tint>,
}

/// Reuse class for an item under the given mode
pub fn reuse_class(item: &PresentableItem, mode: DisplayMode) -> ReuseClass {
    match item {
        PresentableItem::Singleton(_) => ReuseClass::Pin,
        PresentableItem::Cluster(_) => ReuseClass::Cluster(mode),
    }
}

/// Visual content for an item under the given mode
pub fn content_for(item: &PresentableItem, mode: DisplayMode) -> VisualContent {
    let cluster = match item {
        PresentableItem::Singleton(_) => {
            return VisualContent {
                pin_tint: Some(Tint::Accent),
                ..Default::default()
            };
        }
        PresentableItem::Cluster(cluster) => cluster,
    };

    let count_label = Some(utils::format_count(cluster.len()));
    match mode {
        DisplayMode::Count => VisualContent {
            count_label,
            label_background: Some(Tint::Accent),
            label_text: Some(Tint::White),
            ..Default::default()
        },
        DisplayMode::ImageCount => VisualContent {
            count_label,
            label_text: Some(Tint::Accent),
            image: Some(ImageRef::MarkerAlt),
            ..Default::default()
        },
        DisplayMode::Image => VisualContent {
            image: Some(ImageRef::Marker),
            ..Default::default()
        },
    }
}

/// Overwrite a recycled element so it draws `item`
///
/// The element must come from the pool of [`reuse_class`]`(&item, mode)`.
pub fn populate(element: &mut VisualElement, item: PresentableItem, mode: DisplayMode) {
    debug_assert_eq!(element.reuse_class(), reuse_class(&item, mode));
    element.content = content_for(&item, mode);
    element.coordinate = item.coordinate();
    element.item = Some(item);
}
