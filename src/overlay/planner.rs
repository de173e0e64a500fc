//! Overlay planning
//!
//! Pure functions deciding the single visual decoration each occupied range
//! carries. Deterministic and side-effect-free, so a full plan can be applied
//! repeatedly without changing the outcome.

use std::collections::BTreeMap;

use crate::annotations::{AnnotationIndex, HighlightColor, RangeKey};
use crate::surface::{DecorationKind, DecorationStyle};

/// Underline color for note markers
const NOTE_UNDERLINE_COLOR: &str = "#1e88e5";
/// Underline color for discussion markers
const DISCUSSION_UNDERLINE_COLOR: &str = "#8e24aa";

/// The single visual treatment assigned to a range.
///
/// One tagged variant per outcome rather than independent flags: the priority
/// rule is a total order over variants, so adding an annotation kind later
/// means adding a variant, not special-casing combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    /// Colored fill; wins over every marker at the same range
    Highlighted { color: HighlightColor },
    /// Solid underline marking a note
    NoteUnderline,
    /// Dashed underline marking one or more discussion threads
    DiscussionUnderline,
    /// Range carries no decoration at all
    None,
}

impl Decoration {
    /// The surface primitive and style this decoration renders as, or `None`
    /// for [`Decoration::None`].
    pub fn paint(&self) -> Option<(DecorationKind, DecorationStyle)> {
        match self {
            Decoration::Highlighted { color } => {
                Some((DecorationKind::Fill, DecorationStyle::fill(color.css())))
            }
            Decoration::NoteUnderline => Some((
                DecorationKind::Underline,
                DecorationStyle::underline(NOTE_UNDERLINE_COLOR, false),
            )),
            Decoration::DiscussionUnderline => Some((
                DecorationKind::Underline,
                DecorationStyle::underline(DISCUSSION_UNDERLINE_COLOR, true),
            )),
            Decoration::None => None,
        }
    }
}

/// Decide the decoration for one range.
///
/// Fixed priority: a highlight suppresses the note and discussion markers at
/// its range (they stay in the index and the context menu, just not in the
/// overlay); a note suppresses discussion markers; discussions mark the range
/// only when nothing else does.
pub fn plan(index: &AnnotationIndex, range: &RangeKey) -> Decoration {
    if let Some(highlight) = index.highlight(range) {
        return Decoration::Highlighted {
            color: highlight.color,
        };
    }
    if index.note(range).is_some() {
        return Decoration::NoteUnderline;
    }
    if !index.discussions(range).is_empty() {
        return Decoration::DiscussionUnderline;
    }
    Decoration::None
}

/// Decide decorations for every occupied range in the index.
pub fn plan_all(index: &AnnotationIndex) -> OverlayPlan {
    let mut decorations = BTreeMap::new();
    for range in index.all_ranges() {
        let decoration = plan(index, &range);
        if decoration != Decoration::None {
            decorations.insert(range, decoration);
        }
    }
    OverlayPlan { decorations }
}

/// A full overlay plan: exactly one decoration per occupied range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayPlan {
    decorations: BTreeMap<RangeKey, Decoration>,
}

impl OverlayPlan {
    pub fn ranges(&self) -> impl Iterator<Item = &RangeKey> {
        self.decorations.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RangeKey, &Decoration)> {
        self.decorations.iter()
    }

    pub fn get(&self, range: &RangeKey) -> Option<&Decoration> {
        self.decorations.get(range)
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }
}
