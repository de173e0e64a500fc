//! In-memory annotation index
//!
//! The range-keyed store for the currently open document. Pure data
//! structure; the lifecycle coordinator owns its lifetime and performs every
//! mutation on behalf of callers.

use std::collections::{BTreeSet, HashMap};

use super::types::{Discussion, Highlight, Note, RangeAnnotations, RangeKey};

/// Range-keyed store of the three annotation kinds for one open document.
///
/// Highlights and notes are unique per range (upserts revise in place);
/// discussions accumulate per range in creation order. The three maps are
/// independent: touching one kind never drops an entry of another kind at
/// the same range.
#[derive(Debug, Default)]
pub struct AnnotationIndex {
    highlights: HashMap<RangeKey, Highlight>,
    notes: HashMap<RangeKey, Note>,
    discussions: HashMap<RangeKey, Vec<Discussion>>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything anchored at a range (cloned, read-only).
    pub fn get(&self, range: &RangeKey) -> RangeAnnotations {
        RangeAnnotations {
            highlight: self.highlights.get(range).cloned(),
            note: self.notes.get(range).cloned(),
            discussions: self.discussions.get(range).cloned().unwrap_or_default(),
        }
    }

    pub fn highlight(&self, range: &RangeKey) -> Option<&Highlight> {
        self.highlights.get(range)
    }

    pub fn note(&self, range: &RangeKey) -> Option<&Note> {
        self.notes.get(range)
    }

    pub fn discussions(&self, range: &RangeKey) -> &[Discussion] {
        self.discussions.get(range).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Insert or replace the highlight at its range.
    ///
    /// Returns the replaced record, if any.
    pub fn upsert_highlight(&mut self, highlight: Highlight) -> Option<Highlight> {
        self.highlights.insert(highlight.range.clone(), highlight)
    }

    /// Insert or replace the note at its range.
    pub fn upsert_note(&mut self, note: Note) -> Option<Note> {
        self.notes.insert(note.range.clone(), note)
    }

    /// Append a discussion thread to its range.
    pub fn append_discussion(&mut self, discussion: Discussion) {
        self.discussions
            .entry(discussion.range.clone())
            .or_default()
            .push(discussion);
    }

    /// Set the response on the discussion with the given id.
    ///
    /// Returns the updated record, or `None` if no thread has that id.
    pub fn answer_discussion(&mut self, id: &str, response: &str) -> Option<Discussion> {
        for threads in self.discussions.values_mut() {
            if let Some(discussion) = threads.iter_mut().find(|d| d.id == id) {
                discussion.answer(response);
                return Some(discussion.clone());
            }
        }
        None
    }

    pub fn remove_highlight(&mut self, range: &RangeKey) -> Option<Highlight> {
        self.highlights.remove(range)
    }

    pub fn remove_note(&mut self, range: &RangeKey) -> Option<Note> {
        self.notes.remove(range)
    }

    /// Remove the discussion with the given id.
    ///
    /// A range whose last thread is removed drops out of the map, so
    /// `all_ranges` stays an exact cover of occupied ranges.
    pub fn remove_discussion(&mut self, id: &str) -> Option<Discussion> {
        let range = self
            .discussions
            .iter()
            .find(|(_, threads)| threads.iter().any(|d| d.id == id))
            .map(|(range, _)| range.clone())?;

        let threads = self.discussions.get_mut(&range)?;
        let position = threads.iter().position(|d| d.id == id)?;
        let removed = threads.remove(position);
        if threads.is_empty() {
            self.discussions.remove(&range);
        }
        Some(removed)
    }

    /// Union of occupied ranges across all three maps.
    ///
    /// The set iterates in lexicographic token order, which doubles as the
    /// list-display order.
    pub fn all_ranges(&self) -> BTreeSet<RangeKey> {
        self.highlights
            .keys()
            .chain(self.notes.keys())
            .chain(self.discussions.keys())
            .cloned()
            .collect()
    }

    /// Atomic bulk replace from a persistence load.
    ///
    /// Duplicate ranges within `highlights` or `notes` collapse to the
    /// last-listed record, matching the per-range uniqueness rule.
    pub fn load_all(
        &mut self,
        highlights: Vec<Highlight>,
        notes: Vec<Note>,
        discussions: Vec<Discussion>,
    ) {
        self.highlights = highlights
            .into_iter()
            .map(|h| (h.range.clone(), h))
            .collect();
        self.notes = notes.into_iter().map(|n| (n.range.clone(), n)).collect();

        let mut by_range: HashMap<RangeKey, Vec<Discussion>> = HashMap::new();
        for discussion in discussions {
            by_range
                .entry(discussion.range.clone())
                .or_default()
                .push(discussion);
        }
        self.discussions = by_range;
    }

    pub fn clear(&mut self) {
        self.highlights.clear();
        self.notes.clear();
        self.discussions.clear();
    }

    /// Total number of records across all kinds.
    pub fn len(&self) -> usize {
        self.highlights.len()
            + self.notes.len()
            + self.discussions.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::types::HighlightColor;

    fn make_highlight(range: &str) -> Highlight {
        Highlight::new(
            "doc-1",
            RangeKey::from(range),
            HighlightColor::Yellow,
            "text",
        )
    }

    fn make_note(range: &str) -> Note {
        Note::new("doc-1", RangeKey::from(range), "text", "a note")
    }

    fn make_discussion(range: &str) -> Discussion {
        Discussion::new("doc-1", RangeKey::from(range), "text", "why?", None)
    }

    #[test]
    fn test_load_all_round_trip() {
        let mut index = AnnotationIndex::new();
        index.load_all(
            vec![make_highlight("r1"), make_highlight("r2")],
            vec![make_note("r2"), make_note("r3")],
            vec![make_discussion("r4")],
        );

        let ranges = index.all_ranges();
        let expected: BTreeSet<RangeKey> = ["r1", "r2", "r3", "r4"]
            .iter()
            .map(|r| RangeKey::from(*r))
            .collect();
        assert_eq!(ranges, expected);
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn test_per_range_uniqueness_for_highlights() {
        let mut index = AnnotationIndex::new();
        index.upsert_highlight(make_highlight("r1"));

        let mut second = make_highlight("r1");
        second.color = HighlightColor::Green;
        let replaced = index.upsert_highlight(second);

        assert!(replaced.is_some());
        assert_eq!(
            index.highlight(&RangeKey::from("r1")).unwrap().color,
            HighlightColor::Green
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_kinds_coexist_at_one_range() {
        let mut index = AnnotationIndex::new();
        index.upsert_highlight(make_highlight("r1"));
        index.upsert_note(make_note("r1"));
        index.append_discussion(make_discussion("r1"));

        let snapshot = index.get(&RangeKey::from("r1"));
        assert!(snapshot.highlight.is_some());
        assert!(snapshot.note.is_some());
        assert_eq!(snapshot.discussions.len(), 1);

        // Removing one kind leaves the others alone
        index.remove_highlight(&RangeKey::from("r1"));
        let snapshot = index.get(&RangeKey::from("r1"));
        assert!(snapshot.highlight.is_none());
        assert!(snapshot.note.is_some());
        assert_eq!(snapshot.discussions.len(), 1);
    }

    #[test]
    fn test_discussions_accumulate_in_order() {
        let mut index = AnnotationIndex::new();
        let first = make_discussion("r2");
        let second = make_discussion("r2");
        let first_id = first.id.clone();

        index.append_discussion(first);
        index.append_discussion(second);

        let threads = index.discussions(&RangeKey::from("r2"));
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id, first_id);
    }

    #[test]
    fn test_removing_last_discussion_frees_the_range() {
        let mut index = AnnotationIndex::new();
        let discussion = make_discussion("r1");
        let id = discussion.id.clone();
        index.append_discussion(discussion);

        assert!(index.remove_discussion(&id).is_some());
        assert!(index.all_ranges().is_empty());
        assert!(index.remove_discussion(&id).is_none());
    }

    #[test]
    fn test_answer_discussion_by_id() {
        let mut index = AnnotationIndex::new();
        let discussion = make_discussion("r1");
        let id = discussion.id.clone();
        index.append_discussion(discussion);

        let updated = index.answer_discussion(&id, "because").unwrap();
        assert_eq!(updated.response.as_deref(), Some("because"));
        assert_eq!(
            index.discussions(&RangeKey::from("r1"))[0]
                .response
                .as_deref(),
            Some("because")
        );
        assert!(index.answer_discussion("missing", "x").is_none());
    }

    #[test]
    fn test_all_ranges_iterates_in_token_order() {
        let mut index = AnnotationIndex::new();
        index.upsert_highlight(make_highlight("r10"));
        index.upsert_highlight(make_highlight("r02"));
        index.upsert_note(make_note("r05"));

        let ordered: Vec<String> = index
            .all_ranges()
            .into_iter()
            .map(|r| r.as_str().to_string())
            .collect();
        assert_eq!(ordered, vec!["r02", "r05", "r10"]);
    }

    #[test]
    fn test_load_all_replaces_previous_contents() {
        let mut index = AnnotationIndex::new();
        index.upsert_highlight(make_highlight("old"));

        index.load_all(vec![make_highlight("new")], vec![], vec![]);

        assert!(index.highlight(&RangeKey::from("old")).is_none());
        assert!(index.highlight(&RangeKey::from("new")).is_some());
    }
}
