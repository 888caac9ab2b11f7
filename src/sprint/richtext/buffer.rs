//! # Attributed Buffer
//!
//! The run-based rich-text value at the centre of a note body.
//!
//! A buffer holds three things:
//!
//! - `text`: the characters, addressed by Unicode scalar offset (never bytes).
//! - `runs`: `(range, AttributeSet)` pairs that partition `[0, len)` exactly.
//!   Runs are kept maximal, so two adjacent runs never share an attribute set.
//! - `objects`: inline objects (images) keyed by the offset of their one-char
//!   placeholder, [`OBJECT_REPLACEMENT_CHAR`].
//!
//! Every public mutation validates its range up front and either applies in
//! full or returns a [`BufferError`] without touching the buffer.

use super::attributes::{AttributeSet, RenderSize, DISPLAY_COLOR};
use crate::error::BufferError;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::Range;

/// Placeholder character occupying the single slot of an inline object.
pub const OBJECT_REPLACEMENT_CHAR: char = '\u{FFFC}';

/// A non-text payload embedded in the buffer, e.g. raw image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineObject {
    pub payload: Bytes,
    pub render_size: RenderSize,
}

impl InlineObject {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            render_size: RenderSize::default(),
        }
    }

    pub fn with_size(mut self, render_size: RenderSize) -> Self {
        self.render_size = render_size;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub range: Range<usize>,
    pub attributes: AttributeSet,
}

impl Run {
    pub fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributedBuffer {
    text: String,
    len: usize,
    runs: Vec<Run>,
    objects: BTreeMap<usize, InlineObject>,
}

impl AttributedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str, attributes: AttributeSet) -> Self {
        let mut buffer = Self::new();
        buffer.push_str(text, attributes);
        buffer
    }

    /// Length in Unicode scalar values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn objects(&self) -> &BTreeMap<usize, InlineObject> {
        &self.objects
    }

    pub fn has_objects(&self) -> bool {
        !self.objects.is_empty()
    }

    /// Text covered by `range`.
    pub fn text_in(&self, range: Range<usize>) -> Result<&str, BufferError> {
        self.check_range(&range)?;
        Ok(self.slice(range))
    }

    /// Appends text at the end of the buffer.
    pub fn push_str(&mut self, text: &str, mut attributes: AttributeSet) {
        if text.is_empty() {
            return;
        }
        attributes.object = false;
        let start = self.len;
        self.text.push_str(text);
        self.len += text.chars().count();
        self.push_run(start..self.len, attributes);
    }

    /// Appends an inline object at the end of the buffer.
    ///
    /// `attributes` describe the slot; the object flag is always set on it.
    pub fn push_object(&mut self, object: InlineObject, mut attributes: AttributeSet) {
        attributes.object = true;
        attributes.reference = None;
        let offset = self.len;
        self.text.push(OBJECT_REPLACEMENT_CHAR);
        self.len += 1;
        self.push_run(offset..self.len, attributes);
        self.objects.insert(offset, object);
    }

    /// Substitutes `range` with `text` carrying `attributes`.
    ///
    /// Runs and objects after the range shift by the length difference. Any
    /// object whose slot lies inside `range` is dropped together with its
    /// payload. Text inserted here is never an object slot.
    pub fn replace(
        &mut self,
        range: Range<usize>,
        text: &str,
        mut attributes: AttributeSet,
    ) -> Result<(), BufferError> {
        self.check_range(&range)?;
        attributes.object = false;
        let inserted = text.chars().count();
        self.splice(range, text, inserted, attributes);
        Ok(())
    }

    /// Returns the attribute set covering `offset`.
    pub fn attributes_at(&self, offset: usize) -> Result<&AttributeSet, BufferError> {
        let out_of_bounds = BufferError::OutOfBounds {
            offset,
            len: self.len,
        };
        if offset >= self.len {
            return Err(out_of_bounds);
        }
        let idx = self.runs.partition_point(|run| run.range.end <= offset);
        self.runs
            .get(idx)
            .map(|run| &run.attributes)
            .ok_or(out_of_bounds)
    }

    /// Overwrites the attributes over `range`.
    ///
    /// What a unit *is* (an object slot, a resolved reference) survives the
    /// overwrite; only its styling changes. A resolved reference is styled as
    /// a whole, so `range` grows to cover any reference run it touches.
    pub fn set_attributes(
        &mut self,
        range: Range<usize>,
        attributes: AttributeSet,
    ) -> Result<(), BufferError> {
        self.update_attributes(range, |_| attributes.clone())
    }

    /// Maps every run segment overlapping `range` through `f`, splitting runs
    /// at the range boundaries and merging equal neighbours afterwards.
    ///
    /// Reference runs are never split: `range` is widened to their edges.
    pub fn update_attributes<F>(&mut self, range: Range<usize>, mut f: F) -> Result<(), BufferError>
    where
        F: FnMut(&AttributeSet) -> AttributeSet,
    {
        self.check_range(&range)?;
        if range.is_empty() {
            return Ok(());
        }
        let range = self.widen_to_references(range);

        let mut runs = Vec::with_capacity(self.runs.len() + 2);
        for Run {
            range: span,
            attributes,
        } in std::mem::take(&mut self.runs)
        {
            if span.end <= range.start || span.start >= range.end {
                runs.push(Run {
                    range: span,
                    attributes,
                });
                continue;
            }

            let lo = span.start.max(range.start);
            let hi = span.end.min(range.end);
            if span.start < lo {
                runs.push(Run {
                    range: span.start..lo,
                    attributes: attributes.clone(),
                });
            }

            let mut updated = f(&attributes);
            updated.object = attributes.object;
            updated.reference = attributes.reference.clone();
            runs.push(Run {
                range: lo..hi,
                attributes: updated,
            });

            if hi < span.end {
                runs.push(Run {
                    range: hi..span.end,
                    attributes,
                });
            }
        }

        self.runs = runs;
        self.normalize_runs();
        Ok(())
    }

    /// Inserts a one-char placeholder for `object` at `offset`.
    pub fn insert_object(&mut self, offset: usize, object: InlineObject) -> Result<(), BufferError> {
        if offset > self.len {
            return Err(BufferError::OutOfBounds {
                offset,
                len: self.len,
            });
        }
        let mut utf8 = [0u8; 4];
        let placeholder = OBJECT_REPLACEMENT_CHAR.encode_utf8(&mut utf8);
        self.splice(offset..offset, placeholder, 1, AttributeSet::object());
        self.objects.insert(offset, object);
        Ok(())
    }

    /// Run segments overlapping `range`, clipped to it.
    pub fn runs_in(&self, range: Range<usize>) -> Result<Vec<Run>, BufferError> {
        self.check_range(&range)?;
        Ok(self
            .runs
            .iter()
            .filter(|run| run.range.start < range.end && run.range.end > range.start)
            .map(|run| Run {
                range: run.range.start.max(range.start)..run.range.end.min(range.end),
                attributes: run.attributes.clone(),
            })
            .collect())
    }

    /// Writes [`DISPLAY_COLOR`] over `range`.
    pub fn normalize_foreground(&mut self, range: Range<usize>) -> Result<(), BufferError> {
        self.update_attributes(range, |attrs| AttributeSet {
            foreground: DISPLAY_COLOR,
            ..attrs.clone()
        })
    }

    /// Verifies the structural invariants, describing the first violation.
    pub fn check_invariants(&self) -> Result<(), String> {
        let counted = self.text.chars().count();
        if counted != self.len {
            return Err(format!("cached length {} != text length {}", self.len, counted));
        }

        let mut cursor = 0;
        for (idx, run) in self.runs.iter().enumerate() {
            if run.range.start != cursor {
                return Err(format!("run {idx} starts at {} expected {cursor}", run.range.start));
            }
            if run.is_empty() {
                return Err(format!("run {idx} is empty"));
            }
            if idx > 0 && self.runs[idx - 1].attributes == run.attributes {
                return Err(format!("run {idx} should have been merged with its predecessor"));
            }
            cursor = run.range.end;
        }
        if cursor != self.len {
            return Err(format!("runs cover {cursor} of {} units", self.len));
        }

        for &offset in self.objects.keys() {
            let attrs = self
                .attributes_at(offset)
                .map_err(|err| format!("object at {offset}: {err}"))?;
            if !attrs.object {
                return Err(format!("object at {offset} sits in a non-object run"));
            }
            if self.slice(offset..offset + 1).chars().next() != Some(OBJECT_REPLACEMENT_CHAR) {
                return Err(format!("object at {offset} has no placeholder character"));
            }
        }
        Ok(())
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), BufferError> {
        if range.start > range.end {
            return Err(BufferError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > self.len {
            return Err(BufferError::OutOfBounds {
                offset: range.end,
                len: self.len,
            });
        }
        Ok(())
    }

    fn widen_to_references(&self, range: Range<usize>) -> Range<usize> {
        self.runs
            .iter()
            .filter(|run| run.attributes.reference.is_some())
            .filter(|run| run.range.start < range.end && run.range.end > range.start)
            .fold(range.clone(), |acc, run| {
                acc.start.min(run.range.start)..acc.end.max(run.range.end)
            })
    }

    fn byte_offset(&self, offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(offset)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    fn slice(&self, range: Range<usize>) -> &str {
        let start = self.byte_offset(range.start);
        let end = self.byte_offset(range.end);
        &self.text[start..end]
    }

    /// Unchecked core of `replace`/`insert_object`; `inserted` is the char
    /// count of `text`.
    fn splice(&mut self, range: Range<usize>, text: &str, inserted: usize, attributes: AttributeSet) {
        let removed = range.end - range.start;
        let shift = |offset: usize| offset - removed + inserted;

        let start_byte = self.byte_offset(range.start);
        let end_byte = self.byte_offset(range.end);
        self.text.replace_range(start_byte..end_byte, text);
        self.len = self.len - removed + inserted;

        self.objects = std::mem::take(&mut self.objects)
            .into_iter()
            .filter_map(|(offset, object)| {
                if offset < range.start {
                    Some((offset, object))
                } else if offset < range.end {
                    None
                } else {
                    Some((shift(offset), object))
                }
            })
            .collect();

        let mut before = Vec::with_capacity(self.runs.len() + 1);
        let mut after = Vec::new();
        for run in std::mem::take(&mut self.runs) {
            if run.range.start < range.start {
                before.push(Run {
                    range: run.range.start..run.range.end.min(range.start),
                    attributes: run.attributes.clone(),
                });
            }
            if run.range.end > range.end {
                let start = run.range.start.max(range.end);
                after.push(Run {
                    range: shift(start)..shift(run.range.end),
                    attributes: run.attributes,
                });
            }
        }

        if inserted > 0 {
            before.push(Run {
                range: range.start..range.start + inserted,
                attributes,
            });
        }
        before.extend(after);
        self.runs = before;
        self.normalize_runs();
    }

    fn push_run(&mut self, range: Range<usize>, attributes: AttributeSet) {
        if let Some(last) = self.runs.last_mut() {
            if last.attributes == attributes && last.range.end == range.start {
                last.range.end = range.end;
                return;
            }
        }
        self.runs.push(Run { range, attributes });
    }

    fn normalize_runs(&mut self) {
        let mut merged: Vec<Run> = Vec::with_capacity(self.runs.len());
        for run in std::mem::take(&mut self.runs) {
            if run.is_empty() {
                continue;
            }
            if let Some(last) = merged.last_mut() {
                if last.attributes == run.attributes && last.range.end == run.range.start {
                    last.range.end = run.range.end;
                    continue;
                }
            }
            merged.push(run);
        }
        self.runs = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::attributes::{Color, FontWeight, ObjectRef};

    fn img(tag: &'static str) -> InlineObject {
        InlineObject::new(Bytes::from_static(tag.as_bytes()))
    }

    fn ranges(buffer: &AttributedBuffer) -> Vec<Range<usize>> {
        buffer.runs().iter().map(|run| run.range.clone()).collect()
    }

    #[test]
    fn from_text_creates_single_run() {
        let buffer = AttributedBuffer::from_text("héllo", AttributeSet::plain());
        assert_eq!(buffer.len(), 5);
        assert_eq!(ranges(&buffer), vec![0..5]);
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn empty_buffer_has_no_runs() {
        let buffer = AttributedBuffer::new();
        assert!(buffer.is_empty());
        assert!(buffer.runs().is_empty());
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn insert_object_shifts_following_runs() {
        let mut buffer = AttributedBuffer::from_text("A", AttributeSet::plain());
        buffer.push_str("B", AttributeSet::plain().bold());
        buffer.insert_object(1, img("img")).unwrap();

        assert_eq!(buffer.text(), "A\u{FFFC}B");
        assert_eq!(buffer.objects().keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(ranges(&buffer), vec![0..1, 1..2, 2..3]);
        assert!(buffer.attributes_at(1).unwrap().object);
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn insert_object_shifts_existing_objects_at_or_after_offset() {
        let mut buffer = AttributedBuffer::from_text("abc", AttributeSet::plain());
        buffer.insert_object(1, img("first")).unwrap();
        buffer.insert_object(1, img("second")).unwrap();

        let objects = buffer.objects();
        assert_eq!(objects[&1].payload, Bytes::from_static(b"second"));
        assert_eq!(objects[&2].payload, Bytes::from_static(b"first"));
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn insert_object_rejects_offset_past_end() {
        let mut buffer = AttributedBuffer::from_text("ab", AttributeSet::plain());
        let err = buffer.insert_object(3, img("x")).unwrap_err();
        assert_eq!(err, BufferError::OutOfBounds { offset: 3, len: 2 });
        assert_eq!(buffer.text(), "ab");
    }

    #[test]
    fn replace_shifts_subsequent_runs_by_length_difference() {
        let mut buffer = AttributedBuffer::from_text("Hello ", AttributeSet::plain());
        buffer.push_str("world", AttributeSet::plain().italic());

        buffer
            .replace(0..5, "Goodbye", AttributeSet::plain().bold())
            .unwrap();

        assert_eq!(buffer.text(), "Goodbye world");
        assert_eq!(ranges(&buffer), vec![0..7, 7..8, 8..13]);
        assert_eq!(buffer.attributes_at(10).unwrap().slant, crate::richtext::FontSlant::Italic);
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn replace_drops_objects_inside_range_and_shifts_later_ones() {
        let mut buffer = AttributedBuffer::from_text("abcdef", AttributeSet::plain());
        buffer.insert_object(2, img("gone")).unwrap();
        buffer.insert_object(5, img("kept")).unwrap();
        // "ab\u{FFFC}cd\u{FFFC}ef"

        buffer.replace(1..4, "Z", AttributeSet::plain()).unwrap();

        assert_eq!(buffer.text(), "aZd\u{FFFC}ef");
        let offsets: Vec<_> = buffer.objects().keys().copied().collect();
        assert_eq!(offsets, vec![3]);
        assert_eq!(buffer.objects()[&3].payload, Bytes::from_static(b"kept"));
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn replace_never_creates_object_runs() {
        let mut buffer = AttributedBuffer::from_text("ab", AttributeSet::plain());
        buffer.replace(1..1, "x", AttributeSet::object()).unwrap();
        assert!(!buffer.attributes_at(1).unwrap().object);
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn replace_with_empty_text_deletes() {
        let mut buffer = AttributedBuffer::from_text("abc", AttributeSet::plain());
        buffer.push_str("def", AttributeSet::plain().bold());
        buffer.replace(2..4, "", AttributeSet::plain()).unwrap();
        assert_eq!(buffer.text(), "abef");
        assert_eq!(ranges(&buffer), vec![0..2, 2..4]);
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn replace_rejects_bad_ranges_without_mutating() {
        let mut buffer = AttributedBuffer::from_text("abc", AttributeSet::plain());
        let before = buffer.clone();

        #[allow(clippy::reversed_empty_ranges)]
        let reversed = buffer.replace(2..1, "x", AttributeSet::plain());
        assert_eq!(reversed, Err(BufferError::InvalidRange { start: 2, end: 1 }));
        assert_eq!(
            buffer.replace(1..4, "x", AttributeSet::plain()),
            Err(BufferError::OutOfBounds { offset: 4, len: 3 })
        );
        assert_eq!(buffer, before);
    }

    #[test]
    fn attributes_at_end_is_out_of_bounds() {
        let buffer = AttributedBuffer::from_text("ab", AttributeSet::plain());
        assert_eq!(
            buffer.attributes_at(2),
            Err(BufferError::OutOfBounds { offset: 2, len: 2 })
        );
    }

    #[test]
    fn set_attributes_splits_and_merges_runs() {
        let mut buffer = AttributedBuffer::from_text("abcdef", AttributeSet::plain());
        buffer
            .set_attributes(2..4, AttributeSet::plain().bold())
            .unwrap();
        assert_eq!(ranges(&buffer), vec![0..2, 2..4, 4..6]);

        buffer.set_attributes(2..4, AttributeSet::plain()).unwrap();
        assert_eq!(ranges(&buffer), vec![0..6]);
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn set_attributes_keeps_object_slots() {
        let mut buffer = AttributedBuffer::from_text("ab", AttributeSet::plain());
        buffer.insert_object(1, img("x")).unwrap();
        buffer
            .set_attributes(0..3, AttributeSet::plain().bold())
            .unwrap();

        assert!(buffer.attributes_at(1).unwrap().object);
        assert_eq!(buffer.attributes_at(1).unwrap().weight, FontWeight::Bold);
        assert!(!buffer.attributes_at(0).unwrap().object);
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn styling_never_splits_a_reference_run() {
        let reference = AttributeSet {
            reference: Some(ObjectRef {
                reference: "r1".to_string(),
                size: None,
            }),
            ..AttributeSet::plain()
        };
        let mut buffer = AttributedBuffer::from_text("A", AttributeSet::plain());
        buffer.push_str("[ref:r1]", reference);
        buffer.push_str("B", AttributeSet::plain());

        buffer
            .update_attributes(0..3, |attrs| attrs.clone().bold())
            .unwrap();

        assert_eq!(ranges(&buffer), vec![0..1, 1..9, 9..10]);
        assert_eq!(buffer.attributes_at(8).unwrap().weight, FontWeight::Bold);
        assert!(buffer.attributes_at(8).unwrap().reference.is_some());
        assert_eq!(buffer.attributes_at(9).unwrap().weight, FontWeight::Regular);
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn normalize_foreground_overwrites_colour() {
        let red = Color {
            r: 255,
            g: 0,
            b: 0,
            a: 255,
        };
        let mut attrs = AttributeSet::plain();
        attrs.foreground = red;
        let mut buffer = AttributedBuffer::from_text("abc", attrs);
        buffer.normalize_foreground(0..3).unwrap();
        assert_eq!(buffer.attributes_at(1).unwrap().foreground, DISPLAY_COLOR);
    }

    #[test]
    fn runs_in_clips_segments() {
        let mut buffer = AttributedBuffer::from_text("abc", AttributeSet::plain());
        buffer.push_str("def", AttributeSet::plain().bold());
        let segments = buffer.runs_in(1..4).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].range, 1..3);
        assert_eq!(segments[1].range, 3..4);
    }

    #[test]
    fn partition_holds_across_mixed_mutations() {
        // Small deterministic LCG so the sequence is reproducible.
        let mut seed: u64 = 0x5eed;
        let mut next = |bound: usize| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) as usize) % bound.max(1)
        };

        let styles = [
            AttributeSet::plain(),
            AttributeSet::plain().bold(),
            AttributeSet::plain().italic().underlined(),
            AttributeSet::plain().struck(),
        ];
        let mut buffer = AttributedBuffer::from_text("seed text", AttributeSet::plain());

        for step in 0..300 {
            let len = buffer.len();
            let a = next(len + 1);
            let b = next(len + 1);
            let (start, end) = (a.min(b), a.max(b));
            let attrs = styles[next(styles.len())].clone();
            match next(3) {
                0 => {
                    let text = ["", "x", "yz", "ünï", "\n"][next(5)];
                    buffer.replace(start..end, text, attrs).unwrap();
                }
                1 => buffer.set_attributes(start..end, attrs).unwrap(),
                _ => buffer.insert_object(start, img("p")).unwrap(),
            }
            if let Err(violation) = buffer.check_invariants() {
                panic!("step {step}: {violation}");
            }
        }
    }
}
