//! Stateless style operations over a range of an [`AttributedBuffer`].
//!
//! Every function treats an empty range as "nothing selected" and returns
//! `Ok` without touching the buffer. Ranges past the end are rejected.
//! Every text-facing mutation also writes [`DISPLAY_COLOR`] over the touched
//! segments, keeping the colour invariant no matter what came before.

use super::attributes::{
    AttributeSet, Facet, FontWeight, ParagraphStyle, TextSize, DISPLAY_COLOR,
};
use super::buffer::AttributedBuffer;
use crate::error::BufferError;
use std::ops::Range;

/// Paragraph presets offered by the formatting sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyle {
    Title,
    Heading,
    Subheading,
    Body,
}

impl TextStyle {
    pub fn size(self) -> TextSize {
        match self {
            TextStyle::Title => TextSize::Title,
            TextStyle::Heading => TextSize::Heading,
            TextStyle::Subheading => TextSize::Subheading,
            TextStyle::Body => TextSize::Body,
        }
    }

    pub fn weight(self) -> FontWeight {
        match self {
            TextStyle::Title | TextStyle::Heading => FontWeight::Bold,
            TextStyle::Subheading | TextStyle::Body => FontWeight::Regular,
        }
    }
}

/// Applies a paragraph preset (weight + size class) over `range`.
///
/// Object slots only get their colour reasserted.
pub fn apply_paragraph_style(
    buffer: &mut AttributedBuffer,
    range: Range<usize>,
    style: TextStyle,
) -> Result<(), BufferError> {
    buffer.update_attributes(range, |attrs| {
        let mut next = attrs.clone();
        if !attrs.object {
            next.weight = style.weight();
            next.size = style.size();
        }
        next.foreground = DISPLAY_COLOR;
        next
    })
}

/// Flips `facet` on every run segment overlapping `range`.
///
/// Each segment is toggled on its own: a selection over `[bold "Hi"][plain
/// "there"]` ends up as `[plain "Hi"][bold "there"]`. Returns the facet's new
/// value on the first segment, which is what a toolbar shows as the
/// selection's state. An empty range returns `false`.
pub fn toggle_facet(
    buffer: &mut AttributedBuffer,
    range: Range<usize>,
    facet: Facet,
) -> Result<bool, BufferError> {
    let representative = match buffer.runs_in(range.clone())?.first() {
        Some(first) => !first.attributes.facet(facet),
        None => return Ok(false),
    };

    buffer.update_attributes(range, |attrs| {
        let mut next = attrs.clone();
        next.set_facet(facet, !attrs.facet(facet));
        next.foreground = DISPLAY_COLOR;
        next
    })?;
    Ok(representative)
}

/// Indents every segment in `range` as a bulleted paragraph.
///
/// No bullet glyph is inserted into the text; drawing one is left to whatever
/// renders the paragraph.
pub fn apply_bullet_style(
    buffer: &mut AttributedBuffer,
    range: Range<usize>,
) -> Result<(), BufferError> {
    buffer.update_attributes(range, |attrs| AttributeSet {
        paragraph: Some(ParagraphStyle::BULLET),
        ..attrs.clone()
    })
}
