//! # Rich Text
//!
//! The in-memory document model: [`AttributedBuffer`] plus the stateless
//! style operations in [`style`]. Nothing here knows about markup, uploads
//! or persistence.

pub mod attributes;
pub mod buffer;
pub mod style;

pub use attributes::{
    AttributeSet, Color, Facet, FontSlant, FontWeight, ObjectRef, ParagraphStyle, RenderSize,
    TextSize, DISPLAY_COLOR,
};
pub use buffer::{AttributedBuffer, InlineObject, Run, OBJECT_REPLACEMENT_CHAR};
pub use style::{apply_bullet_style, apply_paragraph_style, toggle_facet, TextStyle};
