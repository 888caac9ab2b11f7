use super::reference_placeholder;
use super::tokenizer::escape_into;
use crate::error::MarkupError;
use crate::richtext::{
    AttributeSet, AttributedBuffer, FontSlant, FontWeight, ObjectRef, ParagraphStyle, TextSize,
};

/// Inline tags in the order they nest, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineTag {
    Size(TextSize),
    Bold,
    Italic,
    Underline,
    Strike,
}

impl InlineTag {
    fn open(self, out: &mut String) {
        match self {
            InlineTag::Size(size) => {
                if let Some(class) = size.class_name() {
                    out.push_str("<span class=\"");
                    out.push_str(class);
                    out.push_str("\">");
                }
            }
            InlineTag::Bold => out.push_str("<b>"),
            InlineTag::Italic => out.push_str("<i>"),
            InlineTag::Underline => out.push_str("<u>"),
            InlineTag::Strike => out.push_str("<s>"),
        }
    }

    fn close(self, out: &mut String) {
        match self {
            InlineTag::Size(_) => out.push_str("</span>"),
            InlineTag::Bold => out.push_str("</b>"),
            InlineTag::Italic => out.push_str("</i>"),
            InlineTag::Underline => out.push_str("</u>"),
            InlineTag::Strike => out.push_str("</s>"),
        }
    }
}

fn inline_tags(attrs: &AttributeSet) -> Vec<InlineTag> {
    let mut tags = Vec::with_capacity(5);
    if attrs.size != TextSize::Body {
        tags.push(InlineTag::Size(attrs.size));
    }
    if attrs.weight == FontWeight::Bold {
        tags.push(InlineTag::Bold);
    }
    if attrs.slant == FontSlant::Italic {
        tags.push(InlineTag::Italic);
    }
    if attrs.underline {
        tags.push(InlineTag::Underline);
    }
    if attrs.strikethrough {
        tags.push(InlineTag::Strike);
    }
    tags
}

fn open_paragraph(style: &ParagraphStyle, out: &mut String) {
    out.push_str("<p");
    for (name, value) in [
        ("data-head-indent", style.head_indent),
        ("data-first-line-indent", style.first_line_indent),
        ("data-spacing-before", style.spacing_before),
    ] {
        if value != 0 {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
    }
    out.push('>');
}

fn close_inline(open: &mut Vec<InlineTag>, keep: usize, out: &mut String) {
    while open.len() > keep {
        if let Some(tag) = open.pop() {
            tag.close(out);
        }
    }
}

/// Writes a reference run as one `<img>` per placeholder it holds. A run
/// whose text was edited into something else falls back to plain text.
fn write_reference(segment: &str, object: &ObjectRef, out: &mut String) {
    let placeholder = reference_placeholder(&object.reference);
    let count = segment.matches(placeholder.as_str()).count();
    if count == 0 || segment.len() != placeholder.len() * count {
        escape_into(segment, out);
        return;
    }

    for _ in 0..count {
        out.push_str("<img src=\"");
        escape_into(&object.reference, out);
        out.push('"');
        if let Some(size) = object.size {
            out.push_str(&format!(" width=\"{}\" height=\"{}\"", size.width, size.height));
        }
        out.push_str(" />");
    }
}

/// Serializes `buffer` to markup.
///
/// Facet changes between runs open and close the minimum set of tags while
/// keeping nesting consistent; paragraph-styled runs are grouped into `<p>`
/// blocks. A block's final `\n` is left implicit in its `</p>`, which
/// [`decode`](super::decode) turns back into the line break. Fails if any
/// inline object is still waiting for resolution.
pub fn encode(buffer: &AttributedBuffer) -> Result<String, MarkupError> {
    if let Some(&offset) = buffer.objects().keys().next() {
        return Err(MarkupError::UnresolvedObject { offset });
    }

    let mut out = String::with_capacity(buffer.text().len() * 2);
    let mut chars = buffer.text().chars();
    let mut block: Option<ParagraphStyle> = None;
    let mut open: Vec<InlineTag> = Vec::new();

    let runs = buffer.runs();
    for (idx, run) in runs.iter().enumerate() {
        let attrs = &run.attributes;
        let mut segment: String = chars.by_ref().take(run.len()).collect();
        let ends_block = attrs.paragraph.is_some()
            && runs
                .get(idx + 1)
                .map_or(true, |next| next.attributes.paragraph != attrs.paragraph);
        if ends_block && segment.ends_with('\n') {
            segment.pop();
        }

        if attrs.paragraph != block {
            close_inline(&mut open, 0, &mut out);
            if block.is_some() {
                out.push_str("</p>");
            }
            if let Some(style) = &attrs.paragraph {
                open_paragraph(style, &mut out);
            }
            block = attrs.paragraph;
        }
        if segment.is_empty() {
            continue;
        }

        let wanted = inline_tags(attrs);
        let keep = open.iter().take_while(|tag| wanted.contains(tag)).count();
        close_inline(&mut open, keep, &mut out);
        for tag in wanted {
            if !open.contains(&tag) {
                tag.open(&mut out);
                open.push(tag);
            }
        }

        match &attrs.reference {
            Some(object) => write_reference(&segment, object, &mut out),
            None => escape_into(&segment, &mut out),
        }
    }

    close_inline(&mut open, 0, &mut out);
    if block.is_some() {
        out.push_str("</p>");
    }
    Ok(out)
}
