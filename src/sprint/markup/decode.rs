use super::reference_placeholder;
use super::tokenizer::{tokenize, Token};
use crate::error::MarkupError;
use crate::richtext::{
    AttributeSet, AttributedBuffer, FontSlant, FontWeight, ObjectRef, ParagraphStyle, RenderSize,
    TextSize, TextStyle,
};

/// Elements that never take a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "img", "hr", "meta", "link", "input", "wbr"];

#[derive(Debug, Clone, Copy)]
enum Effect {
    Bold,
    Italic,
    Underline,
    Strike,
    Size(TextSize),
    Preset(TextStyle),
    Paragraph(ParagraphStyle),
    /// Content is dropped (`<head>`, `<style>`, ...).
    Skip,
    Transparent,
}

struct Frame {
    name: String,
    effect: Effect,
}

fn effect_for(
    name: &str,
    attrs: &[(String, String)],
    position: usize,
) -> Result<Effect, MarkupError> {
    let effect = match name {
        "b" | "strong" => Effect::Bold,
        "i" | "em" => Effect::Italic,
        "u" | "ins" => Effect::Underline,
        "s" | "strike" | "del" => Effect::Strike,
        "h1" => Effect::Preset(TextStyle::Title),
        "h2" => Effect::Preset(TextStyle::Heading),
        "h3" => Effect::Preset(TextStyle::Subheading),
        "span" => attr(attrs, "class")
            .and_then(|classes| classes.split_whitespace().find_map(TextSize::from_class_name))
            .map_or(Effect::Transparent, Effect::Size),
        "p" => Effect::Paragraph(paragraph_style(attrs, position)?),
        "li" => Effect::Paragraph(ParagraphStyle::BULLET),
        "head" | "style" | "script" | "title" => Effect::Skip,
        _ => Effect::Transparent,
    };
    Ok(effect)
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn paragraph_style(
    attrs: &[(String, String)],
    position: usize,
) -> Result<ParagraphStyle, MarkupError> {
    let read = |name: &str| -> Result<u16, MarkupError> {
        match attr(attrs, name) {
            None => Ok(0),
            Some(value) => value.trim().parse().map_err(|_| {
                MarkupError::malformed(position, format!("invalid {name} value `{value}`"))
            }),
        }
    };
    Ok(ParagraphStyle {
        head_indent: read("data-head-indent")?,
        first_line_indent: read("data-first-line-indent")?,
        spacing_before: read("data-spacing-before")?,
    })
}

fn image_size(attrs: &[(String, String)]) -> Option<RenderSize> {
    let width = attr(attrs, "width")?.trim().parse().ok()?;
    let height = attr(attrs, "height")?.trim().parse().ok()?;
    Some(RenderSize { width, height })
}

fn current_attributes(stack: &[Frame]) -> AttributeSet {
    let mut attrs = AttributeSet::plain();
    for frame in stack {
        match frame.effect {
            Effect::Bold => attrs.weight = FontWeight::Bold,
            Effect::Italic => attrs.slant = FontSlant::Italic,
            Effect::Underline => attrs.underline = true,
            Effect::Strike => attrs.strikethrough = true,
            Effect::Size(size) => attrs.size = size,
            Effect::Preset(style) => {
                attrs.size = style.size();
                attrs.weight = style.weight();
            }
            Effect::Paragraph(style) => attrs.paragraph = Some(style),
            Effect::Skip | Effect::Transparent => {}
        }
    }
    attrs
}

/// Blocks end their content with a line break.
fn is_block(effect: Effect) -> bool {
    matches!(effect, Effect::Paragraph(_) | Effect::Preset(_))
}

fn skipping(stack: &[Frame]) -> bool {
    stack.iter().any(|frame| matches!(frame.effect, Effect::Skip))
}

/// Parses markup into a buffer.
///
/// Understands the tags [`encode`](super::encode) writes plus the common
/// HTML spellings of the same facets; any other element is transparent but
/// must still be balanced. `<p>`, `<li>` and `<h1>`..`<h3>` end with a `\n`
/// unless their text already does. Whatever colour the source asked for, every run of
/// the result carries [`DISPLAY_COLOR`](crate::richtext::DISPLAY_COLOR).
pub fn decode(markup: &str) -> Result<AttributedBuffer, MarkupError> {
    let mut buffer = AttributedBuffer::new();
    let mut stack: Vec<Frame> = Vec::new();

    for token in tokenize(markup)? {
        match token {
            Token::Text(text) => {
                if !skipping(&stack) {
                    buffer.push_str(&text, current_attributes(&stack));
                }
            }
            Token::Open {
                name,
                attrs,
                self_closing,
                position,
            } => match name.as_str() {
                "br" => {
                    if !skipping(&stack) {
                        buffer.push_str("\n", current_attributes(&stack));
                    }
                }
                "img" => {
                    if skipping(&stack) {
                        continue;
                    }
                    if let Some(src) = attr(&attrs, "src").filter(|src| !src.is_empty()) {
                        let object = ObjectRef {
                            reference: src.to_string(),
                            size: image_size(&attrs),
                        };
                        let placeholder = reference_placeholder(&object.reference);
                        let attributes = AttributeSet {
                            reference: Some(object),
                            ..current_attributes(&stack)
                        };
                        buffer.push_str(&placeholder, attributes);
                    }
                }
                _ if VOID_ELEMENTS.contains(&name.as_str()) || self_closing => {}
                _ => {
                    let effect = effect_for(&name, &attrs, position)?;
                    stack.push(Frame { name, effect });
                }
            },
            Token::Close { name, position } => {
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    continue;
                }
                match stack.last() {
                    Some(frame) if frame.name == name => {
                        if is_block(frame.effect)
                            && !skipping(&stack)
                            && !buffer.text().ends_with('\n')
                        {
                            buffer.push_str("\n", current_attributes(&stack));
                        }
                        stack.pop();
                    }
                    Some(frame) => {
                        return Err(MarkupError::malformed(
                            position,
                            format!("expected </{}>, found </{name}>", frame.name),
                        ))
                    }
                    None => {
                        return Err(MarkupError::malformed(
                            position,
                            format!("unexpected </{name}>"),
                        ))
                    }
                }
            }
        }
    }

    if let Some(frame) = stack.last() {
        return Err(MarkupError::malformed(
            markup.len(),
            format!("unclosed <{}>", frame.name),
        ));
    }

    let len = buffer.len();
    buffer
        .normalize_foreground(0..len)
        .map_err(|err| MarkupError::malformed(markup.len(), err.to_string()))?;
    Ok(buffer)
}
