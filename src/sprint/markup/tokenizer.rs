//! Flat tokenizer for the tag markup.
//!
//! Produces text, open and close tokens. It knows nothing about which tags
//! exist or how they nest; that is the decoder's job. Comments, doctypes and
//! processing instructions are skipped here.

use crate::error::MarkupError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// Text with entities already decoded.
    Text(String),
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
        position: usize,
    },
    Close {
        name: String,
        position: usize,
    },
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, MarkupError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }

        if text_start < pos {
            tokens.push(Token::Text(decode_entities(&input[text_start..pos])));
        }

        let rest = &input[pos..];
        if rest.starts_with("<!--") {
            let end = rest[4..]
                .find("-->")
                .ok_or_else(|| MarkupError::malformed(pos, "unterminated comment"))?;
            pos += 4 + end + 3;
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest
                .find('>')
                .ok_or_else(|| MarkupError::malformed(pos, "unterminated declaration"))?;
            pos += end + 1;
        } else {
            let end = find_tag_end(bytes, pos)?;
            tokens.push(parse_tag(&input[pos + 1..end], pos)?);
            pos = end + 1;
        }
        text_start = pos;
    }

    if text_start < bytes.len() {
        tokens.push(Token::Text(decode_entities(&input[text_start..])));
    }
    Ok(tokens)
}

/// Index of the `>` closing the tag opened at `start`, skipping quoted values.
fn find_tag_end(bytes: &[u8], start: usize) -> Result<usize, MarkupError> {
    let mut quote: Option<u8> = None;
    for (idx, &byte) in bytes.iter().enumerate().skip(start + 1) {
        match (quote, byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(byte),
            (None, b'<') => return Err(MarkupError::malformed(idx, "unexpected `<` inside tag")),
            (None, b'>') => return Ok(idx),
            (None, _) => {}
        }
    }
    Err(MarkupError::malformed(start, "unterminated tag"))
}

fn parse_tag(inner: &str, position: usize) -> Result<Token, MarkupError> {
    if let Some(name) = inner.strip_prefix('/') {
        let name = name.trim();
        validate_name(name, position)?;
        return Ok(Token::Close {
            name: name.to_ascii_lowercase(),
            position,
        });
    }

    let trimmed = inner.trim_end();
    let (body, self_closing) = match trimmed.strip_suffix('/') {
        Some(body) => (body, true),
        None => (trimmed, false),
    };

    let name_end = body
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(body.len());
    let name = &body[..name_end];
    validate_name(name, position)?;

    Ok(Token::Open {
        name: name.to_ascii_lowercase(),
        attrs: parse_attributes(&body[name_end..]),
        self_closing,
        position,
    })
}

fn validate_name(name: &str, position: usize) -> Result<(), MarkupError> {
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(MarkupError::malformed(
            position,
            format!("invalid tag name `{name}`"),
        ))
    }
}

fn parse_attributes(source: &str) -> Vec<(String, String)> {
    let bytes = source.as_bytes();
    let mut attrs = Vec::new();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let name_start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'=' {
            pos += 1;
        }
        if name_start == pos {
            break;
        }
        let name = source[name_start..pos].to_ascii_lowercase();

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() || bytes[pos] != b'=' {
            attrs.push((name, String::new()));
            continue;
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let value = match bytes.get(pos) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let start = pos + 1;
                let end = source[start..]
                    .find(quote as char)
                    .map_or(source.len(), |offset| start + offset);
                pos = (end + 1).min(source.len());
                &source[start..end]
            }
            _ => {
                let start = pos;
                while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                &source[start..pos]
            }
        };
        attrs.push((name, decode_entities(value)));
    }
    attrs
}

/// Decodes the named entities the encoder produces plus numeric references.
/// Anything unrecognised is kept literally.
pub(crate) fn decode_entities(source: &str) -> String {
    if !source.contains('&') {
        return source.to_string();
    }

    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| entity_char(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity_char(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let hex = numeric
                .strip_prefix('x')
                .or_else(|| numeric.strip_prefix('X'));
            let code = match hex {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

pub(crate) fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
