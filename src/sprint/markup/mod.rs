//! # Markup Codec
//!
//! Flat tag markup used to ship note bodies over the wire and to persist them.
//!
//! ```text
//! <span class="title"><b>Groceries</b></span>
//! <p data-head-indent="15" data-first-line-indent="15" data-spacing-before="5">eggs</p>
//! <img src="files/67e1e15a/download" width="360" height="170" />
//! ```
//!
//! - [`encode`] projects a buffer onto the tag set: `b`, `i`, `u`, `s`,
//!   `span class=<size>`, `p` with indent data attributes, and `img` for
//!   resolved references. Anything the tag set can't express is dropped.
//! - [`decode`] reads that tag set plus common HTML aliases and always
//!   normalizes the foreground colour.
//!
//! Inline objects must be resolved (see [`attachments`](crate::attachments))
//! before a buffer can be encoded.

mod decode;
mod encode;
mod tokenizer;

pub use decode::decode;
pub use encode::encode;

const REFERENCE_PREFIX: &str = "[ref:";
const REFERENCE_SUFFIX: &str = "]";

/// Text that stands in for a resolved object inside a buffer.
pub fn reference_placeholder(reference: &str) -> String {
    format!("{REFERENCE_PREFIX}{reference}{REFERENCE_SUFFIX}")
}

/// Unwraps markup that arrived inside a ```` ``` ```` code fence, dropping
/// an optional language tag on the opening line.
pub fn strip_code_fence(markup: &str) -> &str {
    let trimmed = markup.trim();
    let inner = match trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    {
        Some(inner) => inner,
        None => return markup,
    };

    let inner = match inner.find('\n') {
        Some(newline) if inner[..newline].chars().all(|c| c.is_ascii_alphanumeric()) => {
            &inner[newline + 1..]
        }
        _ => inner,
    };
    inner.strip_suffix('\n').unwrap_or(inner)
}
