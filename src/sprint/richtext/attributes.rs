use serde::{Deserialize, Serialize};

/// Paragraph indentation applied by the bullet style, in points.
pub const BULLET_INDENT: u16 = 15;
/// Spacing inserted before a bulleted paragraph, in points.
pub const BULLET_SPACING_BEFORE: u16 = 5;

/// Size images are inserted at when the caller doesn't specify one.
pub const DEFAULT_RENDER_SIZE: RenderSize = RenderSize {
    width: 360,
    height: 170,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontSlant {
    #[default]
    Regular,
    Italic,
}

/// Preset size class written by [`TextStyle`](crate::richtext::TextStyle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextSize {
    Title,
    Heading,
    Subheading,
    #[default]
    Body,
}

impl TextSize {
    pub fn points(self) -> u16 {
        match self {
            TextSize::Title => 24,
            TextSize::Heading => 20,
            TextSize::Subheading => 18,
            TextSize::Body => 16,
        }
    }

    /// Class name used for this size in markup. `Body` has none.
    pub fn class_name(self) -> Option<&'static str> {
        match self {
            TextSize::Title => Some("title"),
            TextSize::Heading => Some("heading"),
            TextSize::Subheading => Some("subheading"),
            TextSize::Body => None,
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(TextSize::Title),
            "heading" => Some(TextSize::Heading),
            "subheading" => Some(TextSize::Subheading),
            "body" => Some(TextSize::Body),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// The only foreground colour a buffer ever carries.
///
/// Notes are always rendered against the same dark background, so text colour
/// is not user-editable: every mutation and every decode writes this value.
pub const DISPLAY_COLOR: Color = Color {
    r: 255,
    g: 255,
    b: 255,
    a: 255,
};

impl Default for Color {
    fn default() -> Self {
        DISPLAY_COLOR
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ParagraphStyle {
    pub head_indent: u16,
    pub first_line_indent: u16,
    pub spacing_before: u16,
}

impl ParagraphStyle {
    pub const BULLET: ParagraphStyle = ParagraphStyle {
        head_indent: BULLET_INDENT,
        first_line_indent: BULLET_INDENT,
        spacing_before: BULLET_SPACING_BEFORE,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderSize {
    fn default() -> Self {
        DEFAULT_RENDER_SIZE
    }
}

/// Durable reference left behind in the text once an inline object has been
/// uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub reference: String,
    pub size: Option<RenderSize>,
}

/// The four binary facets that can be toggled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

/// Closed set of style facets carried by a run.
///
/// Every facet is independent: setting one never clears another. Bold and
/// italic are separate fields rather than one font-style value so toggling
/// one can't clobber the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AttributeSet {
    pub weight: FontWeight,
    pub slant: FontSlant,
    pub underline: bool,
    pub strikethrough: bool,
    pub size: TextSize,
    pub foreground: Color,
    pub paragraph: Option<ParagraphStyle>,
    /// Marks the placeholder slot of an unresolved inline object.
    pub object: bool,
    /// Set on the placeholder text of a resolved inline object.
    pub reference: Option<ObjectRef>,
}

impl AttributeSet {
    pub fn plain() -> Self {
        Self::default()
    }

    /// Attributes for an inline object slot.
    pub fn object() -> Self {
        Self {
            object: true,
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }

    pub fn italic(mut self) -> Self {
        self.slant = FontSlant::Italic;
        self
    }

    pub fn underlined(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn struck(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    pub fn with_paragraph(mut self, style: ParagraphStyle) -> Self {
        self.paragraph = Some(style);
        self
    }

    pub fn facet(&self, facet: Facet) -> bool {
        match facet {
            Facet::Bold => self.weight == FontWeight::Bold,
            Facet::Italic => self.slant == FontSlant::Italic,
            Facet::Underline => self.underline,
            Facet::Strikethrough => self.strikethrough,
        }
    }

    pub fn set_facet(&mut self, facet: Facet, on: bool) {
        match facet {
            Facet::Bold => {
                self.weight = if on {
                    FontWeight::Bold
                } else {
                    FontWeight::Regular
                }
            }
            Facet::Italic => {
                self.slant = if on {
                    FontSlant::Italic
                } else {
                    FontSlant::Regular
                }
            }
            Facet::Underline => self.underline = on,
            Facet::Strikethrough => self.strikethrough = on,
        }
    }
}
