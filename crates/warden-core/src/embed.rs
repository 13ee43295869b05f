//! Rich message payloads and their size validation.
//!
//! The platform rejects payloads that exceed any of its size ceilings, so
//! callers validate with [`embed_check`] (or [`validate_embed`] for the
//! offending limit) before sending and truncate or split upstream on failure.
//! Lengths are counted in characters, not bytes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum combined length of all text in an embed.
pub const MAX_TOTAL: usize = 6000;
/// Maximum title length.
pub const MAX_TITLE: usize = 256;
/// Maximum description length.
pub const MAX_DESCRIPTION: usize = 4096;
/// Maximum author name length.
pub const MAX_AUTHOR_NAME: usize = 256;
/// Maximum footer text length.
pub const MAX_FOOTER: usize = 2048;
/// Maximum number of fields.
pub const MAX_FIELDS: usize = 25;
/// Maximum field name length.
pub const MAX_FIELD_NAME: usize = 1024;
/// Maximum field value length.
pub const MAX_FIELD_VALUE: usize = 2048;

/// A 24-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Colour(pub u32);

impl Colour {
    /// Red, used for error notices.
    pub const RED: Self = Self(0xe7_4c_3c);
    /// The default theme colour.
    pub const THEME: Self = Self(0x8a_c2_49);
}

/// The author block of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    /// Author name.
    pub name: String,
}

/// The footer block of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    /// Footer text.
    pub text: String,
}

/// A single name/value field of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: String,
    /// Whether the field is rendered inline.
    #[serde(default)]
    pub inline: bool,
}

/// A rich message payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<Colour>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    /// Creates an empty embed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn colour(mut self, colour: Colour) -> Self {
        self.colour = Some(colour);
        self
    }

    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.author = Some(EmbedAuthor { name: name.into() });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    /// Aggregate size of all text in the embed, as the platform counts it.
    pub fn len(&self) -> usize {
        let count = |s: &Option<String>| s.as_deref().map_or(0, |s| s.chars().count());

        count(&self.title)
            + count(&self.description)
            + self.author.as_ref().map_or(0, |a| a.name.chars().count())
            + self.footer.as_ref().map_or(0, |f| f.text.chars().count())
            + self
                .fields
                .iter()
                .map(|f| f.name.chars().count() + f.value.chars().count())
                .sum::<usize>()
    }

    /// Returns `true` if the embed carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The first platform ceiling an embed violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmbedLimitError {
    #[error("embed is {0} characters long, limit is {MAX_TOTAL}")]
    Total(usize),
    #[error("title is {0} characters long, limit is {MAX_TITLE}")]
    Title(usize),
    #[error("description is {0} characters long, limit is {MAX_DESCRIPTION}")]
    Description(usize),
    #[error("author name is {0} characters long, limit is {MAX_AUTHOR_NAME}")]
    AuthorName(usize),
    #[error("footer is {0} characters long, limit is {MAX_FOOTER}")]
    Footer(usize),
    #[error("embed has {0} fields, limit is {MAX_FIELDS}")]
    FieldCount(usize),
    #[error("field {index} name is {len} characters long, limit is {MAX_FIELD_NAME}")]
    FieldName { index: usize, len: usize },
    #[error("field {index} value is {len} characters long, limit is {MAX_FIELD_VALUE}")]
    FieldValue { index: usize, len: usize },
}

/// Validates an embed against every platform size ceiling.
pub fn validate_embed(embed: &Embed) -> Result<(), EmbedLimitError> {
    fn check(
        value: Option<&str>,
        max: usize,
        err: fn(usize) -> EmbedLimitError,
    ) -> Result<(), EmbedLimitError> {
        match value.map(|v| v.chars().count()) {
            Some(len) if len > max => Err(err(len)),
            _ => Ok(()),
        }
    }

    let total = embed.len();
    if total > MAX_TOTAL {
        return Err(EmbedLimitError::Total(total));
    }

    check(embed.title.as_deref(), MAX_TITLE, EmbedLimitError::Title)?;
    check(embed.description.as_deref(), MAX_DESCRIPTION, EmbedLimitError::Description)?;
    check(
        embed.author.as_ref().map(|a| a.name.as_str()),
        MAX_AUTHOR_NAME,
        EmbedLimitError::AuthorName,
    )?;
    check(
        embed.footer.as_ref().map(|f| f.text.as_str()),
        MAX_FOOTER,
        EmbedLimitError::Footer,
    )?;

    if embed.fields.len() > MAX_FIELDS {
        return Err(EmbedLimitError::FieldCount(embed.fields.len()));
    }
    for (index, field) in embed.fields.iter().enumerate() {
        let len = field.name.chars().count();
        if len > MAX_FIELD_NAME {
            return Err(EmbedLimitError::FieldName { index, len });
        }
        let len = field.value.chars().count();
        if len > MAX_FIELD_VALUE {
            return Err(EmbedLimitError::FieldValue { index, len });
        }
    }

    Ok(())
}

/// Returns `true` only if the embed respects every platform size ceiling.
pub fn embed_check(embed: &Embed) -> bool {
    validate_embed(embed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(len: usize) -> String {
        "a".repeat(len)
    }

    #[test]
    fn test_empty_embed_is_valid() {
        assert!(embed_check(&Embed::new()));
    }

    #[test]
    fn test_description_boundary() {
        let ok = Embed::new().title("t").description(text(MAX_DESCRIPTION));
        let too_long = Embed::new().title("t").description(text(MAX_DESCRIPTION + 1));

        assert!(embed_check(&ok));
        assert!(!embed_check(&too_long));
        assert_eq!(
            validate_embed(&too_long),
            Err(EmbedLimitError::Description(MAX_DESCRIPTION + 1))
        );
    }

    #[test]
    fn test_title_author_footer_limits() {
        assert!(!embed_check(&Embed::new().title(text(MAX_TITLE + 1))));
        assert!(!embed_check(&Embed::new().author(text(MAX_AUTHOR_NAME + 1))));
        assert!(!embed_check(&Embed::new().footer(text(MAX_FOOTER + 1))));
        assert!(embed_check(
            &Embed::new()
                .title(text(MAX_TITLE))
                .author(text(MAX_AUTHOR_NAME))
                .footer(text(MAX_FOOTER))
        ));
    }

    #[test]
    fn test_field_limits() {
        let mut embed = Embed::new();
        for i in 0..MAX_FIELDS {
            embed = embed.field(format!("f{i}"), "v", false);
        }
        assert!(embed_check(&embed));

        let embed = embed.field("one too many", "v", false);
        assert_eq!(
            validate_embed(&embed),
            Err(EmbedLimitError::FieldCount(MAX_FIELDS + 1))
        );

        let embed = Embed::new().field(text(MAX_FIELD_NAME + 1), "v", false);
        assert!(matches!(
            validate_embed(&embed),
            Err(EmbedLimitError::FieldName { index: 0, .. })
        ));

        let embed = Embed::new()
            .field("ok", "v", true)
            .field("n", text(MAX_FIELD_VALUE + 1), false);
        assert!(matches!(
            validate_embed(&embed),
            Err(EmbedLimitError::FieldValue { index: 1, .. })
        ));
    }

    #[test]
    fn test_total_limit() {
        // Every part is within its own limit, but together they exceed 6000.
        let embed = Embed::new()
            .description(text(MAX_DESCRIPTION))
            .field("n", text(MAX_FIELD_VALUE), false);
        assert_eq!(embed.len(), MAX_DESCRIPTION + 1 + MAX_FIELD_VALUE);
        assert!(matches!(validate_embed(&embed), Err(EmbedLimitError::Total(_))));
    }

    #[test]
    fn test_length_counts_characters() {
        let embed = Embed::new().title("héllo");
        assert_eq!(embed.len(), 5);
    }
}
