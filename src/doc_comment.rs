//! `@tag value` extraction from `/** ... */` blocks.

use std::fmt;

use crate::advice::AdviceType;
use crate::reflection::PointcutReference;

/// A parsed doc comment. Keeps the original text and the tags in order
/// of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocComment {
    text: String,
    tags: Vec<(String, String)>,
}

impl DocComment {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let body = trimmed.strip_prefix("/**").unwrap_or(trimmed);
        let body = body.strip_suffix("*/").unwrap_or(body);

        // Line markers are split off as well, so comments joined onto a
        // single line parse the same as multi-line ones.
        let tags = body
            .lines()
            .flat_map(|line| line.split(" * "))
            .map(|segment| segment.trim().trim_start_matches('*').trim())
            .filter_map(|segment| segment.strip_prefix('@'))
            .filter_map(|tagged| {
                let end = tagged
                    .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '\\')))
                    .unwrap_or(tagged.len());
                let (name, value) = tagged.split_at(end);
                (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
            })
            .collect();

        Self {
            text: text.to_string(),
            tags,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|(tag, _)| tag == name)
    }

    /// Values of every `@name` tag in order. A tag without a value
    /// yields `""`.
    #[must_use]
    pub fn tags(&self, name: &str) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|(tag, _)| tag == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// True if any advice tag is present.
    #[must_use]
    pub fn references_pointcut(&self) -> bool {
        AdviceType::ALL.iter().any(|t| self.has_tag(t.tag()))
    }

    /// The advice tags as pointcut references, grouped by advice type.
    #[must_use]
    pub fn pointcut_references(&self) -> Vec<PointcutReference> {
        AdviceType::ALL
            .iter()
            .flat_map(|&advice_type| {
                self.tags(advice_type.tag())
                    .into_iter()
                    .map(move |value| PointcutReference::new(advice_type, value))
            })
            .collect()
    }
}

impl fmt::Display for DocComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
