//! Splitting assistant answers into body and citation.
//!
//! The answer service appends its attribution after a literal `Source:`
//! marker. Only the first marker is significant; anything after it,
//! including further markers, belongs to the citation.

/// Literal substring separating the answer body from its attribution
pub const CITATION_MARKER: &str = "Source:";

/// Display-time view of an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerParts<'a> {
    /// Markdown body, trimmed
    pub body: &'a str,
    /// Attribution text after the marker, trimmed. `None` when there is no marker.
    pub citation: Option<&'a str>,
}

impl AnswerParts<'_> {
    pub fn has_citation(&self) -> bool {
        self.citation.is_some()
    }

    /// Rebuild a raw answer string that extracts back to the same parts
    pub fn recombine(&self) -> String {
        match self.citation {
            Some(citation) => format!("{} {} {}", self.body, CITATION_MARKER, citation),
            None => self.body.to_string(),
        }
    }
}

/// Split `text` on the first citation marker.
pub fn extract(text: &str) -> AnswerParts<'_> {
    match text.split_once(CITATION_MARKER) {
        Some((body, citation)) => AnswerParts {
            body: body.trim(),
            citation: Some(citation.trim()),
        },
        None => AnswerParts {
            body: text.trim(),
            citation: None,
        },
    }
}
