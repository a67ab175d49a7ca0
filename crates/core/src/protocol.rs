//! Tag protocol codec.
//!
//! Models talk back to the loops in free-form text that carries structured
//! signals inside fixed delimiters: `<thought>`, `<tool_call>`, `<response>`,
//! and, fed back the other way, `<observation>` and `<question>`. This module
//! is the only place that parses them.

use regex_lite::Regex;

/// The fixed tag names of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Thought,
    ToolCall,
    Response,
    Observation,
    Question,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thought => "thought",
            Self::ToolCall => "tool_call",
            Self::Response => "response",
            Self::Observation => "observation",
            Self::Question => "question",
        }
    }

    /// Extract every segment of this tag from `text`.
    pub fn extract(&self, text: &str) -> TagContent {
        extract(text, self.as_str())
    }

    /// Render `body` enclosed in this tag.
    pub fn wrap(&self, body: &str) -> String {
        wrap(self.as_str(), body)
    }
}

/// The segments found for one tag, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagContent {
    pub segments: Vec<String>,
    pub found: bool,
}

impl TagContent {
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }
}

/// Find all non-overlapping `<tag>...</tag>` blocks in `text`.
///
/// Content may span lines. Each segment is trimmed. Nesting is not
/// supported; adjacent blocks of the same tag are separate segments.
pub fn extract(text: &str, tag: &str) -> TagContent {
    let tag = regex_lite::escape(tag);
    let pattern = format!(r"(?s)<{tag}>(.*?)</{tag}>");
    let segments: Vec<String> = match Regex::new(&pattern) {
        Ok(re) => re
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .collect(),
        Err(_) => Vec::new(),
    };
    TagContent {
        found: !segments.is_empty(),
        segments,
    }
}

/// Render `body` enclosed in `<tag>` delimiters.
pub fn wrap(tag: &str, body: &str) -> String {
    format!("<{tag}>{body}</{tag}>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_occurrences() {
        let content = extract("plain text without tags", "response");
        assert!(!content.found);
        assert!(content.segments.is_empty());
        assert_eq!(content.first(), None);
    }

    #[test]
    fn segments_are_trimmed_and_ordered() {
        let text = "<thought>  first </thought> noise <thought>\nsecond\n</thought>";
        let content = Tag::Thought.extract(text);
        assert!(content.found);
        assert_eq!(content.segments, ["first", "second"]);
    }

    #[test]
    fn multiline_tool_calls() {
        let text = r#"<thought>Need the weather</thought>
<tool_call>
{"name": "get_weather", "arguments": {"city": "Paris"}, "id": 0}
</tool_call>
<tool_call>{"name": "get_weather", "arguments": {"city": "London"}, "id": 1}</tool_call>"#;
        let content = Tag::ToolCall.extract(text);
        assert_eq!(content.segments.len(), 2);
        assert!(content.segments[0].starts_with('{'));
        assert!(content.segments[1].contains("London"));
    }

    #[test]
    fn adjacent_blocks_are_independent() {
        let content = extract("<response>a</response><response>b</response>", "response");
        assert_eq!(content.segments, ["a", "b"]);
    }

    #[test]
    fn other_tags_are_ignored() {
        let text = "<thought>x</thought><response>The answer is 4</response>";
        assert_eq!(Tag::Response.extract(text).first(), Some("The answer is 4"));
        assert!(!Tag::ToolCall.extract(text).found);
    }

    #[test]
    fn unterminated_tag_is_not_a_match() {
        assert!(!extract("<response>dangling", "response").found);
    }

    #[test]
    fn count_matches_occurrences() {
        for k in 0..5 {
            let text: String = (0..k)
                .map(|i| format!("pre <tool_call> {i} </tool_call>\n"))
                .collect();
            let content = extract(&text, "tool_call");
            assert_eq!(content.segments.len(), k);
            assert_eq!(content.found, k > 0);
            for (i, segment) in content.segments.iter().enumerate() {
                assert_eq!(segment, &i.to_string());
            }
        }
    }

    #[test]
    fn wrap_renders_delimiters() {
        assert_eq!(Tag::Question.wrap("What is 2+2?"), "<question>What is 2+2?</question>");
        assert_eq!(wrap("observation", "{}"), "<observation>{}</observation>");
    }
}
