use crate::models::{CandidatePost, Source};
use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;

pub const MIN_POST_CHARS: usize = 15;
pub const MAX_POSTS: usize = 30;

// A line break followed by two or more whitespace-only lines
static RE_BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap());

static RE_RULE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:-{3,}|_{3,}|={3,})[ \t]*$").unwrap());

/// Divides a scraped text block into candidate listing posts
#[derive(Debug, Clone)]
pub struct Splitter {
    min_chars: usize,
    max_posts: usize,
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new(MIN_POST_CHARS, MAX_POSTS)
    }
}

impl Splitter {
    pub fn new(min_chars: usize, max_posts: usize) -> Self {
        Self { min_chars, max_posts }
    }

    /// Lazily yield trimmed fragments. Calling again restarts from the top.
    pub fn fragments<'a>(&self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        let min_chars = self.min_chars;
        let blank_run_parts = RE_BLANK_RUN
            .split(text)
            .filter(|part| !part.trim().is_empty())
            .take(2)
            .count();
        let pattern: &'static Regex = if blank_run_parts > 1 {
            &*RE_BLANK_RUN
        } else {
            &*RE_RULE_LINE
        };

        Box::new(
            pattern
                .split(text)
                .map(|part| part.trim())
                .filter(move |part| part.chars().count() >= min_chars)
                .take(self.max_posts),
        )
    }

    /// Wrap each fragment in a candidate post sharing one capture time
    pub fn posts<'a>(
        &self,
        text: &'a str,
        source: Source,
        page_url: Option<&'a str>,
    ) -> impl Iterator<Item = CandidatePost> + 'a {
        let captured_at = Utc::now();
        self.fragments(text).map(move |fragment| CandidatePost {
            text: fragment.to_string(),
            source,
            page_url: page_url.map(str::to_string),
            captured_at,
        })
    }
}

/// Normalise line endings so the separators above see plain `\n`
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
