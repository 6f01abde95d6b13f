//! Helpers for the collection paths that feed text into the pipeline:
//! saved page selections and per-platform post links.

use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::sync::LazyLock;

static RE_FB_GROUP_POST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https://www\.facebook\.com/groups/[^/?#]+/posts/\d+)").unwrap()
});
static RE_FB_STORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"story\.php\?story_fbid=(\d+)&id=(\d+)").unwrap());

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "br", "hr", "tr", "table", "section", "article", "h1", "h2",
    "h3", "h4", "h5", "h6", "blockquote", "pre",
];
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Visible text of an HTML page or selection. Block elements are separated
/// by two blank lines so each becomes its own candidate post.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    collect_text(document.root_element(), &mut blocks, &mut current);
    flush(&mut blocks, &mut current);
    blocks.join("\n\n\n")
}

fn collect_text(element: ElementRef<'_>, blocks: &mut Vec<String>, current: &mut String) {
    let name = element.value().name();
    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }
    let is_block = BLOCK_ELEMENTS.contains(&name);
    if is_block {
        flush(blocks, current);
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => current.push_str(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, blocks, current);
                }
            }
            _ => {}
        }
    }

    if is_block {
        flush(blocks, current);
    }
}

fn flush(blocks: &mut Vec<String>, current: &mut String) {
    let text = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !text.is_empty() {
        blocks.push(text);
    }
    current.clear();
}

/// Canonical group-post link for Facebook post URLs
pub fn normalize_facebook_url(url: &str) -> String {
    if let Some(caps) = RE_FB_GROUP_POST.captures(url) {
        return format!("{}/", &caps[1]);
    }
    if let Some(caps) = RE_FB_STORY.captures(url) {
        return format!(
            "https://www.facebook.com/groups/{}/posts/{}/",
            &caps[2], &caps[1]
        );
    }
    url.to_string()
}

/// Link to a Telegram message, public username first, then the chat id
pub fn telegram_link(username: Option<&str>, chat_id: Option<i64>, message_id: i64) -> Option<String> {
    if let Some(username) = username.filter(|u| !u.is_empty()) {
        return Some(format!("https://t.me/{}/{}", username, message_id));
    }
    let id = chat_id?.to_string();
    let clean = id
        .strip_prefix("-100")
        .or_else(|| id.strip_prefix('-'))
        .unwrap_or(&id);
    Some(format!("https://t.me/c/{}/{}", clean, message_id))
}
