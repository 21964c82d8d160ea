//! Lightweight markdown to display markup.
//!
//! Angle brackets are escaped before any other step, so the only tags in the
//! output are the ones this module emits. Emphasis patterns are non-greedy and
//! applied in a fixed order; overlapping markers may nest incorrectly, which
//! is accepted.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static UNDERLINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__(.*?)__").unwrap());
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.*?)`").unwrap());
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\n)([-*•]) (.+)").unwrap());
static PARAGRAPH_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

/// Converts reply text into display markup.
///
/// Total and deterministic. The result is meant for display only and is not
/// intended to be parsed again.
pub fn normalize(raw_text: &str) -> String {
    let escaped = raw_text.replace('<', "&lt;").replace('>', "&gt;");

    let formatted = BOLD_RE.replace_all(&escaped, "<strong>${1}</strong>");
    let formatted = ITALIC_RE.replace_all(&formatted, "<em>${1}</em>");
    let formatted = UNDERLINE_RE.replace_all(&formatted, "<u>${1}</u>");
    let formatted = CODE_RE.replace_all(&formatted, "<code>${1}</code>");

    let formatted = BULLET_RE.replace_all(&formatted, |caps: &Captures| {
        format!("\n<li>{}</li>", caps[2].trim())
    });
    let formatted = if formatted.contains("<li>") {
        format!("<ul>{}</ul>", formatted)
    } else {
        formatted.into_owned()
    };

    let formatted = PARAGRAPH_BREAK_RE.replace_all(&formatted, "</p><p>");
    let formatted = formatted.replace('\n', "<br>");

    format!("<p>{}</p>", formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_wrapped_in_paragraph() {
        assert_eq!(normalize("hello world"), "<p>hello world</p>");
        assert_eq!(normalize(""), "<p></p>");
    }

    #[test]
    fn test_bold_then_italic_in_order() {
        let out = normalize("**a** and *b*");
        assert_eq!(out, "<p><strong>a</strong> and <em>b</em></p>");
        let bold = out.find("<strong>a</strong>").unwrap();
        let italic = out.find("<em>b</em>").unwrap();
        assert!(bold < italic);
    }

    #[test]
    fn test_underline_and_code() {
        assert_eq!(
            normalize("__under__ `let x = 1;`"),
            "<p><u>under</u> <code>let x = 1;</code></p>"
        );
    }

    #[test]
    fn test_angle_brackets_are_escaped() {
        let out = normalize("<script>alert(1)</script>");
        assert_eq!(out, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>");
        assert!(!out.contains("<script>"));
    }

    #[test]
    fn test_markup_inside_emphasis_stays_escaped() {
        assert_eq!(
            normalize("**<b>loud</b>**"),
            "<p><strong>&lt;b&gt;loud&lt;/b&gt;</strong></p>"
        );
    }

    #[test]
    fn test_already_escaped_text_is_untouched() {
        let text = "a &lt; b &amp;&amp; c &gt; d";
        assert_eq!(normalize(text), format!("<p>{}</p>", text));
    }

    #[test]
    fn test_bullets_become_list_items() {
        assert_eq!(
            normalize("- one\n- two"),
            "<p><ul><br><li>one</li><br><li>two</li></ul></p>"
        );
    }

    #[test]
    fn test_all_bullet_markers() {
        let out = normalize("Options:\n- dash\n* star\n• dot");
        assert!(out.starts_with("<p><ul>Options:"));
        assert!(out.contains("<li>dash</li>"));
        assert!(out.contains("<li>star</li>"));
        assert!(out.contains("<li>dot</li>"));
        assert_eq!(out.matches("<ul>").count(), 1);
    }

    #[test]
    fn test_marker_without_space_is_not_a_bullet() {
        assert_eq!(normalize("-5 degrees"), "<p>-5 degrees</p>");
    }

    #[test]
    fn test_paragraphs_and_line_breaks() {
        assert_eq!(
            normalize("first\nline\n\n\nsecond"),
            "<p>first<br>line</p><p>second</p>"
        );
    }

    #[test]
    fn test_overlapping_markers_follow_fixed_order() {
        // Bold runs first and consumes the inner pair of asterisks
        assert_eq!(normalize("***x***"), "<p><strong><em>x</strong></em></p>");
    }

    #[test]
    fn test_deterministic() {
        let text = "**Hi** there\n- a\n- b\n\n`code`";
        assert_eq!(normalize(text), normalize(text));
    }
}
