// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Emoji markers in message text.
//!
//! Messages store emoji as `[:emoji:N:]`. Rendering escapes the text for
//! HTML and then swaps each marker for an inline image.

/// Number of emoji images shipped with the editor.
pub const EMOJI_COUNT: u32 = 108;

const MARKER_OPEN: &str = "[:emoji:";
const MARKER_CLOSE: &str = ":]";

/// The marker for emoji `n`.
pub fn marker(n: u32) -> String {
    format!("{MARKER_OPEN}{n}{MARKER_CLOSE}")
}

/// Image file name of emoji `n`.
pub fn file_name(n: u32) -> String {
    format!("1 ({n}).gif")
}

/// Inserts the marker for emoji `n` at `cursor` (in characters, clamped to
/// the text length). Returns the new text and the cursor after the marker.
pub fn insert_marker(text: &str, cursor: usize, n: u32) -> (String, usize) {
    let byte_pos = text
        .char_indices()
        .nth(cursor)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let cursor = text[..byte_pos].chars().count();
    let marker = marker(n);

    let mut out = String::with_capacity(text.len() + marker.len());
    out.push_str(&text[..byte_pos]);
    out.push_str(&marker);
    out.push_str(&text[byte_pos..]);
    (out, cursor + marker.chars().count())
}

/// Escapes `& < > " '` for HTML text and attribute contexts.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Renders message text as HTML with emoji markers replaced by images.
pub fn render_content(text: &str, base_path: &str) -> String {
    let escaped = escape_html(text);
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped.as_str();

    while let Some(start) = rest.find(MARKER_OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + MARKER_OPEN.len()..];
        let digits = after_open
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();

        if digits > 0 && after_open[digits..].starts_with(MARKER_CLOSE) {
            let index = &after_open[..digits];
            out.push_str(&format!(
                r#"<img src="{base_path}1 ({index}).gif" alt="[表情{index}]" class="inline-emoji">"#
            ));
            rest = &after_open[digits + MARKER_CLOSE.len()..];
        } else {
            out.push_str(MARKER_OPEN);
            rest = after_open;
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "./static/app/emoji/";

    #[test]
    fn test_insert_marker_counts_characters() {
        let (text, cursor) = insert_marker("你好世界", 2, 5);
        assert_eq!(text, "你好[:emoji:5:]世界");
        assert_eq!(cursor, 2 + "[:emoji:5:]".len());

        let (text, cursor) = insert_marker("ab", 10, 1);
        assert_eq!(text, "ab[:emoji:1:]");
        assert_eq!(cursor, 2 + 11);
    }

    #[test]
    fn test_render_replaces_markers() {
        let html = render_content("hi [:emoji:12:]!", BASE);
        assert_eq!(
            html,
            r#"hi <img src="./static/app/emoji/1 (12).gif" alt="[表情12]" class="inline-emoji">!"#
        );
    }

    #[test]
    fn test_render_escapes_before_replacing() {
        let html = render_content("<b>[:emoji:1:]</b>", BASE);
        assert!(html.starts_with("&lt;b&gt;<img "));
        assert!(html.ends_with("&lt;/b&gt;"));
    }

    #[test]
    fn test_malformed_markers_left_alone() {
        assert_eq!(render_content("[:emoji::]", BASE), "[:emoji::]");
        assert_eq!(render_content("[:emoji:x:]", BASE), "[:emoji:x:]");
        assert_eq!(
            render_content("[:emoji:[:emoji:3:]", BASE),
            format!(
                r#"[:emoji:<img src="{BASE}1 (3).gif" alt="[表情3]" class="inline-emoji">"#
            )
        );
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(EMOJI_COUNT), "1 (108).gif");
        assert_eq!(marker(7), "[:emoji:7:]");
    }
}
