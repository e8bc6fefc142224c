// src/headlines.rs
//
// HTML-to-text reduction and headline extraction for scraped news pages.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Reduce raw page markup to plain text, one tag boundary per line.
/// Line structure is preserved because `extract_headlines` is line-oriented.
pub fn clean_html_to_text(html: &str) -> String {
    // 1) Drop script/style bodies entirely
    static RE_SKIP: OnceCell<Regex> = OnceCell::new();
    let re_skip = RE_SKIP
        .get_or_init(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap());
    let mut out = re_skip.replace_all(html, "").to_string();

    // 2) Tags become line boundaries
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "\n").to_string();

    // 3) HTML entity decode
    out = html_escape::decode_html_entities(&out).to_string();

    // 4) Collapse horizontal whitespace within each line, drop blank lines
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());
    out.lines()
        .map(|l| re_ws.replace_all(l, " ").trim().to_string())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract headlines from cleaned news-page text.
///
/// The scraped search page repeats a bare "More" link after each headline
/// cluster; a line exactly equal to "More" terminates a block, and the
/// block's first line is taken as the headline. Known fragility: if the
/// markup stops emitting the marker, the whole input collapses into one
/// block and only its first line survives.
pub fn extract_headlines(cleaned_text: &str) -> String {
    let mut headlines: Vec<&str> = Vec::new();
    let mut current_block: Vec<&str> = Vec::new();

    for line in cleaned_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line == "More" {
            if let Some(first) = current_block.first() {
                headlines.push(first);
            }
            current_block.clear();
        } else {
            current_block.push(line);
        }
    }

    if let Some(first) = current_block.first() {
        headlines.push(first);
    }

    headlines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_terminates_blocks() {
        assert_eq!(extract_headlines("A\nB\nMore\nC\nMore"), "A\nC");
    }

    #[test]
    fn trailing_block_is_flushed() {
        assert_eq!(extract_headlines("A\nMore\nC\nD"), "A\nC");
    }

    #[test]
    fn no_marker_degrades_to_first_line() {
        assert_eq!(extract_headlines("First\nSecond\nThird"), "First");
    }

    #[test]
    fn blank_and_padded_lines_are_ignored() {
        assert_eq!(extract_headlines("  A  \n\n   \nMore\n  B\n"), "A\nB");
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(extract_headlines(""), "");
    }

    #[test]
    fn html_is_reduced_to_lines() {
        let html = "<html><body><h3>Rate cut&nbsp;ahead</h3><a>More</a>\
                    <script>var x = 1;</script><h3>Dow &amp; co</h3><a>More</a></body></html>";
        let text = clean_html_to_text(html);
        assert_eq!(extract_headlines(&text), "Rate cut ahead\nDow & co");
    }
}
