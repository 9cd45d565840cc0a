//! Member-name extraction from guild profile pages.
//!
//! Three page layouts have been seen in the wild; they are tried in order and
//! the first one yielding any names wins.

use anyhow::Result;
use regex::Regex;

const MEMBER_LIST_PATTERN: &str =
    r#"(?is)<ul[^>]*class\s*=\s*["'][^"']*\b_guild_member_list\b[^"']*["'][^>]*>(?P<body>.*?)</ul>"#;
const MEMBER_ITEM_PATTERN: &str =
    r#"(?is)<li[^>]*class\s*=\s*["'][^"']*\b_list_item\b[^"']*["'][^>]*>(?P<item>.*?)</li>"#;
const ITEM_NAME_PATTERN: &str = r#"(?is)<a[^>]*>.*?<span[^>]*>(?P<name>.*?)</span>"#;

const ADVENTURE_TABLE_PATTERN: &str = r#"(?is)class\s*=\s*["'][^"']*\bguild_name\b[^"']*["'][^>]*>.*?class\s*=\s*["'][^"']*\btext\b[^"']*["'][^>]*>.*?<a[^>]*>(?P<name>.*?)</a>"#;

const SIMPLEBAR_MARKER: &str = "simplebar-content";
const SIMPLEBAR_NAME_PATTERN: &str = r#"(?is)<span[^>]*class\s*=\s*["'][^"']*\bwhitespace-nowrap\b[^"']*["'][^>]*>(?P<name>.*?)</span>"#;

fn strip_html_tags(input: &str) -> Result<String> {
    let tags_re = Regex::new(r"(?is)<[^>]+>")?;
    Ok(tags_re.replace_all(input, "").to_string())
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn clean_name(raw: &str) -> Result<Option<String>> {
    let text = decode_entities(&strip_html_tags(raw)?);
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

fn member_list_names(html: &str) -> Result<Vec<String>> {
    let list_re = Regex::new(MEMBER_LIST_PATTERN)?;
    let item_re = Regex::new(MEMBER_ITEM_PATTERN)?;
    let name_re = Regex::new(ITEM_NAME_PATTERN)?;

    let mut names = Vec::new();
    for list in list_re.captures_iter(html) {
        let Some(body) = list.name("body") else {
            continue;
        };
        for item in item_re.captures_iter(body.as_str()) {
            let Some(item) = item.name("item") else {
                continue;
            };
            if let Some(name) = name_re.captures(item.as_str()).and_then(|c| c.name("name")) {
                names.extend(clean_name(name.as_str())?);
            }
        }
    }
    Ok(names)
}

fn captured_names(html: &str, pattern: &str) -> Result<Vec<String>> {
    let re = Regex::new(pattern)?;
    let mut names = Vec::new();
    for capture in re.captures_iter(html) {
        if let Some(name) = capture.name("name") {
            names.extend(clean_name(name.as_str())?);
        }
    }
    Ok(names)
}

/// Extracts family names from a guild profile page. Empty when no layout matched.
pub fn parse_roster_html(html: &str) -> Result<Vec<String>> {
    let names = member_list_names(html)?;
    if !names.is_empty() {
        return Ok(names);
    }

    let names = captured_names(html, ADVENTURE_TABLE_PATTERN)?;
    if !names.is_empty() {
        return Ok(names);
    }

    match html.find(SIMPLEBAR_MARKER) {
        Some(start) => captured_names(&html[start..], SIMPLEBAR_NAME_PATTERN),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_list_layout() {
        let html = r#"
            <div class="guild_info">
              <ul class="_guild_member_list member_list">
                <li class="_list_item"><a href="/p/1"><span>Anghar</span></a></li>
                <li class="_list_item on"><a href="/p/2"><em>★</em><span> JVP </span></a></li>
                <li class="_list_item"><a href="/p/3"><span></span></a></li>
              </ul>
            </div>
        "#;
        assert_eq!(parse_roster_html(html).unwrap(), vec!["Anghar", "JVP"]);
    }

    #[test]
    fn test_adventure_table_layout() {
        let html = r#"
            <div class="box_list_area"><ul class="adventure_list_table">
              <li><div class="guild_name"><span class="text"><a href="/p/1">Tom &amp; Co</a></span></div></li>
              <li><div class="guild_name"><span class="text"><a href="/p/2">Bob</a></span></div></li>
            </ul></div>
        "#;
        assert_eq!(parse_roster_html(html).unwrap(), vec!["Tom & Co", "Bob"]);
    }

    #[test]
    fn test_simplebar_layout() {
        let html = r#"
            <a href="/nav"><span class="whitespace-nowrap">Home</span></a>
            <div class="simplebar-content">
              <a href="/p/1"><img/><span class="truncate whitespace-nowrap">Cid</span></a>
              <a href="/p/2"><span class="whitespace-nowrap">Dee</span></a>
            </div>
        "#;
        assert_eq!(parse_roster_html(html).unwrap(), vec!["Cid", "Dee"]);
    }

    #[test]
    fn test_unknown_layout_is_empty() {
        assert!(parse_roster_html("<html><body>Guild not found</body></html>")
            .unwrap()
            .is_empty());
    }
}
