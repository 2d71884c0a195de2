use scraper::Html;

/// Strips markup from `html`, keeping the text between tags as-is and resolving
/// character references. Broken markup is parsed leniently.
pub fn clean_text<S: AsRef<str>>(html: S) -> String {
    let html = html.as_ref();
    if html.is_empty() {
        return String::new();
    }

    Html::parse_fragment(html)
        .root_element()
        .text()
        .collect::<String>()
}

pub fn clean_optional(html: Option<&str>) -> String {
    html.map(clean_text).unwrap_or_default()
}
