//! Page title extraction.
//!
//! Pulls the text of the first `<title>` element out of an HTML document.

/// Extracts the document title, or `None` when the page has no non-empty `<title>`.
///
/// Tag matching is case-insensitive. Markup nested inside the title is
/// stripped, common entities are decoded, and whitespace runs collapse to a
/// single space.
pub fn extract_title(html: &str) -> Option<String> {
    let inner = extract_between_tags(html, "title")?;
    let text = decode_entities(&strip_tags(inner));
    let title = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Returns the raw content between the first `<tag ...>` and the matching `</tag>`.
fn extract_between_tags<'a>(html: &'a str, tag: &str) -> Option<&'a str> {
    // ASCII lowercasing keeps byte offsets identical to the original.
    let lower = html.to_ascii_lowercase();
    let open = format!("<{}", tag);
    let close = format!("</{}", tag);

    let mut search_from = 0;
    let start = loop {
        let idx = search_from + lower[search_from..].find(&open)?;
        let next = lower[idx + open.len()..].chars().next();
        // Skip longer tag names sharing the prefix, e.g. `<titlebar>`.
        if matches!(next, Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r') | Some('/')) {
            break idx;
        }
        search_from = idx + open.len();
    };

    let content_start = start + lower[start..].find('>')? + 1;
    let content_end = content_start + lower[content_start..].find(&close)?;
    Some(&html[content_start..content_end])
}

/// Strips HTML tags to get plain text.
fn strip_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').filter(|&end| end <= 10) {
            Some(end) => {
                let entity = &tail[1..end];
                match decode_entity(entity) {
                    Some(ch) => out.push(ch),
                    None => out.push_str(&tail[..=end]),
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = entity.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
