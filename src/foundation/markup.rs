//! String-level helpers over raw SVG markup.
//!
//! These stay below a real XML parser: they understand start tags, quoted attribute
//! values and `id` lookups, which is all the animation, bounds and compositor code needs for the
//! controlled frame-by-frame SVG subset. CSS selectors in `<style>` and scripts are not seen.

use std::ops::Range;

/// Byte span of a start tag inside a document, `start` at `<` and `end` at the closing `>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagSpan {
    /// Offset of the opening `<`.
    pub start: usize,
    /// Offset of the closing `>` (inclusive).
    pub end: usize,
}

impl TagSpan {
    /// The tag text including both angle brackets.
    pub fn slice<'a>(&self, svg: &'a str) -> &'a str {
        &svg[self.start..=self.end]
    }
}

/// Byte range of the value of attribute `name` inside `tag`, without the quotes.
///
/// The name must start at an attribute boundary (preceded by whitespace), so `href` does not
/// match inside `xlink:href` and `x` does not match inside `rx`.
pub fn attribute_value_range(tag: &str, name: &str) -> Option<Range<usize>> {
    if name.is_empty() {
        return None;
    }
    let bytes = tag.as_bytes();

    for (pos, _) in tag.match_indices(name) {
        if pos == 0 || !bytes[pos - 1].is_ascii_whitespace() {
            continue;
        }

        let mut i = pos + name.len();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let quote = match bytes.get(i) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => continue,
        };
        let value_start = i + 1;
        let value_end = tag[value_start..]
            .find(char::from(quote))
            .map(|off| value_start + off)?;
        return Some(value_start..value_end);
    }

    None
}

/// Value of attribute `name` inside a single start tag (either quote style).
pub fn extract_attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    attribute_value_range(tag, name).map(|r| &tag[r])
}

/// Element name of a start tag (`"use"` for `<use x="1">`).
pub fn tag_name(tag: &str) -> &str {
    let body = tag.strip_prefix('<').unwrap_or(tag);
    let end = body
        .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        .unwrap_or(body.len());
    &body[..end]
}

/// Locate the start tag carrying `id="element_id"` or `id='element_id'`.
///
/// The earliest match in the document wins; duplicate ids later in the file are ignored.
pub fn find_element_by_id(svg: &str, element_id: &str) -> Option<TagSpan> {
    if element_id.is_empty() {
        return None;
    }
    let double = format!("id=\"{element_id}\"");
    let single = format!("id='{element_id}'");
    let bytes = svg.as_bytes();

    let first_match = |pattern: &str| {
        svg.match_indices(pattern)
            .map(|(pos, _)| pos)
            .find(|&pos| pos > 0 && bytes[pos - 1].is_ascii_whitespace())
    };

    let found = match (first_match(&double), first_match(&single)) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => return None,
    };

    let start = svg[..found].rfind('<')?;
    let end = found + svg[found..].find('>')?;
    Some(TagSpan { start, end })
}

/// Parse the leading numeric prefix of an attribute value.
///
/// Unit suffixes (`px`, `em`, `%` …) are ignored and percentages are returned as raw numbers, not
/// resolved against any viewport. Anything unparseable yields `0.0`.
pub fn parse_numeric(value: &str) -> f32 {
    let s = value.trim_start();
    let len = numeric_prefix_len(s);
    if len == 0 {
        return 0.0;
    }
    s[..len].parse::<f32>().unwrap_or(0.0)
}

/// Length of the longest prefix of `s` that forms a decimal float literal.
pub(crate) fn numeric_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            i = j;
        }
    }
    if digits == 0 {
        return 0;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// Escape the five XML special characters.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 10);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Set attribute `name` on the element with id `element_id`, in place.
///
/// Replaces an existing value or inserts the attribute right after the element name. Returns
/// `false` (leaving `svg` untouched) when no element carries that id.
pub fn set_attribute(svg: &mut String, element_id: &str, name: &str, value: &str) -> bool {
    let Some(span) = find_element_by_id(svg, element_id) else {
        return false;
    };
    let escaped = escape_xml(value);
    let tag = span.slice(svg);

    if let Some(range) = attribute_value_range(tag, name) {
        let abs = (span.start + range.start)..(span.start + range.end);
        svg.replace_range(abs, &escaped);
        return true;
    }

    let insert_at = span.start + 1 + tag_name(tag).len();
    svg.insert_str(insert_at, &format!(" {name}=\"{escaped}\""));
    true
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/markup.rs"]
mod tests;
