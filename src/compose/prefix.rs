//! Id namespacing and outer-`<svg>` helpers used when several documents share one canvas.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::dirty::bounds::parse_view_box;

struct IdPatterns {
    id_attr: Regex,
    href: Regex,
    url: Regex,
    begin: Regex,
    values: Regex,
    id_ref: Regex,
}

static ID_PATTERNS: LazyLock<Option<IdPatterns>> = LazyLock::new(|| {
    Some(IdPatterns {
        id_attr: Regex::new(r#"\bid\s*=\s*["']([^"']+)["']"#).ok()?,
        href: Regex::new(r#"\b(xlink:)?href\s*=\s*["']#([^"']+)["']"#).ok()?,
        url: Regex::new(r"url\s*\(\s*#([^)\s]+)\s*\)").ok()?,
        begin: Regex::new(r#"\bbegin\s*=\s*["']([^"'.]+)\.([^"']+)["']"#).ok()?,
        values: Regex::new(r#"\bvalues\s*=\s*["']([^"']+)["']"#).ok()?,
        id_ref: Regex::new(r"#([^;#\s]+)").ok()?,
    })
});

static VIEW_BOX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"\bviewBox\s*=\s*["']([^"']+)["']"#).ok());
static WIDTH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?:^|\s)width\s*=\s*["'](\d+(?:\.\d+)?)(?:px)?["']"#).ok());
static HEIGHT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?:^|\s)height\s*=\s*["'](\d+(?:\.\d+)?)(?:px)?["']"#).ok());

/// Rewrite every id and id reference in `svg` to carry `prefix`.
///
/// Covers `id="X"`, `href`/`xlink:href="#X"`, `url(#X)`, `begin="X.event"` and `#X` references
/// inside `values="..."`. Ids referenced from CSS or scripts are not rewritten, and literal colors
/// such as `#fff` inside `values` are treated as references too.
pub fn prefix_svg_ids(svg: &str, prefix: &str) -> String {
    let Some(p) = ID_PATTERNS.as_ref() else {
        return svg.to_owned();
    };

    let out = p.id_attr.replace_all(svg, |c: &Captures<'_>| {
        format!("id=\"{prefix}{}\"", &c[1])
    });
    let out = p.href.replace_all(&out, |c: &Captures<'_>| {
        let ns = c.get(1).map_or("", |m| m.as_str());
        format!("{ns}href=\"#{prefix}{}\"", &c[2])
    });
    let out = p.url.replace_all(&out, |c: &Captures<'_>| {
        format!("url(#{prefix}{})", &c[1])
    });
    let out = p.begin.replace_all(&out, |c: &Captures<'_>| {
        let target = &c[1];
        if target.starts_with(|ch: char| ch.is_ascii_alphabetic() || ch == '_') {
            format!("begin=\"{prefix}{target}.{}\"", &c[2])
        } else {
            c[0].to_owned()
        }
    });
    let out = p.values.replace_all(&out, |c: &Captures<'_>| {
        let list = &c[1];
        if !list.contains('#') {
            return c[0].to_owned();
        }
        let list = p.id_ref.replace_all(list, |r: &Captures<'_>| {
            format!("#{prefix}{}", &r[1])
        });
        format!("values=\"{list}\"")
    });
    out.into_owned()
}

/// `(width, height)` of a document: the `viewBox` size, else its `width`/`height` attributes.
pub fn extract_view_box(svg: &str) -> Option<(f32, f32)> {
    extract_full_view_box(svg).map(|[_, _, w, h]| (w, h))
}

/// `[min_x, min_y, width, height]` of the root element: its `viewBox`, else
/// `[0, 0, width, height]` from its size attributes.
pub fn extract_full_view_box(svg: &str) -> Option<[f32; 4]> {
    let root = root_tag(svg).unwrap_or(svg);
    if let Some(vb) = VIEW_BOX
        .as_ref()
        .and_then(|re| re.captures(root))
        .and_then(|c| parse_view_box(&c[1]))
    {
        return Some(vb);
    }

    let grab = |re: &Option<Regex>| {
        re.as_ref()?
            .captures(root)
            .and_then(|c| c[1].parse::<f32>().ok())
    };
    Some([0.0, 0.0, grab(&*WIDTH)?, grab(&*HEIGHT)?])
}

pub(crate) fn root_tag(svg: &str) -> Option<&str> {
    let start = svg.find("<svg")?;
    let end = svg[start..].find('>')? + start;
    Some(&svg[start..=end])
}

/// Markup between the outer `<svg ...>` start tag and the last `</svg>`; `svg` itself when it has
/// no such wrapper.
pub fn extract_svg_content(svg: &str) -> &str {
    let Some(start) = svg.find("<svg") else {
        return svg;
    };
    let Some(tag_end) = svg[start..].find('>').map(|off| start + off) else {
        return svg;
    };
    match svg.rfind("</svg>") {
        Some(end) if end > tag_end => &svg[tag_end + 1..end],
        _ => svg,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/prefix.rs"]
mod tests;
