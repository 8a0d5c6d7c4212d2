//! Stateless bounds lookup for animated elements.
//!
//! Geometry comes straight from the start tag: `x`/`y`/`width`/`height`, an additive
//! `translate(..)` from the same tag, and for `<use>`-style references the referenced element's
//! `viewBox` or size. Rotation, scaling and inherited transforms are not applied.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::animation::smil::SmilAnimation;
use crate::foundation::core::DirtyRect;
use crate::foundation::markup::{extract_attribute, find_element_by_id, parse_numeric};

static TRANSLATE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"translate\s*\(\s*([+-]?[\d.]+(?:[eE][+-]?\d+)?)\s*(?:[,\s]\s*([+-]?[\d.]+(?:[eE][+-]?\d+)?))?\s*\)",
    )
    .ok()
});

/// Bounds for every distinct animation target whose geometry can be resolved.
///
/// Targets that cannot be resolved are left out; the tracker then treats them as full-render.
#[tracing::instrument(skip(svg, animations), fields(animations = animations.len()))]
pub fn extract_animation_bounds(
    svg: &str,
    animations: &[SmilAnimation],
) -> BTreeMap<String, DirtyRect> {
    let mut out = BTreeMap::new();
    for anim in animations {
        if out.contains_key(&anim.target_id) {
            continue;
        }
        match extract_bounds_for_id(svg, &anim.target_id) {
            Some(bounds) => {
                out.insert(anim.target_id.clone(), bounds);
            }
            None => tracing::debug!(target_id = %anim.target_id, "no bounds for animation target"),
        }
    }
    out
}

/// Bounds of the element carrying `element_id`, or `None` when its size cannot be determined.
pub fn extract_bounds_for_id(svg: &str, element_id: &str) -> Option<DirtyRect> {
    let tag = find_element_by_id(svg, element_id)?.slice(svg);
    let number = |name: &str| extract_attribute(tag, name).map(parse_numeric);

    let mut x = number("x").unwrap_or(0.0);
    let mut y = number("y").unwrap_or(0.0);
    let mut width = number("width").unwrap_or(0.0);
    let mut height = number("height").unwrap_or(0.0);

    if let Some((tx, ty)) = extract_attribute(tag, "transform").and_then(parse_translate) {
        x += tx;
        y += ty;
    }

    if (width <= 0.0 || height <= 0.0)
        && let Some(ref_tag) = referenced_tag(svg, tag)
    {
        if let Some([_, _, vw, vh]) = extract_attribute(ref_tag, "viewBox").and_then(parse_view_box)
        {
            if width <= 0.0 {
                width = vw;
            }
            if height <= 0.0 {
                height = vh;
            }
        }
        if width <= 0.0
            && let Some(w) = extract_attribute(ref_tag, "width")
        {
            width = parse_numeric(w);
        }
        if height <= 0.0
            && let Some(h) = extract_attribute(ref_tag, "height")
        {
            height = parse_numeric(h);
        }
    }

    (width > 0.0 && height > 0.0).then(|| DirtyRect::new(x, y, width, height))
}

/// Start tag referenced by `xlink:href`/`href` (`#id` or `url(#id)`) on `tag`.
fn referenced_tag<'a>(svg: &'a str, tag: &str) -> Option<&'a str> {
    let href = extract_attribute(tag, "xlink:href").or_else(|| extract_attribute(tag, "href"))?;
    let after_hash = &href[href.find('#')? + 1..];
    let ref_id = after_hash.split(')').next().unwrap_or(after_hash).trim();
    if ref_id.is_empty() {
        return None;
    }
    Some(find_element_by_id(svg, ref_id)?.slice(svg))
}

/// First `translate(x[, y])` in a transform list; a missing `y` is `0`.
pub fn parse_translate(transform: &str) -> Option<(f32, f32)> {
    let caps = TRANSLATE.as_ref()?.captures(transform)?;
    let tx = caps.get(1)?.as_str().parse::<f32>().ok()?;
    let ty = match caps.get(2) {
        Some(m) => m.as_str().parse::<f32>().ok()?,
        None => 0.0,
    };
    Some((tx, ty))
}

/// `min-x min-y width height`, separated by whitespace and/or commas.
pub fn parse_view_box(value: &str) -> Option<[f32; 4]> {
    let mut out = [0.0f32; 4];
    let mut parts = value
        .split(|c: char| c.is_ascii_whitespace() || c == ',')
        .filter(|p| !p.is_empty());
    for slot in &mut out {
        *slot = parts.next()?.parse::<f32>().ok()?;
    }
    parts.next().is_none().then_some(out)
}

#[cfg(test)]
#[path = "../../tests/unit/dirty/bounds.rs"]
mod tests;
