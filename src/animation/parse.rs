use crate::animation::smil::SmilAnimation;
use crate::foundation::markup::{extract_attribute, numeric_prefix_len};

/// Prefix of ids injected into anonymous animated `<use>` elements.
pub const SYNTHETIC_ID_PREFIX: &str = "_smil_target_";

/// Options controlling [`preprocess_svg`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PreprocessOpts {
    /// Rewrite `<symbol>` elements to `<g>`.
    pub convert_symbols_to_groups: bool,
    /// Inject `_smil_target_N` ids into `<use>` elements that animate but carry no id.
    pub inject_synthetic_ids: bool,
}

impl Default for PreprocessOpts {
    fn default() -> Self {
        Self {
            convert_symbols_to_groups: false,
            inject_synthetic_ids: true,
        }
    }
}

/// An id injected by [`preprocess_svg`], with the byte offset of the `<use` it was added to.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SyntheticId {
    /// Offset of the `<use` tag in the preprocessed markup.
    pub offset: usize,
    /// The injected id.
    pub id: String,
}

/// Markup after preprocessing, plus the ids that were injected into it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preprocessed {
    /// Rewritten SVG text.
    pub content: String,
    /// Injected ids in document order.
    pub synthetic_ids: Vec<SyntheticId>,
}

/// Offsets of every `<{name}` start tag in `content` (the name must be followed by a tag boundary).
fn tag_starts<'a>(content: &'a str, name: &'a str) -> impl Iterator<Item = usize> + 'a {
    let needle_len = name.len() + 1;
    content
        .match_indices('<')
        .map(|(pos, _)| pos)
        .filter(move |&pos| {
            let rest = &content[pos + 1..];
            rest.starts_with(name)
                && matches!(
                    content.as_bytes().get(pos + needle_len),
                    Some(b' ' | b'\t' | b'\n' | b'\r' | b'/' | b'>')
                )
        })
}

fn is_self_closing(tag: &str) -> bool {
    tag.trim_end_matches('>').trim_end().ends_with('/')
}

/// Parse a SMIL duration into seconds.
///
/// Accepts a number with an optional `ms`, `s`, `min` or `h` unit, and clock values
/// (`MM:SS(.fff)`, `HH:MM:SS(.fff)`). Unknown units are read as seconds; anything unparseable is `0`.
pub fn parse_duration(value: &str) -> f64 {
    let value = value.trim();
    if value.is_empty() || value == "indefinite" {
        return 0.0;
    }

    if value.contains(':') {
        let parts: Vec<f64> = value
            .split(':')
            .map(|p| p.trim().parse::<f64>().unwrap_or(f64::NAN))
            .collect();
        let seconds = match parts.as_slice() {
            [m, s] => m * 60.0 + s,
            [h, m, s] => h * 3600.0 + m * 60.0 + s,
            _ => f64::NAN,
        };
        return if seconds.is_finite() { seconds } else { 0.0 };
    }

    let len = numeric_prefix_len(value);
    if len == 0 {
        return 0.0;
    }
    let Ok(number) = value[..len].parse::<f64>() else {
        return 0.0;
    };

    match value[len..].trim() {
        "ms" => number / 1000.0,
        "min" => number * 60.0,
        "h" => number * 3600.0,
        _ => number,
    }
}

/// `repeatCount="indefinite"`, a count above one, or `repeatDur="indefinite"`.
fn parse_repeat(tag: &str) -> bool {
    if extract_attribute(tag, "repeatDur").is_some_and(|v| v.trim() == "indefinite") {
        return true;
    }
    match extract_attribute(tag, "repeatCount").map(str::trim) {
        Some("indefinite") => true,
        Some(count) => count.parse::<f64>().is_ok_and(|n| n > 1.0),
        None => false,
    }
}

fn split_values(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Resolve the id of the element an `<animate>` at `animate_pos` drives.
///
/// Explicit `href`/`xlink:href="#id"` wins; otherwise the nearest enclosing (unclosed) `<use>`,
/// otherwise the nearest preceding `<g>` that has an id.
fn resolve_target(content: &str, animate_pos: usize, animate_tag: &str) -> Option<String> {
    let href = extract_attribute(animate_tag, "xlink:href")
        .or_else(|| extract_attribute(animate_tag, "href"));
    if let Some(id) = href.and_then(|h| h.strip_prefix('#'))
        && !id.is_empty()
    {
        return Some(id.to_owned());
    }

    let before = &content[..animate_pos];

    if let Some(use_pos) = tag_starts(before, "use").last()
        && !before[use_pos..].contains("</use>")
    {
        let tag_end = before[use_pos..].find('>').map(|off| use_pos + off)?;
        let tag = &before[use_pos..=tag_end];
        if !is_self_closing(tag) {
            return extract_attribute(tag, "id")
                .filter(|id| !id.is_empty())
                .map(str::to_owned);
        }
    }

    let group_starts: Vec<usize> = tag_starts(before, "g").collect();
    group_starts.into_iter().rev().find_map(|pos| {
        let end = before[pos..].find('>').map(|off| pos + off)?;
        extract_attribute(&before[pos..=end], "id")
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
    })
}

/// Extract every `<animate>` element from `content`.
///
/// Elements without values or without a resolvable target are skipped. `<animateTransform>` and
/// `<animateMotion>` are not matched.
pub fn parse_animations(content: &str) -> Vec<SmilAnimation> {
    let mut animations = Vec::new();
    let mut rejected = 0usize;

    for pos in tag_starts(content, "animate") {
        let Some(tag_end) = content[pos..].find('>').map(|off| pos + off) else {
            break;
        };
        let tag = &content[pos..=tag_end];

        let values = extract_attribute(tag, "values")
            .map(split_values)
            .unwrap_or_default();
        let target = resolve_target(content, pos, tag);

        let (Some(target_id), false) = (target, values.is_empty()) else {
            rejected += 1;
            tracing::debug!(
                offset = pos,
                has_values = !values.is_empty(),
                attribute = extract_attribute(tag, "attributeName").unwrap_or(""),
                "rejected <animate> without target or values"
            );
            continue;
        };

        let anim = SmilAnimation {
            target_id,
            attribute_name: extract_attribute(tag, "attributeName")
                .unwrap_or_default()
                .to_owned(),
            values,
            duration: extract_attribute(tag, "dur")
                .map(parse_duration)
                .unwrap_or(0.0),
            repeat: parse_repeat(tag),
            calc_mode: extract_attribute(tag, "calcMode")
                .filter(|m| !m.is_empty())
                .unwrap_or("discrete")
                .to_owned(),
        };
        tracing::debug!(
            target_id = %anim.target_id,
            attribute = %anim.attribute_name,
            frames = anim.values.len(),
            duration = anim.duration,
            calc_mode = %anim.calc_mode,
            "parsed <animate>"
        );
        animations.push(anim);
    }

    if rejected > 0 && animations.is_empty() {
        tracing::debug!(rejected, "no <animate> element had both a target and values");
    }
    animations
}

/// Rewrite `<symbol>` start and end tags to `<g>`.
pub fn convert_symbols_to_groups(content: &str) -> String {
    let starts: Vec<usize> = tag_starts(content, "symbol").collect();
    if starts.is_empty() {
        return content.to_owned();
    }

    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for pos in starts {
        out.push_str(&content[last..pos]);
        out.push_str("<g");
        last = pos + "<symbol".len();
    }
    out.push_str(&content[last..]);
    out.replace("</symbol>", "</g>")
}

fn has_animate_child(content: &str, tag_end: usize) -> bool {
    let after = &content[tag_end + 1..];
    let Some(animate) = tag_starts(after, "animate").next() else {
        return false;
    };
    match after.find("</use>") {
        Some(close) => animate < close,
        None => tag_starts(after, "use").next().is_none_or(|next| animate < next),
    }
}

/// Prepare raw markup for parsing and rasterization.
///
/// Optionally converts symbols to groups, then gives every id-less, non-self-closing `<use>` that
/// contains an `<animate>` child an id of the form `_smil_target_N` so the animation can target it.
pub fn preprocess_svg(content: &str, opts: &PreprocessOpts) -> Preprocessed {
    let mut result = if opts.convert_symbols_to_groups {
        convert_symbols_to_groups(content)
    } else {
        content.to_owned()
    };
    let mut synthetic_ids = Vec::new();
    if !opts.inject_synthetic_ids {
        return Preprocessed {
            content: result,
            synthetic_ids,
        };
    }

    let mut search = 0;
    loop {
        let next = tag_starts(&result[search..], "use").next();
        let Some(pos) = next.map(|p| search + p) else {
            break;
        };
        let Some(tag_end) = result[pos..].find('>').map(|off| pos + off) else {
            break;
        };
        let tag = &result[pos..=tag_end];
        search = tag_end + 1;

        if extract_attribute(tag, "id").is_some()
            || is_self_closing(tag)
            || !has_animate_child(&result, tag_end)
        {
            continue;
        }

        let id = format!("{SYNTHETIC_ID_PREFIX}{}", synthetic_ids.len());
        let insertion = format!(" id=\"{id}\"");
        result.insert_str(pos + "<use".len(), &insertion);
        search += insertion.len();
        tracing::debug!(%id, offset = pos, "injected synthetic id into <use>");
        synthetic_ids.push(SyntheticId { offset: pos, id });
    }

    Preprocessed {
        content: result,
        synthetic_ids,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/parse.rs"]
mod tests;
