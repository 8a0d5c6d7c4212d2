use super::*;

#[test]
fn attribute_lookup_respects_boundaries() {
    let tag = r##"<use xlink:href="#a" rx="3" x = '7px' width="10">"##;
    assert_eq!(extract_attribute(tag, "xlink:href"), Some("#a"));
    assert_eq!(extract_attribute(tag, "href"), None);
    assert_eq!(extract_attribute(tag, "x"), Some("7px"));
    assert_eq!(extract_attribute(tag, "rx"), Some("3"));
    assert_eq!(extract_attribute(tag, "height"), None);
}

#[test]
fn tag_name_stops_at_whitespace_or_close() {
    assert_eq!(tag_name("<use x=\"1\">"), "use");
    assert_eq!(tag_name("<g>"), "g");
    assert_eq!(tag_name("<rect/>"), "rect");
}

#[test]
fn find_element_by_id_takes_first_match_in_either_quote_style() {
    let svg = r#"<svg><rect id='b' width="1"/><g id="a"><rect id="b" width="2"/></g></svg>"#;
    let span = find_element_by_id(svg, "b").unwrap();
    assert_eq!(span.slice(svg), r#"<rect id='b' width="1"/>"#);

    let span = find_element_by_id(svg, "a").unwrap();
    assert_eq!(span.slice(svg), r#"<g id="a">"#);

    assert!(find_element_by_id(svg, "missing").is_none());
}

#[test]
fn find_element_by_id_ignores_prefixed_attributes() {
    let svg = r#"<svg><rect data-id="a"/><circle id="a" r="1"/></svg>"#;
    let span = find_element_by_id(svg, "a").unwrap();
    assert_eq!(tag_name(span.slice(svg)), "circle");
}

#[test]
fn parse_numeric_takes_leading_prefix() {
    assert_eq!(parse_numeric("100px"), 100.0);
    assert_eq!(parse_numeric("50.5%"), 50.5);
    assert_eq!(parse_numeric(" -2.5em"), -2.5);
    assert_eq!(parse_numeric("1e2"), 100.0);
    assert_eq!(parse_numeric("3e"), 3.0);
    assert_eq!(parse_numeric(".5"), 0.5);
    assert_eq!(parse_numeric("abc"), 0.0);
    assert_eq!(parse_numeric(""), 0.0);
    assert_eq!(parse_numeric("-"), 0.0);
}

#[test]
fn escape_xml_covers_specials() {
    assert_eq!(escape_xml(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&apos;");
}

#[test]
fn set_attribute_replaces_or_inserts() {
    let mut svg = String::from(r##"<svg><use id="u" xlink:href="#f1"/><rect id="r"/></svg>"##);
    assert!(set_attribute(&mut svg, "u", "xlink:href", "#f2"));
    assert!(svg.contains(r##"xlink:href="#f2""##));

    assert!(set_attribute(&mut svg, "r", "opacity", "0.5"));
    assert!(svg.contains(r#"<rect opacity="0.5" id="r"/>"#));

    let before = svg.clone();
    assert!(!set_attribute(&mut svg, "nope", "opacity", "1"));
    assert_eq!(svg, before);
}
