use super::*;

#[test]
fn prefixes_ids_and_every_reference_form() {
    let svg = r##"<svg><defs><g id="f1"/><linearGradient id='grad'/></defs><use id="u" xlink:href="#f1" fill="url( #grad )"><animate id="a1" attributeName="xlink:href" values="#f1; #f2" begin="a0.end" dur="1s"/></use><use href="#f2"/></svg>"##;
    let out = prefix_svg_ids(svg, "c0_");

    for expected in [
        r#"id="c0_f1""#,
        r#"id="c0_grad""#,
        r#"id="c0_u""#,
        r#"id="c0_a1""#,
        r##"xlink:href="#c0_f1""##,
        r##"url(#c0_grad)"##,
        r##"values="#c0_f1; #c0_f2""##,
        r#"begin="c0_a0.end""#,
        r##"<use href="#c0_f2"/>"##,
    ] {
        assert!(out.contains(expected), "missing {expected} in {out}");
    }
    assert!(!out.contains(r#"id="f1""#));
}

#[test]
fn leaves_unrelated_attributes_alone() {
    let svg = r##"<svg><rect grid="1" width="2"/><animate values="0;1" begin="0.5s" href="http://x/"/></svg>"##;
    assert_eq!(prefix_svg_ids(svg, "p_"), svg);
}

#[test]
fn view_box_and_size_fallback() {
    assert_eq!(
        extract_full_view_box(r#"<svg viewBox="-5 -5 50 40" width="10"><symbol viewBox="0 0 1 1"/></svg>"#),
        Some([-5.0, -5.0, 50.0, 40.0])
    );
    assert_eq!(
        extract_view_box(r#"<svg width="320px" height='240'><rect stroke-width="9"/></svg>"#),
        Some((320.0, 240.0))
    );
    assert_eq!(
        extract_view_box(r#"<svg stroke-width="3" height="5"></svg>"#),
        None
    );
    assert_eq!(extract_view_box("<g/>"), None);
}

#[test]
fn inner_content_extraction() {
    assert_eq!(
        extract_svg_content(r#"<?xml version="1.0"?><svg a="1"><g/><svg><rect/></svg></svg>"#),
        "<g/><svg><rect/></svg>"
    );
    assert_eq!(extract_svg_content("<g/>"), "<g/>");
    assert_eq!(extract_svg_content("<svg>"), "<svg>");
}
