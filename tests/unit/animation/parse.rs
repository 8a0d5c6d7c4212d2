use super::*;

#[test]
fn durations_with_units_and_clock_values() {
    assert_eq!(parse_duration("2s"), 2.0);
    assert_eq!(parse_duration("2"), 2.0);
    assert_eq!(parse_duration(" 500ms "), 0.5);
    assert_eq!(parse_duration("1.5min"), 90.0);
    assert_eq!(parse_duration("2h"), 7200.0);
    assert_eq!(parse_duration("01:30"), 90.0);
    assert_eq!(parse_duration("1:00:02.5"), 3602.5);
    assert_eq!(parse_duration("0.04166s"), 0.04166);
    assert_eq!(parse_duration("3parsecs"), 3.0);
    assert_eq!(parse_duration("fast"), 0.0);
    assert_eq!(parse_duration(""), 0.0);
    assert_eq!(parse_duration("indefinite"), 0.0);
    assert_eq!(parse_duration("a:b"), 0.0);
}

#[test]
fn animate_inside_use_targets_the_use() {
    let svg = r##"<svg>
  <use id="player" xlink:href="#f1">
    <animate attributeName="xlink:href" values="#f1; #f2 ;#f3;;" dur="1s" repeatCount="indefinite"/>
  </use>
</svg>"##;
    let anims = parse_animations(svg);
    assert_eq!(anims.len(), 1);
    let a = &anims[0];
    assert_eq!(a.target_id, "player");
    assert_eq!(a.attribute_name, "xlink:href");
    assert_eq!(a.values, vec!["#f1", "#f2", "#f3"]);
    assert_eq!(a.duration, 1.0);
    assert!(a.repeat);
    assert_eq!(a.calc_mode, "discrete");
}

#[test]
fn explicit_href_wins_over_parent() {
    let svg = r##"<svg><g id="outer"><animate href="#ring" attributeName="opacity" values="0;1" dur="2s" calcMode="linear"/></g></svg>"##;
    let anims = parse_animations(svg);
    assert_eq!(anims[0].target_id, "ring");
    assert_eq!(anims[0].calc_mode, "linear");
    assert!(!anims[0].repeat);
}

#[test]
fn closed_use_falls_back_to_group() {
    let svg = r##"<svg>
  <g id="grp">
    <use id="done" xlink:href="#a"></use>
    <use xlink:href="#b"/>
    <animate attributeName="opacity" values="0;1" dur="1s" repeatCount="3"/>
  </g>
</svg>"##;
    let anims = parse_animations(svg);
    assert_eq!(anims.len(), 1);
    assert_eq!(anims[0].target_id, "grp");
    assert!(anims[0].repeat);
}

#[test]
fn repeat_rules() {
    let parse = |attrs: &str| {
        let svg = format!(r##"<svg><animate href="#x" values="a;b" dur="1s" {attrs}/></svg>"##);
        parse_animations(&svg)[0].repeat
    };
    assert!(!parse(""));
    assert!(!parse(r#"repeatCount="1""#));
    assert!(parse(r#"repeatCount="1.5""#));
    assert!(parse(r#"repeatCount='indefinite'"#));
    assert!(parse(r#"repeatDur="indefinite""#));
    assert!(!parse(r#"repeatCount="often""#));
}

#[test]
fn rejects_missing_values_targets_and_other_animation_elements() {
    let svg = r##"<svg>
  <animate attributeName="opacity" values="0;1" dur="1s"/>
  <g id="g1">
    <animate attributeName="opacity" values=" ; " dur="1s"/>
    <animateTransform attributeName="transform" type="rotate" values="0;90" dur="1s"/>
    <animateMotion values="0,0;1,1" dur="1s"/>
  </g>
</svg>"##;
    assert!(parse_animations(svg).is_empty());
}

#[test]
fn symbols_become_groups() {
    let svg = r#"<svg><symbol id="s" viewBox="0 0 1 1"><rect/></symbol><symbolic/></svg>"#;
    assert_eq!(
        convert_symbols_to_groups(svg),
        r#"<svg><g id="s" viewBox="0 0 1 1"><rect/></g><symbolic/></svg>"#
    );
}

#[test]
fn synthetic_ids_for_anonymous_animated_uses() {
    let svg = r##"<svg>
<use xlink:href="#a"><animate attributeName="xlink:href" values="#a;#b" dur="1s"/></use>
<use id="named" xlink:href="#a"><animate attributeName="xlink:href" values="#a;#b" dur="1s"/></use>
<use xlink:href="#c"/>
<use xlink:href="#d"></use>
<use xlink:href="#e"><animate attributeName="xlink:href" values="#e;#f" dur="1s"/></use>
</svg>"##;
    let pre = preprocess_svg(svg, &PreprocessOpts::default());
    let ids: Vec<&str> = pre.synthetic_ids.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["_smil_target_0", "_smil_target_1"]);
    for s in &pre.synthetic_ids {
        assert!(pre.content[s.offset..].starts_with(&format!("<use id=\"{}\"", s.id)));
    }

    let targets: Vec<String> = parse_animations(&pre.content)
        .into_iter()
        .map(|a| a.target_id)
        .collect();
    assert_eq!(targets, vec!["_smil_target_0", "named", "_smil_target_1"]);
}

#[test]
fn preprocessing_can_be_disabled() {
    let svg = r##"<svg><symbol id="s"/><use xlink:href="#s"><animate values="a;b"/></use></svg>"##;
    let opts = PreprocessOpts {
        convert_symbols_to_groups: false,
        inject_synthetic_ids: false,
    };
    let pre = preprocess_svg(svg, &opts);
    assert_eq!(pre.content, svg);
    assert!(pre.synthetic_ids.is_empty());
}
