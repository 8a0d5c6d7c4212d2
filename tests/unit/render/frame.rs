use super::*;
use crate::render::context::RenderContextOpts;

const BG: [u8; 4] = [10, 20, 30, 255];
const RED: [u8; 4] = [255, 0, 0, 255];

fn ctx() -> RenderContext {
    RenderContext::new(&RenderContextOpts {
        load_system_fonts: false,
        ..RenderContextOpts::default()
    })
}

fn doc(box_x: u32) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"><rect id="box" x="{box_x}" y="0" width="10" height="10" fill="#ff0000"/></svg>"##
    )
}

fn renderer() -> FrameRenderer {
    FrameRenderer::new(
        Canvas {
            width: 40.0,
            height: 20.0,
        },
        1.0,
        BG,
    )
    .unwrap()
}

fn moved(x: &str) -> AnimationState {
    AnimationState {
        target_id: "box".to_owned(),
        attribute_name: "x".to_owned(),
        value: x.to_owned(),
    }
}

#[test]
fn pixel_size_rounds_up_and_rejects_bad_input() {
    let canvas = Canvas {
        width: 40.5,
        height: 20.0,
    };
    assert_eq!(pixel_size(canvas, 2.0).unwrap(), (81, 40));
    assert!(pixel_size(canvas, 0.0).is_err());
    assert!(pixel_size(canvas, f32::NAN).is_err());
    assert!(
        pixel_size(
            Canvas {
                width: 0.0,
                height: 5.0
            },
            1.0
        )
        .is_err()
    );
    assert!(pixel_size(canvas, 1000.0).is_err());
}

#[test]
fn new_buffer_is_background() {
    let r = renderer();
    assert_eq!((r.width(), r.height()), (40, 20));
    assert_eq!(r.pixel(0, 0), Some(BG));
    assert_eq!(r.pixel(40, 0), None);
}

#[test]
fn full_render_paints_document() {
    let ctx = ctx();
    let mut r = renderer();
    r.render_full(&ctx, &doc(0)).unwrap();
    assert_eq!(r.pixel(5, 5), Some(RED));
    assert_eq!(r.pixel(30, 5), Some(BG));
    assert_eq!(r.pixel(5, 15), Some(BG));

    let frame = r.frame();
    assert!(frame.premultiplied);
    assert_eq!(frame.data.len(), 40 * 20 * 4);
}

#[test]
fn partial_render_only_touches_dirty_region() {
    let ctx = ctx();
    let mut r = renderer();
    r.render_full(&ctx, &doc(0)).unwrap();

    let next = apply_animation_states(&doc(0), &[moved("20")]);
    let painted = r
        .render_partial(&ctx, &next, DirtyRect::new(20.0, 0.0, 10.0, 10.0))
        .unwrap();
    assert_eq!(painted, Some(DirtyRect::new(20.0, 0.0, 10.0, 10.0)));
    assert_eq!(r.pixel(25, 5), Some(RED));
    // outside the region the old frame survives
    assert_eq!(r.pixel(5, 5), Some(RED));
}

#[test]
fn partial_over_union_matches_full_render() {
    let ctx = ctx();
    let mut partial = renderer();
    partial.render_full(&ctx, &doc(0)).unwrap();
    let next = apply_animation_states(&doc(0), &[moved("20")]);
    partial
        .render_partial(&ctx, &next, DirtyRect::new(0.0, 0.0, 30.0, 10.0))
        .unwrap();

    let mut full = renderer();
    full.render_full(&ctx, &doc(20)).unwrap();
    assert_eq!(partial.frame().data, full.frame().data);
}

#[test]
fn partial_region_snaps_to_pixels_and_scale() {
    let ctx = ctx();
    let mut r = FrameRenderer::new(
        Canvas {
            width: 40.0,
            height: 20.0,
        },
        2.0,
        BG,
    )
    .unwrap();
    r.render_full(&ctx, &doc(0)).unwrap();
    assert_eq!(r.pixel(19, 19), Some(RED));

    let painted = r
        .render_partial(&ctx, &doc(0), DirtyRect::new(0.3, 0.3, 1.0, 1.0))
        .unwrap();
    assert_eq!(painted, Some(DirtyRect::new(0.0, 0.0, 3.0, 3.0)));

    let clipped = r
        .render_partial(&ctx, &doc(0), DirtyRect::new(35.0, 15.0, 50.0, 50.0))
        .unwrap();
    assert_eq!(clipped, Some(DirtyRect::new(70.0, 30.0, 10.0, 10.0)));
}

#[test]
fn partial_outside_buffer_is_a_no_op() {
    let ctx = ctx();
    let mut r = renderer();
    assert_eq!(
        r.render_partial(&ctx, "garbage", DirtyRect::new(100.0, 100.0, 5.0, 5.0))
            .unwrap(),
        None
    );
    assert_eq!(
        r.render_partial(&ctx, "garbage", DirtyRect::empty()).unwrap(),
        None
    );
    assert!(
        r.render_partial(&ctx, "garbage", DirtyRect::new(0.0, 0.0, 5.0, 5.0))
            .is_err()
    );
}

#[test]
fn states_are_written_into_markup() {
    let states = [
        moved("20"),
        AnimationState {
            target_id: "missing".to_owned(),
            attribute_name: "x".to_owned(),
            value: "1".to_owned(),
        },
        AnimationState {
            target_id: "box".to_owned(),
            attribute_name: "opacity".to_owned(),
            value: "0.5".to_owned(),
        },
    ];
    let out = apply_animation_states(&doc(0), &states);
    assert!(out.contains(r#"x="20""#));
    assert!(out.contains(r#"opacity="0.5""#));
    assert!(!out.contains("missing"));
}
