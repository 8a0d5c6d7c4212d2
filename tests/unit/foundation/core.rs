use super::*;

#[test]
fn overlapping_rects_intersect_and_merge() {
    let a = DirtyRect::new(10.0, 10.0, 50.0, 50.0);
    let b = DirtyRect::new(40.0, 40.0, 50.0, 50.0);
    assert!(a.intersects(&b));
    assert_eq!(a.merge(&b), DirtyRect::new(10.0, 10.0, 80.0, 80.0));
}

#[test]
fn touching_edges_do_not_intersect() {
    let a = DirtyRect::new(0.0, 0.0, 10.0, 10.0);
    let b = DirtyRect::new(10.0, 0.0, 10.0, 10.0);
    assert!(!a.intersects(&b));
    assert!(!b.intersects(&a));
}

#[test]
fn merge_is_commutative_associative_and_empty_aware() {
    let a = DirtyRect::new(0.0, 0.0, 4.0, 4.0);
    let b = DirtyRect::new(10.0, -3.0, 2.0, 1.0);
    let c = DirtyRect::new(-5.0, 8.0, 1.0, 1.0);

    assert_eq!(a.merge(&b), b.merge(&a));
    assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
    assert_eq!(DirtyRect::empty().merge(&a), a);
    assert_eq!(a.merge(&DirtyRect::empty()), a);
}

#[test]
fn expand_contains_original() {
    let r = DirtyRect::new(3.0, 4.0, 5.0, 6.0);
    for m in [0.5f32, 1.0, 10.0] {
        assert!(r.expand(m).contains(&r));
    }
    assert!(DirtyRect::empty().expand(2.0).is_empty());
}

#[test]
fn clamp_collapses_outside_rects() {
    let r = DirtyRect::new(-10.0, -10.0, 30.0, 30.0);
    assert_eq!(r.clamp(100.0, 100.0), DirtyRect::new(0.0, 0.0, 20.0, 20.0));

    let outside = DirtyRect::new(200.0, 200.0, 10.0, 10.0);
    assert!(outside.clamp(100.0, 100.0).is_empty());
}

#[test]
fn contains_rejects_empty() {
    let r = DirtyRect::new(0.0, 0.0, 10.0, 10.0);
    assert!(!r.contains(&DirtyRect::empty()));
    assert!(!DirtyRect::empty().contains(&r));
}

#[test]
fn kurbo_conversion_keeps_edges() {
    let r = DirtyRect::new(1.5, 2.0, 3.0, 4.0);
    let k: Rect = r.into();
    assert_eq!(k, Rect::new(1.5, 2.0, 4.5, 6.0));
    assert_eq!(DirtyRect::from(k), r);
}

#[test]
fn straight_alpha_conversion() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![64, 32, 0, 128, 9, 9, 9, 0],
        premultiplied: true,
    };
    let straight = frame.into_straight();
    assert!(!straight.premultiplied);
    assert_eq!(&straight.data[..4], &[128, 64, 0, 128]);
    assert_eq!(&straight.data[4..], &[0, 0, 0, 0]);
}

#[test]
fn view_box_meets_centered_by_default() {
    let canvas = Canvas {
        width: 240.0,
        height: 100.0,
    };
    let vb = ViewBox::fit([0.0, 0.0, 120.0, 80.0], canvas, None);
    assert_eq!((vb.scale_x, vb.scale_y), (1.25, 1.25));
    assert_eq!((vb.offset_x, vb.offset_y), (45.0, 0.0));
    assert_eq!(
        vb.to_canvas(DirtyRect::new(8.0, 8.0, 8.0, 8.0)),
        DirtyRect::new(55.0, 10.0, 10.0, 10.0)
    );
}

#[test]
fn view_box_honors_alignment_and_none() {
    let canvas = Canvas {
        width: 200.0,
        height: 100.0,
    };
    let min = ViewBox::fit([10.0, 0.0, 100.0, 100.0], canvas, Some("xMinYMin meet"));
    assert_eq!((min.offset_x, min.offset_y), (-10.0, 0.0));

    let max = ViewBox::fit([0.0, 0.0, 100.0, 100.0], canvas, Some("xMaxYMid"));
    assert_eq!(max.offset_x, 100.0);

    let stretched = ViewBox::fit([0.0, 0.0, 100.0, 100.0], canvas, Some("none"));
    assert_eq!((stretched.scale_x, stretched.scale_y), (2.0, 1.0));
    assert_eq!((stretched.offset_x, stretched.offset_y), (0.0, 0.0));
}

#[test]
fn degenerate_view_box_is_identity() {
    let canvas = Canvas {
        width: 50.0,
        height: 40.0,
    };
    assert_eq!(
        ViewBox::fit([0.0, 0.0, 0.0, 10.0], canvas, None),
        ViewBox::identity(canvas)
    );
    let r = DirtyRect::new(1.0, 2.0, 3.0, 4.0);
    assert_eq!(ViewBox::identity(canvas).to_canvas(r), r);
}
