use super::*;
use crate::render::context::RenderContextOpts;

const SPRITE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="100" height="100" viewBox="0 0 100 100">
<defs>
<rect id="f0" width="10" height="10" fill="#ff0000"/>
<rect id="f1" width="10" height="10" fill="#00ff00"/>
</defs>
<use id="sprite" x="0" y="0" width="10" height="10" xlink:href="#f0"><animate attributeName="xlink:href" values="#f0;#f1" dur="1s" repeatCount="indefinite"/></use>
</svg>"##;

const GROUP: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
<g id="grp"><animate attributeName="opacity" values="1;0.5" dur="1s" repeatCount="indefinite"/><rect width="10" height="10"/></g>
</svg>"#;

fn ctx() -> RenderContext {
    RenderContext::new(&RenderContextOpts {
        load_system_fonts: false,
        ..RenderContextOpts::default()
    })
}

fn opaque() -> PlayerConfig {
    PlayerConfig {
        background_rgba: [0, 0, 0, 255],
        ..PlayerConfig::default()
    }
}

#[test]
fn config_defaults_json_and_validation() {
    let cfg = PlayerConfig::default();
    assert_eq!(cfg.render_scale, 1.0);
    assert!(cfg.validate().is_ok());

    let cfg =
        PlayerConfig::from_json_str(r#"{"render_scale":2.0,"tracker":{"max_dirty_rects":4}}"#)
            .unwrap();
    assert_eq!(cfg.render_scale, 2.0);
    assert_eq!(cfg.tracker.max_dirty_rects, 4);
    assert_eq!(cfg.tracker.full_render_threshold, 0.5);

    assert!(matches!(
        PlayerConfig::from_json_str(r#"{"render_scale":0}"#),
        Err(FbfError::Config(_))
    ));
    assert!(matches!(
        PlayerConfig::from_json_str("{"),
        Err(FbfError::Serde(_))
    ));
    assert!(matches!(
        PlayerConfig::from_json_file("/no/such/config.json"),
        Err(FbfError::Other(_))
    ));
}

#[test]
fn load_seeds_tracker_and_canvas() {
    let player = Player::load(&ctx(), SPRITE, opaque()).unwrap();
    assert_eq!(
        player.canvas(),
        Canvas {
            width: 100.0,
            height: 100.0
        }
    );
    assert!(player.tracker().has_cached_bounds("sprite"));
    assert!(player.controller().is_stopped());
    assert!(format!("{player:?}").contains("Player"));
}

#[test]
fn load_errors() {
    let ctx = ctx();
    assert!(matches!(
        Player::load(&ctx, "", PlayerConfig::default()),
        Err(FbfError::Load(_))
    ));
    assert!(matches!(
        Player::load(&ctx, "hello", PlayerConfig::default()),
        Err(FbfError::Render(_))
    ));
    let bad = PlayerConfig {
        render_scale: -1.0,
        ..PlayerConfig::default()
    };
    assert!(matches!(
        Player::load(&ctx, SPRITE, bad),
        Err(FbfError::Config(_))
    ));
}

#[test]
fn ticks_pick_full_skip_and_partial() {
    let ctx = ctx();
    let mut player = Player::load(&ctx, SPRITE, opaque()).unwrap();
    player.controller().play();

    let first = player.tick(&ctx, 0.25).unwrap();
    assert_eq!(first.path, RenderPath::Full);
    assert!(!first.changed);

    let second = player.tick(&ctx, 0.25).unwrap();
    assert!(second.changed);
    assert_eq!(
        second.path,
        RenderPath::Partial(DirtyRect::new(0.0, 0.0, 11.0, 11.0))
    );

    let third = player.tick(&ctx, 0.25).unwrap();
    assert_eq!(third.path, RenderPath::Skipped);
    assert_eq!(third.render_time_ms, 0.0);
    assert_eq!(player.tracker().dirty_count(), 0);
}

#[test]
fn partial_frame_matches_full_frame() {
    let ctx = ctx();
    let mut player = Player::load(&ctx, SPRITE, opaque()).unwrap();
    player.controller().play();
    player.tick(&ctx, 0.25).unwrap();
    player.tick(&ctx, 0.25).unwrap();

    let frame = player.frame();
    let green = (5 * frame.width as usize + 5) * 4;
    assert_eq!(&frame.data[green..green + 4], &[0, 255, 0, 255]);

    let mut reference = FrameRenderer::new(player.canvas(), 1.0, [0, 0, 0, 255]).unwrap();
    reference.render_full(&ctx, &player.current_markup()).unwrap();
    assert_eq!(frame.data, reference.frame().data);
}

#[test]
fn invalidate_forces_full_render() {
    let ctx = ctx();
    let mut player = Player::load(&ctx, SPRITE, opaque()).unwrap();
    assert_eq!(player.tick(&ctx, 0.0).unwrap().path, RenderPath::Full);
    assert_eq!(player.tick(&ctx, 0.0).unwrap().path, RenderPath::Skipped);

    player.controller().seek_to(0.6);
    player.invalidate();
    assert_eq!(player.tick(&ctx, 0.0).unwrap().path, RenderPath::Full);
    assert!(player.current_markup().contains(r##"xlink:href="#f1""##));
}

#[test]
fn seeks_while_stopped_reach_the_frame() {
    let ctx = ctx();
    let mut player = Player::load(&ctx, SPRITE, opaque()).unwrap();
    assert_eq!(player.tick(&ctx, 0.0).unwrap().path, RenderPath::Full);

    player.controller().seek_to(0.75);
    let report = player.tick(&ctx, 0.0).unwrap();
    assert!(report.changed);
    assert_ne!(report.path, RenderPath::Skipped);

    let mut reference = FrameRenderer::new(player.canvas(), 1.0, [0, 0, 0, 255]).unwrap();
    reference.render_full(&ctx, &player.current_markup()).unwrap();
    assert_eq!(player.frame().data, reference.frame().data);
    assert_eq!(player.tick(&ctx, 0.0).unwrap().path, RenderPath::Skipped);
}

#[test]
fn steps_while_paused_are_drawn() {
    let ctx = ctx();
    let mut player = Player::load(&ctx, SPRITE, opaque()).unwrap();
    player.controller().play();
    player.tick(&ctx, 0.25).unwrap();

    player.controller().step_forward();
    assert!(player.controller().is_paused());
    let report = player.tick(&ctx, 0.25).unwrap();
    assert_eq!(
        report.path,
        RenderPath::Partial(DirtyRect::new(0.0, 0.0, 11.0, 11.0))
    );
    let frame = player.frame();
    let px = (5 * frame.width as usize + 5) * 4;
    assert_eq!(&frame.data[px..px + 4], &[0, 255, 0, 255]);

    player.controller().step_backward();
    player.tick(&ctx, 0.25).unwrap();
    let frame = player.frame();
    assert_eq!(&frame.data[px..px + 4], &[255, 0, 0, 255]);
}

#[test]
fn simulate_counts_decisions() {
    let ctx = ctx();
    let mut player = Player::load(&ctx, SPRITE, opaque()).unwrap();
    player.controller().play();

    let summary = player.simulate(0.25, 4);
    assert_eq!(summary.frames, 4);
    assert_eq!(summary.changed_frames, 2);
    assert_eq!(summary.full, 1);
    assert_eq!(summary.partial, 2);
    assert_eq!(summary.skipped, 1);
    assert!((summary.mean_partial_coverage - 0.0121).abs() < 1e-6);
}

#[test]
fn targets_without_bounds_render_in_full() {
    let ctx = ctx();
    let mut player = Player::load(&ctx, GROUP, opaque()).unwrap();
    assert!(!player.tracker().has_cached_bounds("grp"));
    player.controller().play();

    let summary = player.simulate(0.25, 4);
    assert_eq!(summary.full, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.partial, 0);
    assert_eq!(summary.mean_partial_coverage, 0.0);
}

#[test]
fn static_documents_render_once() {
    let ctx = ctx();
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"/>"#;
    let mut player = Player::load(&ctx, svg, opaque()).unwrap();
    player.controller().play();
    assert_eq!(player.tick(&ctx, 0.1).unwrap().path, RenderPath::Full);
    assert_eq!(player.tick(&ctx, 0.1).unwrap().path, RenderPath::Skipped);
}
