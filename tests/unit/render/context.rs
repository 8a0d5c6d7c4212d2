use super::*;

fn no_system_fonts() -> RenderContextOpts {
    RenderContextOpts {
        load_system_fonts: false,
        ..RenderContextOpts::default()
    }
}

#[test]
fn opts_default_and_json() {
    let opts = RenderContextOpts::default();
    assert!(opts.load_system_fonts);
    assert!(opts.font_dirs.is_empty());

    let parsed: RenderContextOpts =
        serde_json::from_str(r#"{"font_dirs":["/nowhere"]}"#).unwrap();
    assert!(parsed.load_system_fonts);
    assert_eq!(parsed.font_dirs, vec![PathBuf::from("/nowhere")]);
}

#[test]
fn missing_font_dirs_are_ignored() {
    let ctx = RenderContext::new(&RenderContextOpts {
        font_dirs: vec![PathBuf::from("/definitely/not/a/dir")],
        ..no_system_fonts()
    });
    assert_eq!(ctx.font_count(), 0);
}

#[test]
fn non_font_files_are_skipped() {
    let dir = std::env::temp_dir().join(format!("fbfsvg_fonts_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("readme.txt"), "not a font").unwrap();

    let ctx = RenderContext::new(&RenderContextOpts {
        font_dirs: vec![dir.clone()],
        ..no_system_fonts()
    });
    assert_eq!(ctx.font_count(), 0);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn parse_reports_canvas_and_errors() {
    let ctx = RenderContext::new(&no_system_fonts());
    let canvas = ctx
        .canvas_of(r#"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="32"/>"#)
        .unwrap();
    assert_eq!(canvas, Canvas { width: 64.0, height: 32.0 });

    let err = ctx.parse("not svg at all").unwrap_err();
    assert!(matches!(err, FbfError::Render(_)));
}

#[test]
fn resources_dir_is_forwarded() {
    let ctx = RenderContext::new(&RenderContextOpts {
        resources_dir: Some(PathBuf::from("/assets")),
        ..no_system_fonts()
    });
    assert_eq!(
        ctx.usvg_options().resources_dir.as_deref(),
        Some(Path::new("/assets"))
    );
    assert!(format!("{ctx:?}").contains("RenderContext"));
}
