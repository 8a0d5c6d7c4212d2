use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(FbfError::load("x").to_string().contains("load error:"));
    assert!(FbfError::config("x").to_string().contains("config error:"));
    assert!(FbfError::render("x").to_string().contains("render error:"));
    assert!(
        FbfError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FbfError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn serde_json_errors_map_to_serde_variant() {
    let err: FbfError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, FbfError::Serde(_)));
}
