use super::*;

#[test]
fn default_source_lists_caption_families() {
    let FontSource::System { families } = FontSource::default() else {
        panic!("default font source should be a system lookup");
    };
    assert_eq!(families, ["Impact", "Anton", "DejaVu Sans"]);
}

#[test]
fn font_source_json_is_tagged() {
    let block: FontSource = serde_json::from_str(r#"{"kind":"block"}"#).unwrap();
    assert_eq!(block, FontSource::Block);

    let file: FontSource =
        serde_json::from_str(r#"{"kind":"file","path":"/fonts/anton.ttf"}"#).unwrap();
    assert_eq!(
        file,
        FontSource::File {
            path: PathBuf::from("/fonts/anton.ttf")
        }
    );

    let json = serde_json::to_string(&FontSource::System {
        families: vec!["Impact".into()],
    })
    .unwrap();
    assert_eq!(json, r#"{"kind":"system","families":["Impact"]}"#);
}

#[test]
fn missing_font_file_is_an_error() {
    let err = load_font_file(std::path::Path::new("/no/such/font.ttf")).unwrap_err();
    assert!(matches!(err, ForgeError::Other(_)));
}

#[test]
fn font_file_bytes_are_read_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("face.ttf");
    std::fs::write(&path, b"not really a font").unwrap();
    let bytes = load_font_file(&path).unwrap();
    assert_eq!(bytes.data.as_slice(), b"not really a font");
    assert_eq!(bytes.index, 0);
}
