use rust_portfolio_viewer::config::{
    AssetKind, Configuration, ContainerId, DeclaredItem, Sourcing,
};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn parse_kebab_case_config_with_defaults() {
    let yaml = r#"
asset-root: "https://example.org/site"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(cfg.asset_root, "https://example.org/site");
    assert_eq!(cfg.image_dir, "assets/images");
    assert_eq!(cfg.video_dir, "assets/videos");
    assert_eq!(
        cfg.image_extensions,
        vec!["jpg", "JPG", "jpeg", "JPEG", "png", "PNG"]
    );
    assert_eq!(cfg.video_extension, "mp4");
    assert_eq!(cfg.probe_timeout, Duration::from_secs(5));
    assert_eq!(cfg.scan_max_index, 20);
    assert_eq!(cfg.preferences_path, PathBuf::from("preferences.json"));
    assert_eq!(cfg.containers, ContainerId::ALL.to_vec());
    assert!(cfg.albums.is_empty());
}

#[test]
fn parse_albums_and_sourcing_modes() {
    let yaml = r#"
asset-root: "/srv/portfolio"
probe-timeout: 1500ms
scan-max-index: 8
containers: [video-albums, video-player]
albums:
  - key: wedding
    kind: photo
    title: Wedding Stories
    cover: assets/images/wedding/1.jpg
    items:
      - src: assets/images/wedding/1.jpg
        caption: Wedding
      - assets/images/wedding/2.jpg
  - key: reel
    kind: video
    title: Cinematic Reel
    subtitle: Short Social Media Content
    folder: reel
    items:
      - "https://youtube.com/shorts/v2cWKYKMazY?feature=share"
  - key: documentary
    kind: video
    title: Short Film
    folder: documentary
  - key: placeholder
    kind: video
    title: Soon
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(cfg.probe_timeout, Duration::from_millis(1500));
    assert_eq!(cfg.scan_max_index, 8);
    assert_eq!(
        cfg.containers,
        vec![ContainerId::VideoAlbums, ContainerId::VideoPlayer]
    );

    let wedding = cfg.album("wedding").unwrap();
    assert_eq!(wedding.kind, AssetKind::Image);
    assert_eq!(wedding.poster.as_deref(), Some("assets/images/wedding/1.jpg"));
    assert_eq!(
        wedding.items,
        vec![
            DeclaredItem::Detailed {
                src: "assets/images/wedding/1.jpg".into(),
                caption: Some("Wedding".into()),
            },
            DeclaredItem::Locator("assets/images/wedding/2.jpg".into()),
        ]
    );
    assert_eq!(wedding.items[0].caption(), Some("Wedding"));

    let reel = cfg.album("reel").unwrap();
    assert!(matches!(reel.sourcing(), Sourcing::Declared(items) if items.len() == 1));
    assert_eq!(
        cfg.album("documentary").unwrap().sourcing(),
        Sourcing::Scan("documentary")
    );
    assert_eq!(cfg.album("placeholder").unwrap().sourcing(), Sourcing::Empty);
    assert_eq!(cfg.albums_of(AssetKind::Video).count(), 3);
}

#[test]
fn extensions_are_normalised() {
    let yaml = r#"
image-extensions: [".jpg", " png "]
video-extension: ".webm"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(cfg.image_extensions, vec!["jpg", "png"]);
    assert_eq!(cfg.video_extension, "webm");
}

#[test]
fn rejects_unknown_fields() {
    let yaml = r#"
asset-root: "/srv"
photo-library-path: "/photos"
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn rejects_duplicate_album_keys() {
    let yaml = r#"
albums:
  - { key: reel, kind: video, title: A, folder: a }
  - { key: reel, kind: video, title: B, folder: b }
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("duplicate album key"), "{err}");
}

#[test]
fn rejects_invalid_limits() {
    let cfg: Configuration = serde_yaml::from_str("scan-max-index: 0").unwrap();
    assert!(cfg.validated().is_err());

    let cfg: Configuration = serde_yaml::from_str("probe-timeout: 0s").unwrap();
    assert!(cfg.validated().is_err());

    let cfg: Configuration = serde_yaml::from_str("image-extensions: []").unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "asset-root: \"/srv/site\"\nalbums:\n  - { key: reel, kind: video, title: Reel, folder: reel }\n",
    )
    .unwrap();
    let cfg = Configuration::from_yaml_file(&path)
        .unwrap()
        .validated()
        .unwrap();
    assert_eq!(cfg.album("reel").unwrap().folder, "reel");
}
