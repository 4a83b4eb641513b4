use std::path::Path;

use playpush::{
    MediaTypes, format_releases,
    play::{ReleaseStatus, TrackRelease},
};

#[test]
fn bundle_extensions_map_to_octet_stream() {
    let types = MediaTypes::default();
    assert_eq!(
        types.content_type_for(Path::new("app/build/outputs/bundle/release/app.aab")),
        "application/octet-stream"
    );
    assert_eq!(
        types.content_type_for(Path::new("APP-RELEASE.AAB")),
        "application/octet-stream"
    );
}

#[test]
fn custom_media_types_are_used_without_global_state() {
    let types = MediaTypes::empty()
        .with_extension(".aab", "application/x-authorware-bin")
        .with_fallback("application/binary");
    assert_eq!(
        types.content_type_for(Path::new("build.aab")),
        "application/x-authorware-bin"
    );
    assert_eq!(types.content_type_for(Path::new("build")), "application/binary");
    assert_eq!(
        MediaTypes::default().content_type_for(Path::new("build.aab")),
        "application/octet-stream"
    );
}

#[test]
fn releases_render_name_codes_and_status() {
    let releases = vec![
        TrackRelease::completed("1.2.3", 42),
        TrackRelease {
            name: None,
            version_codes: vec!["40".into(), "41".into()],
            status: ReleaseStatus::Draft,
        },
    ];
    assert_eq!(
        format_releases(&releases),
        "[1.2.3 (42) completed, <unnamed> (40, 41) draft]"
    );
    assert_eq!(format_releases(&[]), "[]");
}
