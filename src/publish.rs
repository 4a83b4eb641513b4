use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    play::{AppEdit, Bundle, Track, TrackRelease},
    util::format_releases,
};

/// The only track this tool publishes to.
pub const INTERNAL_TRACK: &str = "internal";

/// The four remote operations of one edit transaction.
#[allow(async_fn_in_trait)]
pub trait EditsApi {
    async fn insert_edit(&self, package_name: &str) -> Result<AppEdit>;
    async fn upload_bundle(&self, package_name: &str, edit_id: &str, file: &Path) -> Result<Bundle>;
    async fn update_track(&self, package_name: &str, edit_id: &str, track: &Track)
    -> Result<Track>;
    async fn commit_edit(&self, package_name: &str, edit_id: &str) -> Result<AppEdit>;
}

#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub package_name: String,
    pub bundle: PathBuf,
    pub version_name: String,
}

#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub edit_id: String,
    pub version_code: i64,
    pub track: Track,
}

/// Opens an edit, uploads the bundle, makes it the sole completed release on
/// the internal track and commits. Stops at the first failing call; an edit
/// left uncommitted is abandoned on the server.
pub async fn publish_to_internal_track<A: EditsApi>(
    api: &A,
    request: &PublishRequest,
    out: &mut impl Write,
) -> Result<PublishOutcome> {
    let package = request.package_name.as_str();

    let edit = api
        .insert_edit(package)
        .await
        .with_context(|| format!("Failed to open an edit for {}", package))?;
    info!(edit_id = %edit.id, "edit opened");

    let bundle = api
        .upload_bundle(package, &edit.id, &request.bundle)
        .await
        .with_context(|| format!("Failed to upload {}", request.bundle.display()))?;
    writeln!(out, "Version code {} has been uploaded", bundle.version_code)?;

    // Replaces whatever releases the track held before.
    let track = Track {
        track: INTERNAL_TRACK.to_string(),
        releases: vec![TrackRelease::completed(
            &request.version_name,
            bundle.version_code,
        )],
    };
    let updated = api
        .update_track(package, &edit.id, &track)
        .await
        .with_context(|| format!("Failed to update track {}", INTERNAL_TRACK))?;
    writeln!(
        out,
        "Track {} is set with releases: {}",
        updated.track,
        format_releases(&updated.releases)
    )?;

    let committed = api
        .commit_edit(package, &edit.id)
        .await
        .with_context(|| format!("Failed to commit edit {}", edit.id))?;
    writeln!(out, "Edit \"{}\" has been committed", committed.id)?;

    Ok(PublishOutcome {
        edit_id: committed.id,
        version_code: bundle.version_code,
        track: updated,
    })
}
