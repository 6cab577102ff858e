//! Localization pipeline: make a metadata snapshot durable.
//!
//! Takes a `ModelMeta` whose examples may still reference remote media,
//! fetches every remote item into the asset's store directory, rewrites the
//! references to `file://` URLs, and atomically persists the result as
//! `metadata.json`. This module is the sole writer of metadata snapshots.
//!
//! Media fetches within one save run concurrently and are joined with
//! all-settle semantics: a failed fetch drops that example (with a warning)
//! and never fails the save. Only the final serialization/write can fail.

use crate::config::{NetworkConfig, PathsConfig, StorePaths};
use crate::error::{AssetError, Result};
use crate::models::{Example, ModelMeta};
use crate::store::atomic::atomic_write_json;
use futures::future::join_all;
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

/// Localize all remote example media and persist the snapshot.
///
/// Returns the localized `ModelMeta` as written to disk: examples whose
/// media could not be fetched are pruned, the rest reference local copies.
pub(crate) async fn localize_and_save(
    http: &reqwest::Client,
    paths: &StorePaths,
    meta: ModelMeta,
) -> Result<ModelMeta> {
    let dir = paths.entry_dir(meta.kind, &meta.stem());
    std::fs::create_dir_all(&dir).map_err(|e| AssetError::io_with_path(e, &dir))?;
    // Canonical so the rewritten file:// URLs are absolute and stable.
    let dir = dir
        .canonicalize()
        .map_err(|e| AssetError::io_with_path(e, &dir))?;

    // Partition: already-local examples pass through untouched, remote ones
    // become fetch jobs.
    let mut kept: Vec<Example> = Vec::new();
    let mut jobs: Vec<(Example, String, PathBuf)> = Vec::new();
    for example in meta.examples.iter() {
        if example.is_local() {
            kept.push(example.clone());
            continue;
        }
        let url = example.url.clone().unwrap_or_default();
        match example.filename() {
            Some(filename) => {
                let dest = dir.join(filename);
                jobs.push((example.clone(), url, dest));
            }
            None => {
                warn!("Dropping example with underivable media name: {}", url);
            }
        }
    }

    if !jobs.is_empty() {
        info!(
            "Localizing {} example media for {}",
            jobs.len(),
            meta.version_name()
        );

        let results = join_all(
            jobs.iter()
                .map(|(_, url, dest)| fetch_media(http, url, dest)),
        )
        .await;

        let mut failed = 0usize;
        for ((example, url, dest), result) in jobs.into_iter().zip(results) {
            match result {
                Ok(()) => match Url::from_file_path(&dest) {
                    Ok(local) => kept.push(Example {
                        url: Some(local.to_string()),
                        args: example.args,
                    }),
                    Err(()) => {
                        failed += 1;
                        warn!("Dropping example, non-absolute media path {:?}", dest);
                    }
                },
                Err(e) => {
                    failed += 1;
                    warn!("Dropping example, fetch failed for {}: {}", url, e);
                }
            }
        }

        if failed > 0 {
            warn!(
                "Localized {} example media, dropped {}",
                kept.len(),
                failed
            );
        }
    }

    let localized = ModelMeta {
        examples: kept,
        ..meta
    };

    atomic_write_json(&dir.join(PathsConfig::METADATA_FILENAME), &localized)?;
    debug!("Saved metadata snapshot for {}", localized.version_name());

    Ok(localized)
}

/// Fetch one media item, streaming to a temp file then renaming into place.
async fn fetch_media(http: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AssetError::DownloadFailed {
            url: url.to_string(),
            message: format!("status {}", status),
        });
    }

    let temp_path = PathBuf::from(format!(
        "{}{}",
        dest.display(),
        NetworkConfig::DOWNLOAD_TEMP_SUFFIX
    ));

    let write_result: Result<()> = async {
        let mut file = std::fs::File::create(&temp_path)
            .map_err(|e| AssetError::io_with_path(e, &temp_path))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(AssetError::from)?;
            file.write_all(&chunk)
                .map_err(|e| AssetError::io_with_path(e, &temp_path))?;
        }
        file.flush()
            .map_err(|e| AssetError::io_with_path(e, &temp_path))?;
        Ok(())
    }
    .await;

    match write_result {
        Ok(()) => {
            std::fs::rename(&temp_path, dest).map_err(|e| {
                let _ = std::fs::remove_file(&temp_path);
                AssetError::io_with_path(e, dest)
            })?;
            debug!("Fetched media {}", dest.display());
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&temp_path);
            Err(e)
        }
    }
}
