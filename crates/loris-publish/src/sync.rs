//! Directory to bucket sync.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::{BucketClient, RemoteObject, SyncError};

/// How a sync treats existing remote content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Delete remote keys that are no longer produced locally.
    pub prune: bool,
    /// Upload every file even if the remote copy is identical.
    pub force: bool,
    /// Compute the plan without touching the bucket.
    pub dry_run: bool,
}

/// A file found in the local tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// `/`-separated path relative to the synced directory.
    pub key: String,
    pub path: PathBuf,
    /// Hex MD5 of the content.
    pub md5: String,
}

/// What a sync will do, per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub upload: Vec<String>,
    pub skip: Vec<String>,
    pub delete: Vec<String>,
}

/// Outcome of [`sync_directory`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub bucket: String,
    pub transferred: Vec<String>,
    pub skipped: Vec<String>,
    pub deleted: Vec<String>,
    /// The bucket was not modified.
    pub dry_run: bool,
}

/// Every regular file under `directory` as `(key, absolute path)`, sorted by key.
pub fn collect_files(directory: &Path) -> Result<Vec<(String, PathBuf)>, SyncError> {
    if !directory.is_dir() {
        return Err(SyncError::DirectoryNotFound(directory.to_path_buf()));
    }
    let mut files = Vec::new();
    walk_dir(directory, directory, &mut files)?;
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn walk_dir(
    base: &Path,
    current: &Path,
    files: &mut Vec<(String, PathBuf)>,
) -> Result<(), SyncError> {
    let entries = fs::read_dir(current).map_err(|e| SyncError::io(current, e))?;
    for entry in entries {
        let path = entry.map_err(|e| SyncError::io(current, e))?.path();
        if path.is_dir() {
            walk_dir(base, &path, files)?;
        } else if path.is_file() {
            let Ok(relative) = path.strip_prefix(base) else {
                continue;
            };
            let key = relative.to_string_lossy().replace('\\', "/");
            files.push((key, path));
        }
    }
    Ok(())
}

/// Hash the collected files.
pub fn hash_files(files: Vec<(String, PathBuf)>) -> Result<Vec<LocalFile>, SyncError> {
    files
        .into_iter()
        .map(|(key, path)| {
            let content = fs::read(&path).map_err(|e| SyncError::io(&path, e))?;
            Ok(LocalFile {
                key,
                md5: hex::encode(Md5::digest(&content)),
                path,
            })
        })
        .collect()
}

/// Whether a remote ETag matches a local MD5.
///
/// Multipart uploads have ETags of the form `"<hash>-<parts>"` that are not
/// an MD5 of the content, so they never match.
fn etag_matches(etag: &str, md5: &str) -> bool {
    let etag = etag.trim_matches('"');
    !etag.contains('-') && etag.eq_ignore_ascii_case(md5)
}

/// Decide which keys to upload, skip and delete.
pub fn plan(local: &[LocalFile], remote: &[RemoteObject], options: SyncOptions) -> SyncPlan {
    let remote_etags: BTreeMap<&str, Option<&str>> = remote
        .iter()
        .map(|o| (o.key.as_str(), o.etag.as_deref()))
        .collect();

    let mut plan = SyncPlan::default();
    for file in local {
        let unchanged = remote_etags
            .get(file.key.as_str())
            .copied()
            .flatten()
            .is_some_and(|etag| etag_matches(etag, &file.md5));
        if unchanged && !options.force {
            plan.skip.push(file.key.clone());
        } else {
            plan.upload.push(file.key.clone());
        }
    }

    if options.prune {
        let local_keys: BTreeSet<&str> = local.iter().map(|f| f.key.as_str()).collect();
        plan.delete = remote_etags
            .keys()
            .filter(|key| !local_keys.contains(*key))
            .map(|key| (*key).to_owned())
            .collect();
    }
    plan
}

/// Upload the contents of `directory` to `bucket`.
pub async fn sync_directory(
    client: &dyn BucketClient,
    directory: &Path,
    bucket: &str,
    options: SyncOptions,
) -> Result<SyncReport, SyncError> {
    let local = hash_files(collect_files(directory)?)?;
    let remote = client.list(bucket).await?;
    let plan = plan(&local, &remote, options);

    let mut report = SyncReport {
        bucket: bucket.to_owned(),
        skipped: plan.skip,
        dry_run: options.dry_run,
        ..SyncReport::default()
    };
    for key in &report.skipped {
        tracing::debug!(bucket, key = %key, "Unchanged, skipping");
    }

    if options.dry_run {
        report.transferred = plan.upload;
        report.deleted = plan.delete;
        return Ok(report);
    }

    let paths: BTreeMap<&str, &Path> = local
        .iter()
        .map(|f| (f.key.as_str(), f.path.as_path()))
        .collect();
    for key in plan.upload {
        let Some(path) = paths.get(key.as_str()) else {
            continue;
        };
        let body = fs::read(path).map_err(|e| SyncError::io(*path, e))?;
        tracing::info!(file = %path.display(), "Uploading file to s3://{bucket}/{key}");
        client.put(bucket, &key, body, guess_content_type(&key)).await?;
        report.transferred.push(key);
    }

    for key in plan.delete {
        tracing::info!("Deleting s3://{bucket}/{key}");
        client.delete(bucket, &key).await?;
        report.deleted.push(key);
    }

    Ok(report)
}

fn guess_content_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
