//! Site-relative path handling.
//!
//! Every path stored on a page or asset is relative to the root of the
//! generated site. Paths are kept in a normalized form so that set
//! comparisons between template references and registered assets are exact:
//!
//! - `/` separators only
//! - no empty or `.` segments (`"."` and `""` both mean the site root)
//! - no `..` segments; a path that climbs above the root is rejected

use crate::ModelError;

/// Normalize a site-relative path.
///
/// `..` segments are resolved against the preceding segments. The site root
/// is returned as an empty string.
pub fn normalize_relpath(input: &str) -> Result<String, ModelError> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in input.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ModelError::PathEscapesRoot(input.to_owned()));
                }
            }
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

/// Join a normalized directory and a filename.
pub fn join_relpath(dir: &str, filename: &str) -> String {
    if dir.is_empty() {
        filename.to_owned()
    } else {
        format!("{dir}/{filename}")
    }
}

/// Resolve a reference found in a page template to a site-relative path.
///
/// Query strings and fragments are dropped. References starting with `/`
/// are taken from the site root; anything else is relative to `page_dir`,
/// the directory the rendered page is written to.
pub fn resolve_reference(page_dir: &str, reference: &str) -> Result<String, ModelError> {
    let without_fragment = reference.split('#').next().unwrap_or_default();
    let target = without_fragment.split('?').next().unwrap_or_default();

    if let Some(absolute) = target.strip_prefix('/') {
        return normalize_relpath(absolute);
    }
    normalize_relpath(&join_relpath(page_dir, target))
}

/// Prefix leading from a page directory back to the site root.
///
/// `""` for the root itself, `"../"` per directory level otherwise.
pub fn root_prefix(page_dir: &str) -> String {
    let depth = page_dir.split('/').filter(|s| !s.is_empty()).count();
    "../".repeat(depth)
}
