//! Data records for the Loris static site CMS.
//!
//! Records are plain structs shared by the persistence layer (`loris-db`) and
//! the instantiation pipeline (`loris-site`). Field-level rules (lengths,
//! bucket names, relative paths) live here so every entry point enforces the
//! same constraints.

mod account;
mod error;
mod news;
mod path;
mod site;
mod validate;

pub use account::{NewUser, Organization, OrganizationEmailDomain, OrganizationUser, normalize_domain};
pub use error::ModelError;
pub use news::{
    DEFAULT_IMAGE_RELPATH, NewsImage, NewsItem, latest_published, paginate, published_sorted,
    total_pages,
};
pub use path::{join_relpath, normalize_relpath, resolve_reference, root_prefix};
pub use site::{
    FileType, INDEX_FILENAME, IndexPage, NewsPage, NewsSection, Page, PageAsset, PageType,
    SiteSnapshot, StaticSite, SyncTarget,
};
pub use validate::{validate_bucket_name, validate_filename, validate_length};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who created and last touched a record, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Audit {
    pub created_by: i64,
    pub updated_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Audit {
    /// Audit stamp for a record created now by `user_id`.
    #[must_use]
    pub fn created_now(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            created_by: user_id,
            updated_by: user_id,
            created_at: now,
            updated_at: now,
        }
    }
}
