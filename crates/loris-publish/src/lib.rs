//! Bucket sync and site publishing for Loris.
//!
//! A site is published by instantiating it into a scratch directory and
//! syncing that directory to the site's staging or production bucket.
//! Files whose remote ETag already matches their MD5 are skipped.

mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod publish;
mod s3;
mod sync;

use async_trait::async_trait;

pub use error::SyncError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBucketClient, MockObject};
pub use publish::publish_site;
pub use s3::{S3BucketClient, S3Settings};
pub use sync::{
    LocalFile, SyncOptions, SyncPlan, SyncReport, collect_files, hash_files, plan, sync_directory,
};

/// An object listed in a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    /// ETag as returned by the service, quotes included.
    pub etag: Option<String>,
}

/// The bucket operations a sync needs.
#[async_trait]
pub trait BucketClient: Send + Sync {
    /// Every object in `bucket`.
    async fn list(&self, bucket: &str) -> Result<Vec<RemoteObject>, SyncError>;

    /// Store `body` under `key`.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), SyncError>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), SyncError>;
}
