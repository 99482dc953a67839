//! In-memory bucket client for testing.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use md5::{Digest, Md5};

use crate::{BucketClient, RemoteObject, SyncError};

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub etag: String,
}

/// In-memory [`BucketClient`].
///
/// ETags are the quoted MD5 of the body, like S3 single-part uploads.
#[derive(Debug, Default)]
pub struct MockBucketClient {
    buckets: RwLock<BTreeMap<String, BTreeMap<String, MockObject>>>,
}

impl MockBucketClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object with an explicit ETag.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_object(self, bucket: &str, key: &str, etag: &str) -> Self {
        self.buckets
            .write()
            .unwrap()
            .entry(bucket.to_owned())
            .or_default()
            .insert(
                key.to_owned(),
                MockObject {
                    body: Vec::new(),
                    content_type: "application/octet-stream".to_owned(),
                    etag: etag.to_owned(),
                },
            );
        self
    }

    /// Object stored under `key`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn object(&self, bucket: &str, key: &str) -> Option<MockObject> {
        self.buckets
            .read()
            .unwrap()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    /// Sorted keys stored in `bucket`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .read()
            .unwrap()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BucketClient for MockBucketClient {
    async fn list(&self, bucket: &str) -> Result<Vec<RemoteObject>, SyncError> {
        Ok(self
            .buckets
            .read()
            .unwrap()
            .get(bucket)
            .map(|objects| {
                objects
                    .iter()
                    .map(|(key, object)| RemoteObject {
                        key: key.clone(),
                        etag: Some(object.etag.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), SyncError> {
        let etag = format!("\"{}\"", hex::encode(Md5::digest(&body)));
        self.buckets
            .write()
            .unwrap()
            .entry(bucket.to_owned())
            .or_default()
            .insert(
                key.to_owned(),
                MockObject {
                    body,
                    content_type: content_type.to_owned(),
                    etag,
                },
            );
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), SyncError> {
        if let Some(objects) = self.buckets.write().unwrap().get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }
}
