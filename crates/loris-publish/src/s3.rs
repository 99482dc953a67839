//! S3 bucket client.

use std::error::Error;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::{BucketClient, RemoteObject, SyncError};

/// Connection settings for S3 or an S3-compatible service.
#[derive(Debug, Clone)]
pub struct S3Settings {
    /// S3-compatible endpoint URL.
    pub endpoint: Option<String>,
    /// AWS region.
    pub region: String,
}

/// [`BucketClient`] backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct S3BucketClient {
    client: Client,
}

impl S3BucketClient {
    pub async fn connect(settings: &S3Settings) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(settings.region.clone()));

        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        // Custom endpoints (LocalStack, MinIO) need path-style addressing
        // (endpoint/bucket/key) instead of bucket.endpoint/key.
        let client = if settings.endpoint.is_some() {
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        } else {
            Client::new(&sdk_config)
        };
        Self { client }
    }
}

#[async_trait]
impl BucketClient for S3BucketClient {
    async fn list(&self, bucket: &str) -> Result<Vec<RemoteObject>, SyncError> {
        let mut objects = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| SyncError::S3(error_chain(&e)))?;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    objects.push(RemoteObject {
                        key: key.to_owned(),
                        etag: object.e_tag().map(str::to_owned),
                    });
                }
            }
        }
        Ok(objects)
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), SyncError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| SyncError::S3(error_chain(&e)))?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), SyncError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| SyncError::S3(error_chain(&e)))?;
        Ok(())
    }
}

/// Walk the error source chain and join all messages.
fn error_chain(err: &dyn Error) -> String {
    let mut msgs = vec![err.to_string()];
    let mut source = err.source();
    while let Some(s) = source {
        msgs.push(s.to_string());
        source = s.source();
    }
    msgs.join(": ")
}
