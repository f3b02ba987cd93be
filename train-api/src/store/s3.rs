//! S3-backed object store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use super::{ObjectStore, ObjectStoreError, ObjectSummary};

/// Connection settings for an S3 bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Object store reading from an S3 bucket.
pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    pub fn new(config: &S3Config) -> Result<Self, ObjectStoreError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| ObjectStoreError::Config(e.to_string()))?;

        let bucket = match config.region.parse::<Region>() {
            // Anything not a known AWS region is treated as an endpoint (e.g. MinIO)
            Ok(Region::Custom { .. }) => {
                let region = Region::Custom {
                    region: String::new(),
                    endpoint: config.region.clone(),
                };
                Bucket::new(&config.bucket, region, credentials)
                    .map(|bucket| bucket.with_path_style())
            }
            Ok(region) => Bucket::new(&config.bucket, region, credentials),
            Err(e) => return Err(ObjectStoreError::Config(e.to_string())),
        }
        .map_err(|e| ObjectStoreError::Config(e.to_string()))?;

        Ok(Self { bucket })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, ObjectStoreError> {
        let pages = self
            .bucket
            .list(prefix.to_string(), None)
            .await
            .map_err(|e| ObjectStoreError::List {
                prefix: prefix.to_string(),
                message: e.to_string(),
            })?;

        let objects: Vec<ObjectSummary> = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| ObjectSummary {
                last_modified: DateTime::parse_from_rfc3339(&object.last_modified)
                    .ok()
                    .map(|t| t.with_timezone(&Utc)),
                etag: object.e_tag,
                size: object.size,
                key: object.key,
            })
            .collect();

        debug!(bucket = %self.bucket.name, prefix, count = objects.len(), "listed objects");
        Ok(objects)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| ObjectStoreError::Get {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        match response.status_code() {
            200 => Ok(response.bytes().to_vec()),
            404 => Err(ObjectStoreError::NotFound(key.to_string())),
            status => Err(ObjectStoreError::Get {
                key: key.to_string(),
                message: format!("status code {status}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(region: &str) -> S3Config {
        S3Config {
            region: region.into(),
            bucket: "darwin.xmltimetable".into(),
            access_key: "access".into(),
            secret_key: "secret".into(),
        }
    }

    #[test]
    fn builds_for_aws_region() {
        assert!(S3Store::new(&config("eu-west-1")).is_ok());
    }

    #[test]
    fn builds_for_custom_endpoint() {
        assert!(S3Store::new(&config("http://localhost:9000")).is_ok());
    }
}
