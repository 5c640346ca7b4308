use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ArchiveConfig;

/// Copies exported PDFs to object storage. Failures never reach the caller.
#[derive(Clone)]
pub struct ExportArchive {
    s3: S3Client,
    bucket: String,
}

impl ExportArchive {
    pub async fn connect(config: &ArchiveConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "resume-api-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        Self {
            s3: S3Client::new(&s3_config),
            bucket: config.bucket.clone(),
        }
    }

    pub fn key_for(resume_id: Uuid, template: &str) -> String {
        format!("{resume_id}/{template}.pdf")
    }

    pub async fn put(&self, resume_id: Uuid, template: &str, pdf: Vec<u8>) -> Result<String> {
        let key = Self::key_for(resume_id, template);
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(pdf))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Archived export to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    /// Uploads in the background; a failed upload is logged and dropped.
    pub fn spawn_put(&self, resume_id: Uuid, template: &str, pdf: Vec<u8>) {
        let archive = self.clone();
        let template = template.to_string();
        tokio::spawn(async move {
            if let Err(e) = archive.put(resume_id, &template, pdf).await {
                warn!(resume_id = %resume_id, "Export archiving failed: {e}");
            }
        });
    }
}
