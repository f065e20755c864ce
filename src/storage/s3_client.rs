// glacier-restore/src/storage/s3_client.rs
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::config::Region;
use s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use s3::types::{GlacierJobParameters, OutputLocation, RestoreRequest, S3Location};

use super::{ListPage, ObjectHead, ObjectRef, ObjectStore, PageEntry, RemoteError, RestoreTarget, RestoreTask, Tier};
use crate::config::RemoteSettings;

/// `ObjectStore` backed by the AWS S3 SDK.
pub struct S3ObjectStore {
    client: s3::Client,
}

impl S3ObjectStore {
    /// Builds a client from the default credential chain, optionally narrowed to a
    /// named profile, region or S3-compatible endpoint.
    pub async fn connect(remote: &RemoteSettings) -> Self {
        let mut loader = aws_config::defaults(s3::config::BehaviorVersion::latest());
        if let Some(profile) = &remote.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &remote.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &remote.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let client = if remote.endpoint_url.is_some() {
            // Most S3-compatible stores only serve path-style requests.
            let conf = s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build();
            s3::Client::from_conf(conf)
        } else {
            s3::Client::new(&sdk_config)
        };
        tracing::debug!(profile = ?remote.profile, region = ?remote.region, "S3 client ready");

        Self { client }
    }
}

fn remote_error<E, R>(err: SdkError<E, R>) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().unwrap_or("Unknown").to_string();
    RemoteError::new(code, DisplayErrorContext(&err).to_string())
}

fn sdk_tier(tier: Tier) -> s3::types::Tier {
    match tier {
        Tier::Expedited => s3::types::Tier::Expedited,
        Tier::Standard => s3::types::Tier::Standard,
        Tier::Bulk => s3::types::Tier::Bulk,
    }
}

fn build_error(err: s3::error::BuildError) -> RemoteError {
    RemoteError::new("InvalidRequest", err.to_string())
}

fn restore_request(task: &RestoreTask) -> Result<RestoreRequest, RemoteError> {
    let tier = sdk_tier(task.tier);
    let request = match &task.target {
        RestoreTarget::InPlace { days } => {
            let job = GlacierJobParameters::builder()
                .tier(tier)
                .build()
                .map_err(build_error)?;
            RestoreRequest::builder()
                .days(*days)
                .glacier_job_parameters(job)
                .build()
        }
        RestoreTarget::Destination { bucket } => {
            let location = S3Location::builder()
                .bucket_name(bucket)
                .prefix(&task.object.key)
                .build()
                .map_err(build_error)?;
            RestoreRequest::builder()
                .tier(tier)
                .output_location(OutputLocation::builder().s3(location).build())
                .build()
        }
    };
    Ok(request)
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        token: Option<String>,
    ) -> Result<ListPage, RemoteError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(token)
            .send()
            .await
            .map_err(remote_error)?;

        let entries = output
            .contents()
            .iter()
            .filter_map(|object| {
                object.key().map(|key| PageEntry {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                })
            })
            .collect();

        Ok(ListPage {
            entries,
            next_token: output.next_continuation_token().map(str::to_owned),
        })
    }

    async fn head_object(&self, object: &ObjectRef) -> Result<ObjectHead, RemoteError> {
        let output = self
            .client
            .head_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(remote_error)?;

        Ok(ObjectHead {
            storage_class: output.storage_class().map(|class| class.as_str().to_string()),
            restore: output.restore().map(str::to_owned),
        })
    }

    async fn restore_object(&self, task: &RestoreTask) -> Result<(), RemoteError> {
        let request = restore_request(task)?;
        self.client
            .restore_object()
            .bucket(&task.object.bucket)
            .key(&task.object.key)
            .restore_request(request)
            .send()
            .await
            .map_err(remote_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(target: RestoreTarget) -> RestoreTask {
        RestoreTask {
            object: ObjectRef::new("cold", "2020/db.tar.gz", 10),
            tier: Tier::Bulk,
            target,
        }
    }

    #[test]
    fn test_in_place_request_carries_days_and_tier() -> anyhow::Result<()> {
        let request = restore_request(&task(RestoreTarget::InPlace { days: 7 }))?;
        assert_eq!(request.days(), Some(7));
        let job = request.glacier_job_parameters().expect("job parameters");
        assert_eq!(job.tier(), &s3::types::Tier::Bulk);
        assert!(request.output_location().is_none());
        Ok(())
    }

    #[test]
    fn test_destination_request_preserves_key() -> anyhow::Result<()> {
        let request = restore_request(&task(RestoreTarget::Destination {
            bucket: "warm".to_string(),
        }))?;
        assert_eq!(request.days(), None);
        let location = request
            .output_location()
            .and_then(|output| output.s3())
            .expect("s3 output location");
        assert_eq!(location.bucket_name(), "warm");
        assert_eq!(location.prefix(), "2020/db.tar.gz");
        Ok(())
    }
}
