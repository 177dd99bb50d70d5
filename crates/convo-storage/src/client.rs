use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use tracing::info;

/// Build an S3 client from the default AWS credential chain.
///
/// `endpoint` points the client at an S3-compatible store (MinIO,
/// LocalStack) and switches to path-style addressing.
pub async fn build_client(region: Option<&str>, endpoint: Option<&str>) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    let sdk_config = loader.load().await;

    let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
    if let Some(endpoint) = endpoint {
        info!(endpoint, "using custom S3 endpoint");
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    Client::from_conf(builder.build())
}
