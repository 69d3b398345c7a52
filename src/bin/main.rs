use aws_sdk_s3::Client as S3Client;
use aws_sdk_secretsmanager::Client as SecretsClient;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use s3_hec_forwarder::{handle_records, secrets, Config, HecClient, Pipeline, SqsEvent};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    let config = Config::from_env()?;

    // Get AWS Configuration
    let aws_config = aws_config::load_from_env().await;
    let secrets_client = SecretsClient::new(&aws_config);
    let token = secrets::resolve_token(&secrets_client, &config.hec_token_secret_id).await?;

    let hec = HecClient::new(
        &config.hec_url,
        &token,
        config.hec_timeout,
        config.verify_tls,
    )?;
    let pipeline = Pipeline::new(&config, S3Client::new(&aws_config), Arc::new(hec));

    run(service_fn(|event: LambdaEvent<SqsEvent>| {
        handle_records(&pipeline, event)
    }))
    .await
}
