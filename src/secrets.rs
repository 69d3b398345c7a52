use crate::error::RuntimeError;
use aws_sdk_secretsmanager::{Client, Error};

/// Read the collector token from Secrets Manager.
///
/// The secret id is logged, the token never is.
#[tracing::instrument(skip(client))]
pub async fn resolve_token(client: &Client, secret_id: &str) -> Result<String, RuntimeError> {
    tracing::info!("resolving hec token");

    let output = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(Error::from)?;

    output
        .secret_string
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RuntimeError::MissingSecret(secret_id.into()))
}
