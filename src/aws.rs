use crate::config::ConnectionConfig;
use crate::convert;
use crate::credentials::Credentials;
use crate::error::{create_error, ErrorDetails, ProvideErrorDetails};
use crate::model::{BatchMeterUsageRequest, BatchMeterUsageResponse, ResolveCustomerResponse};
use crate::MeteringMediator;
use async_trait::async_trait;
use aws_sdk_marketplacemetering::config::http::HttpResponse;
use aws_sdk_marketplacemetering::config::retry::RetryConfig;
use aws_sdk_marketplacemetering::config::{BehaviorVersion, Region};
use aws_sdk_marketplacemetering::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_marketplacemetering::operation::batch_meter_usage::BatchMeterUsageError;
use aws_sdk_marketplacemetering::operation::resolve_customer::ResolveCustomerError;
use aws_sdk_marketplacemetering::{Client, Config};
use log::{debug, info};
use snafu::{ResultExt, Snafu};

/// The error type for this module.
#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display(
        "Failed to execute batch-meter-usage operation: {}",
        describe(source)
    ))]
    BatchMeterUsage {
        source: SdkError<BatchMeterUsageError, HttpResponse>,
    },

    #[snafu(display(
        "Failed to execute resolve-customer operation: {}",
        describe(source)
    ))]
    ResolveCustomer {
        source: SdkError<ResolveCustomerError, HttpResponse>,
    },
}

/// Short description of an SDK failure. A service failure is described by its error code and
/// message; any other failure by the display text of its error chain. The raw HTTP response never
/// appears here, only in the debug log.
fn describe<E>(err: &SdkError<E, HttpResponse>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    if let Some(service_error) = err.as_service_error() {
        let mut text = match (service_error.code(), service_error.message()) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (Some(code), None) => code.to_string(),
            (None, Some(message)) => message.to_string(),
            (None, None) => service_error.to_string(),
        };
        if let Some(raw) = err.raw_response() {
            text.push_str(&format!(" (status code {})", raw.status().as_u16()));
        }
        return text;
    }
    let mut text = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

impl ProvideErrorDetails for Error {
    fn error_details(&self) -> ErrorDetails {
        match self {
            Error::BatchMeterUsage { source } => source.error_details(),
            Error::ResolveCustomer { source } => source.error_details(),
        }
    }
}

impl From<Error> for crate::Error {
    fn from(e: Error) -> Self {
        match &e {
            Error::BatchMeterUsage { source } => debug!("{}", DisplayErrorContext(source)),
            Error::ResolveCustomer { source } => debug!("{}", DisplayErrorContext(source)),
        }
        create_error(e.to_string(), e)
    }
}

/// Create a metering client bound to the configured region, using static credentials.
fn build_client(config: &ConnectionConfig) -> Client {
    let credentials = Credentials::from_config(config);
    debug!(
        "Using {} credentials for access key {}",
        if credentials.is_session() { "session" } else { "basic" },
        credentials.access_key_id()
    );
    let mut builder = Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(config.region().signing_region().to_string()))
        .credentials_provider(credentials.into_sdk());
    if let Some(endpoint) = config.endpoint_url() {
        builder = builder.endpoint_url(endpoint.as_str());
    }
    if let Some(attempts) = config.max_attempts() {
        builder = builder.retry_config(RetryConfig::standard().with_max_attempts(attempts));
    }
    Client::from_conf(builder.build())
}

/// [`MeteringMediator`] backed by the AWS SDK client.
#[derive(Debug, Clone)]
pub struct AwsMeteringMediator {
    client: Client,
}

impl AwsMeteringMediator {
    pub fn new(config: &ConnectionConfig) -> Self {
        let client = build_client(config);
        info!(
            "Created marketplace metering client for region {}",
            config.region().id()
        );
        Self { client }
    }

    /// Wraps an already configured SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MeteringMediator for AwsMeteringMediator {
    async fn resolve_customer(
        &self,
        registration_token: &str,
    ) -> crate::Result<ResolveCustomerResponse> {
        let output = self
            .client
            .resolve_customer()
            .registration_token(registration_token)
            .send()
            .await
            .context(ResolveCustomer)?;
        Ok(convert::from_sdk_resolve_customer(output))
    }

    async fn batch_meter_usage(
        &self,
        request: &BatchMeterUsageRequest,
    ) -> crate::Result<BatchMeterUsageResponse> {
        let usage_records = convert::to_sdk_usage_records(&request.usage_records)?;
        debug!(
            "Metering {} usage records for product {}",
            usage_records.len(),
            request.product_code
        );
        let output = self
            .client
            .batch_meter_usage()
            .product_code(&request.product_code)
            .set_usage_records(Some(usage_records))
            .send()
            .await
            .context(BatchMeterUsage)?;
        let response = convert::from_sdk_batch_meter_usage(output)?;
        debug!(
            "batch-meter-usage returned {} results and {} unprocessed records",
            response.results.len(),
            response.unprocessed_records.len()
        );
        Ok(response)
    }
}
