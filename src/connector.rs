use crate::aws::AwsMeteringMediator;
use crate::config::ConnectionConfig;
use crate::error::{create_error, ErrorDetails, ProvideErrorDetails};
use crate::executor::{Pending, WorkerHandle, WorkerPool};
use crate::model::BatchMeterUsageRequest;
use crate::MeteringMediator;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::{ResultExt, Snafu};
use std::sync::Arc;

/// The connector a host holds for one metering client. It owns its share of the client and
/// submits the remote calls to a [`WorkerPool`]; requests and responses are host values.
///
/// Calls still in flight keep the client alive, so [`Connector::close`] never pulls the client
/// out from under them.
#[derive(Debug)]
pub struct Connector<M = AwsMeteringMediator> {
    mediator: Arc<M>,
    workers: WorkerHandle,
}

impl Connector<AwsMeteringMediator> {
    /// Creates a connector from a host configuration value:
    /// `{region, auth: {accessKeyId, secretAccessKey, sessionToken?}}`.
    pub fn init(config: &Value, pool: &WorkerPool) -> crate::Result<Self> {
        let config = ConnectionConfig::from_value(config).context(Init)?;
        Ok(Self::with_config(&config, pool))
    }

    pub fn with_config(config: &ConnectionConfig, pool: &WorkerPool) -> Self {
        Self::with_mediator(AwsMeteringMediator::new(config), pool)
    }
}

impl<M> Connector<M>
where
    M: MeteringMediator + Send + Sync + 'static,
{
    pub fn with_mediator(mediator: M, pool: &WorkerPool) -> Self {
        Self {
            mediator: Arc::new(mediator),
            workers: pool.handle(),
        }
    }

    /// The typed client behind this connector.
    pub fn mediator(&self) -> &M {
        &self.mediator
    }

    /// Resolves a registration token to `{customerAWSAccountId, customerIdentifier, productCode}`.
    pub fn resolve_customer(&self, registration_token: &str) -> Pending<Value> {
        let mediator = Arc::clone(&self.mediator);
        let registration_token = registration_token.to_string();
        self.workers.spawn(async move {
            debug!("Resolving customer for registration token");
            let response = mediator.resolve_customer(&registration_token).await?;
            to_host_value("resolve_customer", &response)
        })
    }

    /// Meters a batch of usage records. The request is converted before it is submitted, so a
    /// malformed request fails without reaching the pool.
    pub fn batch_meter_usage(&self, request: &Value) -> Pending<Value> {
        let request = match BatchMeterUsageRequest::deserialize(request).context(ParseRequest) {
            Ok(request) => request,
            Err(e) => return Pending::ready(Err(e.into())),
        };
        let mediator = Arc::clone(&self.mediator);
        self.workers.spawn(async move {
            let response = mediator.batch_meter_usage(&request).await?;
            to_host_value("batch_meter_usage", &response)
        })
    }

    /// Releases this connector's share of the client. If calls are still in flight the client
    /// stays alive until they finish and the overlap is reported as an error; the connector is
    /// consumed either way.
    pub fn close(self) -> crate::Result<()> {
        match Arc::try_unwrap(self.mediator) {
            Ok(mediator) => {
                drop(mediator);
                info!("Closed marketplace metering client");
                Ok(())
            }
            Err(shared) => {
                let in_flight = Arc::strong_count(&shared) - 1;
                warn!(
                    "Closing marketplace metering client with {} calls in flight",
                    in_flight
                );
                Ok(InFlight { in_flight }.fail()?)
            }
        }
    }
}

fn to_host_value<T: Serialize>(api: &'static str, response: &T) -> crate::Result<Value> {
    Ok(serde_json::to_value(response).context(RenderResponse { api })?)
}

/// The error type for this module.
#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display(
        "Closed marketplace metering client while {} calls were in flight",
        in_flight
    ))]
    InFlight { in_flight: usize },

    #[snafu(display("Failed to initialize the marketplace metering client: {}", source))]
    Init { source: crate::Error },

    #[snafu(display("Invalid batch-meter-usage request: {}", source))]
    ParseRequest { source: serde_json::Error },

    #[snafu(display("Failed to convert `{}` response: {}", api, source))]
    RenderResponse {
        api: &'static str,
        source: serde_json::Error,
    },
}

impl ProvideErrorDetails for Error {
    fn error_details(&self) -> ErrorDetails {
        match self {
            Error::Init { source } => source.error_details(),
            _ => ErrorDetails::default(),
        }
    }
}

impl From<Error> for crate::Error {
    fn from(e: Error) -> Self {
        create_error(e.to_string(), e)
    }
}
