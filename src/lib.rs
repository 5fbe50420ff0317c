/*!
A connector that lets a host runtime call the AWS Marketplace Metering operations
`ResolveCustomer` and `BatchMeterUsage` through the AWS SDK.

The host exchanges dynamic record values (`serde_json::Value`); [`Connector`] converts them to
the SDK's typed shapes and back, runs the remote calls on a [`WorkerPool`], and reports every
failure as an [`Error`] carrying the original cause and, for service failures, the HTTP status
and AWS error code.

```no_run
use aws_mpm_connector::{Connector, WorkerPool};
use serde_json::json;

# fn main() -> aws_mpm_connector::Result<()> {
let pool = WorkerPool::new(WorkerPool::DEFAULT_WORKER_THREADS)?;
let connector = Connector::init(
    &json!({"region": "us-east-1", "auth": {"accessKeyId": "AKIA...", "secretAccessKey": "..."}}),
    &pool,
)?;
let customer = pool.block_on(connector.resolve_customer("registration-token"))?;
println!("{}", customer["customerIdentifier"]);
connector.close()?;
# Ok(())
# }
```
!*/

#![deny(rust_2018_idioms)]

mod aws;
mod config;
mod connector;
mod convert;
mod credentials;
mod error;
mod executor;
pub mod model;

pub use crate::aws::AwsMeteringMediator;
pub use crate::config::{AuthConfig, ConnectionConfig, GlobalRegion, Region};
pub use crate::connector::Connector;
pub use crate::credentials::Credentials;
pub use crate::error::{create_error, Error, ErrorDetails, ProvideErrorDetails, Result};
pub use crate::executor::{Pending, WorkerHandle, WorkerPool};

use crate::model::{BatchMeterUsageRequest, BatchMeterUsageResponse, ResolveCustomerResponse};
use async_trait::async_trait;

/// Introducing a trait abstraction over the metering API allows us to mock the API and test the
/// connector without going to the level of the SDK's HTTP layer. Implementations report every
/// failure as an [`Error`].
#[async_trait]
pub trait MeteringMediator {
    /// Resolves a registration token to the customer and product it was issued for.
    async fn resolve_customer(&self, registration_token: &str)
        -> Result<ResolveCustomerResponse>;

    /// Submits usage records. Records the service rejects individually are reported in the
    /// response, not as an error.
    async fn batch_meter_usage(
        &self,
        request: &BatchMeterUsageRequest,
    ) -> Result<BatchMeterUsageResponse>;
}
