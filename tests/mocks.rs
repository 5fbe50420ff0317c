use async_trait::async_trait;
use aws_mpm_connector::model::{
    BatchMeterUsageRequest, BatchMeterUsageResponse, ResolveCustomerResponse,
};
use aws_mpm_connector::{create_error, ErrorDetails, MeteringMediator, ProvideErrorDetails, Result};
use mock_it::Mock;
use std::fmt::{Display, Formatter};

#[derive(Debug, Default, Clone, Eq, PartialEq)]
/// Reports the failure a mock was told to return. `details` stands in for the structured detail
/// an AWS service failure carries.
pub struct MockErr {
    pub msg: Option<String>,
    pub details: ErrorDetails,
}

impl Display for MockErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for MockErr {}

impl ProvideErrorDetails for MockErr {
    fn error_details(&self) -> ErrorDetails {
        self.details.clone()
    }
}

pub type MockResult<T> = std::result::Result<T, MockErr>;

pub struct MockMeteringMediator {
    pub resolve_customer: Mock<String, MockResult<ResolveCustomerResponse>>,
    pub batch_meter_usage: Mock<BatchMeterUsageRequest, MockResult<BatchMeterUsageResponse>>,
}

#[async_trait]
impl MeteringMediator for MockMeteringMediator {
    async fn resolve_customer(&self, registration_token: &str) -> Result<ResolveCustomerResponse> {
        self.resolve_customer
            .called(registration_token.to_string())
            .map_err(|e| create_error("Mock resolve-customer failed", e))
    }

    async fn batch_meter_usage(
        &self,
        request: &BatchMeterUsageRequest,
    ) -> Result<BatchMeterUsageResponse> {
        self.batch_meter_usage
            .called(request.clone())
            .map_err(|e| create_error("Mock batch-meter-usage failed", e))
    }
}

impl MockMeteringMediator {
    pub fn new() -> MockMeteringMediator {
        MockMeteringMediator {
            resolve_customer: Mock::new(Err(MockErr {
                msg: Some("Mock does not exist for given input".into()),
                ..MockErr::default()
            })),
            batch_meter_usage: Mock::new(Err(MockErr {
                msg: Some("Mock does not exist for given input".into()),
                ..MockErr::default()
            })),
        }
    }
}
