//! Field-by-field conversion between the host records in [`crate::model`] and the SDK's typed
//! shapes. Absent optional fields stay absent in both directions and present lists, even empty
//! ones, stay present.

use crate::error::{create_error, ProvideErrorDetails};
use crate::model::{
    BatchMeterUsageResponse, ResolveCustomerResponse, Tag, UsageAllocation, UsageRecord,
    UsageRecordResult, UsageRecordStatus,
};
use aws_sdk_marketplacemetering::error::BuildError;
use aws_sdk_marketplacemetering::operation::batch_meter_usage::BatchMeterUsageOutput;
use aws_sdk_marketplacemetering::operation::resolve_customer::ResolveCustomerOutput;
use aws_sdk_marketplacemetering::primitives::DateTime as SdkDateTime;
use aws_sdk_marketplacemetering::types as sdk;
use chrono::{DateTime, TimeZone, Utc};
use snafu::{OptionExt, ResultExt, Snafu};

pub(crate) fn to_sdk_usage_records(records: &[UsageRecord]) -> Result<Vec<sdk::UsageRecord>> {
    records.iter().map(to_sdk_usage_record).collect()
}

pub(crate) fn to_sdk_usage_record(record: &UsageRecord) -> Result<sdk::UsageRecord> {
    let usage_allocations = match &record.usage_allocations {
        Some(allocations) => Some(
            allocations
                .iter()
                .map(to_sdk_usage_allocation)
                .collect::<Result<Vec<_>>>()?,
        ),
        None => None,
    };
    sdk::UsageRecord::builder()
        .customer_identifier(&record.customer_identifier)
        .dimension(&record.dimension)
        .timestamp(to_sdk_timestamp(&record.timestamp))
        .set_quantity(record.quantity)
        .set_usage_allocations(usage_allocations)
        .build()
        .context(Build {
            shape: "UsageRecord",
        })
}

fn to_sdk_usage_allocation(allocation: &UsageAllocation) -> Result<sdk::UsageAllocation> {
    let tags = match &allocation.tags {
        Some(tags) => Some(tags.iter().map(to_sdk_tag).collect::<Result<Vec<_>>>()?),
        None => None,
    };
    sdk::UsageAllocation::builder()
        .allocated_usage_quantity(allocation.allocated_usage_quantity)
        .set_tags(tags)
        .build()
        .context(Build {
            shape: "UsageAllocation",
        })
}

fn to_sdk_tag(tag: &Tag) -> Result<sdk::Tag> {
    sdk::Tag::builder()
        .key(&tag.key)
        .value(&tag.value)
        .build()
        .context(Build { shape: "Tag" })
}

fn to_sdk_timestamp(time: &DateTime<Utc>) -> SdkDateTime {
    // chrono encodes a leap second as nanos past one second
    let nanos = time.timestamp_subsec_nanos().min(999_999_999);
    SdkDateTime::from_secs_and_nanos(time.timestamp(), nanos)
}

fn from_sdk_timestamp(time: &SdkDateTime) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(time.secs(), time.subsec_nanos())
        .single()
        .context(Timestamp {
            seconds: time.secs(),
        })
}

pub(crate) fn from_sdk_resolve_customer(output: ResolveCustomerOutput) -> ResolveCustomerResponse {
    ResolveCustomerResponse {
        customer_aws_account_id: output.customer_aws_account_id,
        customer_identifier: output.customer_identifier,
        product_code: output.product_code,
    }
}

pub(crate) fn from_sdk_batch_meter_usage(
    output: BatchMeterUsageOutput,
) -> Result<BatchMeterUsageResponse> {
    let results = output
        .results
        .unwrap_or_default()
        .into_iter()
        .map(from_sdk_usage_record_result)
        .collect::<Result<Vec<_>>>()?;
    let unprocessed_records = output
        .unprocessed_records
        .unwrap_or_default()
        .into_iter()
        .map(from_sdk_usage_record)
        .collect::<Result<Vec<_>>>()?;
    Ok(BatchMeterUsageResponse {
        results,
        unprocessed_records,
    })
}

fn from_sdk_usage_record_result(result: sdk::UsageRecordResult) -> Result<UsageRecordResult> {
    Ok(UsageRecordResult {
        metering_record_id: result.metering_record_id,
        status: result
            .status
            .map(|status| UsageRecordStatus::from(status.as_str())),
        usage_record: result.usage_record.map(from_sdk_usage_record).transpose()?,
    })
}

pub(crate) fn from_sdk_usage_record(record: sdk::UsageRecord) -> Result<UsageRecord> {
    let timestamp = from_sdk_timestamp(&record.timestamp)?;
    Ok(UsageRecord {
        customer_identifier: record.customer_identifier,
        dimension: record.dimension,
        timestamp,
        quantity: record.quantity,
        usage_allocations: record
            .usage_allocations
            .map(|allocations| allocations.into_iter().map(from_sdk_usage_allocation).collect()),
    })
}

fn from_sdk_usage_allocation(allocation: sdk::UsageAllocation) -> UsageAllocation {
    UsageAllocation {
        allocated_usage_quantity: allocation.allocated_usage_quantity,
        tags: allocation.tags.map(|tags| {
            tags.into_iter()
                .map(|tag| Tag {
                    key: tag.key,
                    value: tag.value,
                })
                .collect()
        }),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for this module.
#[derive(Debug, Snafu)]
pub(crate) enum Error {
    #[snafu(display("Failed to build SDK `{}`: {}", shape, source))]
    Build {
        shape: &'static str,
        source: BuildError,
    },

    #[snafu(display("Missing field in `{}` response: {}", api, field))]
    MissingField {
        api: &'static str,
        field: &'static str,
    },

    #[snafu(display("Timestamp out of range: {} seconds", seconds))]
    Timestamp { seconds: i64 },
}

impl ProvideErrorDetails for Error {}

impl From<Error> for crate::Error {
    fn from(e: Error) -> Self {
        create_error(e.to_string(), e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(quantity: Option<i32>, usage_allocations: Option<Vec<UsageAllocation>>) -> UsageRecord {
        UsageRecord {
            customer_identifier: "cust-1".to_string(),
            dimension: "seats".to_string(),
            timestamp: Utc.timestamp_opt(1_717_171_717, 123_456_789).unwrap(),
            quantity,
            usage_allocations,
        }
    }

    fn sdk_record(customer: &str) -> sdk::UsageRecord {
        sdk::UsageRecord::builder()
            .customer_identifier(customer)
            .dimension("seats")
            .timestamp(SdkDateTime::from_secs(1_700_000_000))
            .quantity(1)
            .build()
            .unwrap()
    }

    #[test]
    fn usage_record_round_trip_keeps_absence() {
        let minimal = record(None, None);
        let sdk = to_sdk_usage_record(&minimal).unwrap();
        assert_eq!(None, sdk.quantity);
        assert_eq!(None, sdk.usage_allocations);
        assert_eq!(minimal, from_sdk_usage_record(sdk).unwrap());
    }

    #[test]
    fn usage_record_round_trip_nested() {
        let full = record(
            Some(10),
            Some(vec![
                UsageAllocation {
                    allocated_usage_quantity: 6,
                    tags: Some(vec![
                        Tag {
                            key: "team".to_string(),
                            value: "red".to_string(),
                        },
                        Tag {
                            key: "env".to_string(),
                            value: "prod".to_string(),
                        },
                    ]),
                },
                UsageAllocation {
                    allocated_usage_quantity: 4,
                    tags: None,
                },
            ]),
        );
        let sdk = to_sdk_usage_record(&full).unwrap();
        assert_eq!(1_717_171_717, sdk.timestamp.secs());
        assert_eq!(123_456_789, sdk.timestamp.subsec_nanos());
        assert_eq!(full, from_sdk_usage_record(sdk).unwrap());
    }

    #[test]
    fn empty_lists_stay_present() {
        let with_empty = record(
            Some(1),
            Some(vec![UsageAllocation {
                allocated_usage_quantity: 1,
                tags: Some(vec![]),
            }]),
        );
        let sdk = to_sdk_usage_record(&with_empty).unwrap();
        assert_eq!(Some(0), sdk.usage_allocations.as_ref().and_then(|a| a[0].tags.as_ref()).map(Vec::len));
        assert_eq!(with_empty, from_sdk_usage_record(sdk).unwrap());

        let no_allocations = record(Some(1), Some(vec![]));
        let back = from_sdk_usage_record(to_sdk_usage_record(&no_allocations).unwrap()).unwrap();
        assert_eq!(Some(vec![]), back.usage_allocations);
    }

    #[test]
    fn batch_response_preserves_order() {
        let results = vec!["first", "second", "third"]
            .into_iter()
            .enumerate()
            .map(|(i, customer)| {
                let status = if i == 1 {
                    sdk::UsageRecordResultStatus::DuplicateRecord
                } else {
                    sdk::UsageRecordResultStatus::Success
                };
                sdk::UsageRecordResult::builder()
                    .metering_record_id(format!("id-{}", i))
                    .status(status)
                    .usage_record(sdk_record(customer))
                    .build()
            })
            .collect::<Vec<_>>();
        let output = BatchMeterUsageOutput::builder()
            .set_results(Some(results))
            .set_unprocessed_records(Some(vec![sdk_record("late-1"), sdk_record("late-2")]))
            .build();

        let response = from_sdk_batch_meter_usage(output).unwrap();
        assert_eq!(3, response.results.len());
        assert_eq!(2, response.unprocessed_records.len());
        let customers: Vec<_> = response
            .results
            .iter()
            .map(|r| r.usage_record.as_ref().unwrap().customer_identifier.as_str())
            .collect();
        assert_eq!(vec!["first", "second", "third"], customers);
        assert_eq!(Some(UsageRecordStatus::DuplicateRecord), response.results[1].status);
        assert_eq!(Some("id-2"), response.results[2].metering_record_id.as_deref());
        assert_eq!("late-2", response.unprocessed_records[1].customer_identifier);
    }

    #[test]
    fn batch_response_without_lists_is_empty() {
        let response = from_sdk_batch_meter_usage(BatchMeterUsageOutput::builder().build()).unwrap();
        assert_eq!(BatchMeterUsageResponse::default(), response);
    }

    #[test]
    fn result_without_fields_stays_empty() {
        let output = BatchMeterUsageOutput::builder()
            .set_results(Some(vec![sdk::UsageRecordResult::builder().build()]))
            .build();
        let response = from_sdk_batch_meter_usage(output).unwrap();
        assert_eq!(
            UsageRecordResult {
                metering_record_id: None,
                status: None,
                usage_record: None,
            },
            response.results[0]
        );
    }

    #[test]
    fn resolve_customer_passes_absent_fields_through() {
        let output = ResolveCustomerOutput::builder()
            .customer_aws_account_id("123456789012")
            .customer_identifier("cust-1")
            .product_code("prod-1")
            .build();
        let response = from_sdk_resolve_customer(output);
        assert_eq!(Some("123456789012"), response.customer_aws_account_id.as_deref());
        assert_eq!(Some("cust-1"), response.customer_identifier.as_deref());

        let partial = ResolveCustomerOutput::builder().product_code("prod-1").build();
        let response = from_sdk_resolve_customer(partial);
        assert_eq!(None, response.customer_identifier);
        assert_eq!(
            serde_json::json!({"productCode": "prod-1"}),
            serde_json::to_value(&response).unwrap()
        );
    }
}
