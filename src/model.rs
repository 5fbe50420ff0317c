/*!
Host-side records of the metering operations. Field names follow the host's camelCase record
fields, so these types serialize to and deserialize from the dynamic values the host exchanges.

An optional field that is `None` is omitted from the host value; a present but empty list is kept
as an empty list.
*/
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Response of `ResolveCustomer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveCustomerResponse {
    #[serde(
        rename = "customerAWSAccountId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_aws_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMeterUsageRequest {
    pub product_code: String,
    pub usage_records: Vec<UsageRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMeterUsageResponse {
    // per-record outcome of the records the service accepted
    pub results: Vec<UsageRecordResult>,
    // records the service could not process at all
    pub unprocessed_records: Vec<UsageRecord>,
}

/// One meterable usage event of a customer for a dimension at an instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub customer_identifier: String,
    pub dimension: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_allocations: Option<Vec<UsageAllocation>>,
}

/// A share of a usage record's quantity, optionally tagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageAllocation {
    pub allocated_usage_quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecordResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metering_record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UsageRecordStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_record: Option<UsageRecord>,
}

/// Outcome of one record in a `BatchMeterUsage` call. A status this library does not know is
/// carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UsageRecordStatus {
    Success,
    CustomerNotSubscribed,
    DuplicateRecord,
    Unknown(String),
}

impl UsageRecordStatus {
    pub fn as_str(&self) -> &str {
        match self {
            UsageRecordStatus::Success => "Success",
            UsageRecordStatus::CustomerNotSubscribed => "CustomerNotSubscribed",
            UsageRecordStatus::DuplicateRecord => "DuplicateRecord",
            UsageRecordStatus::Unknown(status) => status,
        }
    }
}

impl From<&str> for UsageRecordStatus {
    fn from(status: &str) -> Self {
        match status {
            "Success" => UsageRecordStatus::Success,
            "CustomerNotSubscribed" => UsageRecordStatus::CustomerNotSubscribed,
            "DuplicateRecord" => UsageRecordStatus::DuplicateRecord,
            other => UsageRecordStatus::Unknown(other.to_string()),
        }
    }
}

impl From<String> for UsageRecordStatus {
    fn from(status: String) -> Self {
        UsageRecordStatus::from(status.as_str())
    }
}

impl From<UsageRecordStatus> for String {
    fn from(status: UsageRecordStatus) -> Self {
        status.as_str().to_string()
    }
}

impl Display for UsageRecordStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host timestamps. Accepted as an RFC 3339 string or as the host's UTC tuple
/// `[seconds, fractionalSeconds]`.
///
/// Output is always an RFC 3339 string in UTC with a `Z` suffix, whichever form came in, so a host
/// that sends tuples gets strings back in `results` and `unprocessedRecords`.
pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HostTime {
        Text(String),
        Tuple(i64, f64),
    }

    pub(crate) fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match HostTime::deserialize(deserializer)? {
            HostTime::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|time| time.with_timezone(&Utc))
                .map_err(D::Error::custom),
            HostTime::Tuple(seconds, fraction) => {
                if !(0.0..1.0).contains(&fraction) {
                    return Err(D::Error::custom(format!(
                        "fractional seconds out of range: {}",
                        fraction
                    )));
                }
                let nanos = (fraction * 1e9).round().min(999_999_999.0) as u32;
                Utc.timestamp_opt(seconds, nanos)
                    .single()
                    .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", seconds)))
            }
        }
    }
}
