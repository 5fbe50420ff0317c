//! Parses the host's connection configuration into a region and credentials.

use crate::error::{create_error, ProvideErrorDetails};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::{ensure, OptionExt, ResultExt, Snafu};
use std::fmt::{Debug, Formatter};

/// Partition-wide region identifiers. They name a partition rather than a location, so a client
/// bound to one signs its requests for the partition's home region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalRegion {
    Aws,
    AwsCn,
    AwsUsGov,
    AwsIso,
    AwsIsoB,
}

impl GlobalRegion {
    pub const ALL: [GlobalRegion; 5] = [
        GlobalRegion::Aws,
        GlobalRegion::AwsCn,
        GlobalRegion::AwsUsGov,
        GlobalRegion::AwsIso,
        GlobalRegion::AwsIsoB,
    ];

    pub fn id(self) -> &'static str {
        match self {
            GlobalRegion::Aws => "aws-global",
            GlobalRegion::AwsCn => "aws-cn-global",
            GlobalRegion::AwsUsGov => "aws-us-gov-global",
            GlobalRegion::AwsIso => "aws-iso-global",
            GlobalRegion::AwsIsoB => "aws-iso-b-global",
        }
    }

    /// The region requests are signed for when the client is bound to this alias.
    pub fn signing_region(self) -> &'static str {
        match self {
            GlobalRegion::Aws => "us-east-1",
            GlobalRegion::AwsCn => "cn-north-1",
            GlobalRegion::AwsUsGov => "us-gov-west-1",
            GlobalRegion::AwsIso => "us-iso-east-1",
            GlobalRegion::AwsIsoB => "us-isob-east-1",
        }
    }
}

/// A resolved region: one of the global aliases, or any other identifier taken as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    Global(GlobalRegion),
    Named(String),
}

impl Region {
    /// Matches `id` exactly against the global aliases; anything else is a named region.
    pub fn resolve(id: &str) -> Self {
        GlobalRegion::ALL
            .iter()
            .copied()
            .find(|global| global.id() == id)
            .map(Region::Global)
            .unwrap_or_else(|| Region::Named(id.to_string()))
    }

    pub fn id(&self) -> &str {
        match self {
            Region::Global(global) => global.id(),
            Region::Named(name) => name,
        }
    }

    pub(crate) fn signing_region(&self) -> &str {
        match self {
            Region::Global(global) => global.signing_region(),
            Region::Named(name) => name,
        }
    }
}

/// The `auth` block of the host configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

// secrets stay out of logs
impl Debug for AuthConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .finish()
    }
}

// the configuration exactly as the host supplies it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    region: String,
    auth: AuthConfig,
    #[serde(default)]
    endpoint_url: Option<String>,
    #[serde(default)]
    max_attempts: Option<u32>,
}

/// The connection configuration of one client. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    region: Region,
    auth: AuthConfig,
    endpoint_url: Option<url::Url>,
    max_attempts: Option<u32>,
}

impl ConnectionConfig {
    /// Parses a host configuration value:
    /// `{region, auth: {accessKeyId, secretAccessKey, sessionToken?}, endpointUrl?, maxAttempts?}`.
    pub fn from_value(value: &Value) -> crate::Result<Self> {
        let raw = RawConfig::deserialize(value).context(Parse)?;
        Ok(Self::from_raw(raw)?)
    }

    /// Reads the configuration from `AWS_REGION`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
    /// and the optional `AWS_SESSION_TOKEN`.
    pub fn from_env() -> crate::Result<Self> {
        let raw = RawConfig {
            region: env_var(ENV_REGION)?,
            auth: AuthConfig {
                access_key_id: env_var(ENV_ACCESS_KEY_ID)?,
                secret_access_key: env_var(ENV_SECRET_ACCESS_KEY)?,
                session_token: std::env::var(ENV_SESSION_TOKEN).ok(),
            },
            endpoint_url: None,
            max_attempts: None,
        };
        Ok(Self::from_raw(raw)?)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        ensure!(!raw.region.trim().is_empty(), EmptyRegion);
        let endpoint_url = match raw.endpoint_url {
            Some(endpoint) => Some(url::Url::parse(&endpoint).context(InvalidEndpoint { endpoint })?),
            None => None,
        };
        if let Some(attempts) = raw.max_attempts {
            ensure!(attempts > 0, ZeroAttempts);
        }
        Ok(Self {
            region: Region::resolve(&raw.region),
            auth: raw.auth,
            endpoint_url,
            max_attempts: raw.max_attempts,
        })
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn access_key_id(&self) -> &str {
        &self.auth.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.auth.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.auth.session_token.as_deref()
    }

    pub fn endpoint_url(&self) -> Option<&url::Url> {
        self.endpoint_url.as_ref()
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

const ENV_REGION: &str = "AWS_REGION";
const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

fn env_var(name: &'static str) -> Result<String> {
    std::env::var(name).ok().context(MissingEnv { name })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for this module.
#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("region must not be empty"))]
    EmptyRegion,

    #[snafu(display("Invalid endpoint URL `{}`: {}", endpoint, source))]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    #[snafu(display("Missing environment variable {}", name))]
    MissingEnv { name: &'static str },

    #[snafu(display("Invalid connection configuration: {}", source))]
    Parse { source: serde_json::Error },

    #[snafu(display("maxAttempts must be at least 1"))]
    ZeroAttempts,
}

impl ProvideErrorDetails for Error {}

impl From<Error> for crate::Error {
    fn from(e: Error) -> Self {
        create_error(e.to_string(), e)
    }
}
