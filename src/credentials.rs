use crate::config::ConnectionConfig;
use aws_sdk_marketplacemetering::config::Credentials as SdkCredentials;
use std::fmt::{Debug, Formatter};

// name reported by the SDK for credentials built here
const PROVIDER_NAME: &str = "aws-mpm-connector";

/// Static credentials for the metering client. A session token selects temporary session
/// credentials; without one the long-term access key pair is used.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic {
        access_key_id: String,
        secret_access_key: String,
    },
    Session {
        access_key_id: String,
        secret_access_key: String,
        session_token: String,
    },
}

impl Credentials {
    pub fn from_config(config: &ConnectionConfig) -> Self {
        match config.session_token() {
            Some(token) => Credentials::Session {
                access_key_id: config.access_key_id().to_string(),
                secret_access_key: config.secret_access_key().to_string(),
                session_token: token.to_string(),
            },
            None => Credentials::Basic {
                access_key_id: config.access_key_id().to_string(),
                secret_access_key: config.secret_access_key().to_string(),
            },
        }
    }

    pub fn is_session(&self) -> bool {
        matches!(self, Credentials::Session { .. })
    }

    pub fn access_key_id(&self) -> &str {
        match self {
            Credentials::Basic { access_key_id, .. } | Credentials::Session { access_key_id, .. } => {
                access_key_id
            }
        }
    }

    pub(crate) fn into_sdk(self) -> SdkCredentials {
        match self {
            Credentials::Basic {
                access_key_id,
                secret_access_key,
            } => SdkCredentials::new(access_key_id, secret_access_key, None, None, PROVIDER_NAME),
            Credentials::Session {
                access_key_id,
                secret_access_key,
                session_token,
            } => SdkCredentials::new(
                access_key_id,
                secret_access_key,
                Some(session_token),
                None,
                PROVIDER_NAME,
            ),
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_session() { "Session" } else { "Basic" };
        f.debug_struct(kind)
            .field("access_key_id", &self.access_key_id())
            .finish_non_exhaustive()
    }
}
