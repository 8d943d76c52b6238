//! Connection descriptors.

use std::fmt;

use crate::schema::DatasetRef;

/// How the engine connection authenticates.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    /// No credentials (in-memory engines, interactive drivers).
    #[default]
    None,
    /// A bearer token obtained outside this crate.
    AccessToken(String),
}

impl Credentials {
    /// Read an access token from an environment variable, if set.
    pub fn from_env(var: &str) -> Self {
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Credentials::AccessToken(token),
            _ => Credentials::None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => write!(f, "None"),
            Credentials::AccessToken(_) => write!(f, "AccessToken(<redacted>)"),
        }
    }
}

/// Everything an engine adapter needs to open a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Dataset to connect to.
    pub dataset: DatasetRef,
    /// Credentials mode.
    pub credentials: Credentials,
}

impl ConnectionDescriptor {
    /// Create a descriptor for a dataset.
    pub fn new(dataset: DatasetRef, credentials: Credentials) -> Self {
        Self {
            dataset,
            credentials,
        }
    }

    /// XMLA-style connection string, without secrets.
    pub fn connection_string(&self) -> String {
        format!(
            "Data Source=powerbi://api.powerbi.com/v1.0/myorg/{};Initial Catalog={};",
            self.dataset.workspace, self.dataset.dataset
        )
    }
}
