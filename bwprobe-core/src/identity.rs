//! Node identity resolution
//!
//! Each node process derives a stable index from its hostname: cluster hosts
//! follow a fixed naming scheme with a 4-character prefix and a numeric
//! suffix (cave001, cave002, ...). The index selects which slice of the
//! target file this node reads during a partial probe, so a wrong index
//! silently skews the whole partitioning - identity resolution fails fast
//! instead of defaulting.

use crate::types::{ProbeError, Result};
use std::env;

/// Byte offset of the numeric node index within the hostname
pub const HOST_INDEX_OFFSET: usize = 4;

/// Immutable identity of one node process, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    /// Hostname as reported by the environment (e.g. "cave003")
    pub hostname: String,
    /// Node index parsed from the hostname suffix (e.g. 3)
    pub index: u32,
    /// Display identifier appended to the host tag in log lines (e.g. ":0.0")
    pub display_tag: String,
}

impl NodeIdentity {
    /// Resolve an identity from a hostname and display identifier
    ///
    /// The index is the integer value of the hostname substring starting at
    /// [`HOST_INDEX_OFFSET`]. Returns [`ProbeError::MalformedHostname`] when
    /// the hostname is too short or the suffix is not numeric.
    pub fn resolve(hostname: impl Into<String>, display: impl Into<String>) -> Result<Self> {
        let hostname = hostname.into();
        let suffix = hostname.get(HOST_INDEX_OFFSET..).unwrap_or("");
        let index = suffix
            .parse::<u32>()
            .map_err(|_| ProbeError::MalformedHostname {
                hostname: hostname.clone(),
                offset: HOST_INDEX_OFFSET,
            })?;

        log::debug!("Resolved node identity: {} -> index {}", hostname, index);

        Ok(Self {
            hostname,
            index,
            display_tag: display.into(),
        })
    }

    /// Resolve an identity from the process environment
    ///
    /// Reads `HOSTNAME` and `DISPLAY`. A missing `DISPLAY` yields an empty
    /// display tag; a missing `HOSTNAME` is a malformed-hostname error.
    pub fn from_env() -> Result<Self> {
        let hostname = env::var("HOSTNAME").map_err(|_| ProbeError::MalformedHostname {
            hostname: String::new(),
            offset: HOST_INDEX_OFFSET,
        })?;
        let display = env::var("DISPLAY").unwrap_or_default();
        Self::resolve(hostname, display)
    }

    /// The token log lines carry in their host field: hostname plus display
    /// tag, e.g. "cave003:0.0"
    pub fn host_tag(&self) -> String {
        format!("{}{}", self.hostname, self.display_tag)
    }
}
