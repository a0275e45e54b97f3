//! Book configuration loaded from the environment.
//!
//! | variable                  | values              | default                          |
//! |---------------------------|---------------------|----------------------------------|
//! | `BIZBOOK_CONTRACT_POLICY` | `panic` \| `report` | `panic` (debug), `report` (release) |
//! | `BIZBOOK_BACKEND`         | `memory` \| `events`| `memory`                         |

use std::str::FromStr;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use bizbook_core::ContractPolicy;

pub const CONTRACT_POLICY_VAR: &str = "BIZBOOK_CONTRACT_POLICY";
pub const BACKEND_VAR: &str = "BIZBOOK_BACKEND";

/// Which backend `open_book` attaches.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-memory store only.
    #[default]
    Memory,
    /// In-memory store plus lifecycle events on an in-memory bus.
    Events,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "events" => Ok(BackendKind::Events),
            other => bail!("unknown backend '{other}' (expected 'memory' or 'events')"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookConfig {
    pub contract_policy: ContractPolicy,
    pub backend: BackendKind,
}

impl BookConfig {
    /// Read the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(CONTRACT_POLICY_VAR) {
            config.contract_policy =
                parse_policy(&raw).with_context(|| format!("invalid {CONTRACT_POLICY_VAR}"))?;
        }
        if let Some(raw) = lookup(BACKEND_VAR) {
            config.backend = raw
                .parse::<BackendKind>()
                .with_context(|| format!("invalid {BACKEND_VAR}"))?;
        }

        Ok(config)
    }
}

fn parse_policy(raw: &str) -> anyhow::Result<ContractPolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "panic" => Ok(ContractPolicy::Panic),
        "report" => Ok(ContractPolicy::Report),
        other => bail!("unknown contract policy '{other}' (expected 'panic' or 'report')"),
    }
}
