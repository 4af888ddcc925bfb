// src/types/classification.rs
//! Requirement categories and the typed result of the classification phase.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four requirement categories the classifier may choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Monitoring, performance, NetFlow, IP settings, application layer.
    #[serde(rename = "CP")]
    Cp,
    /// Routing protocols: OSPF, BGP, RIP, routing tables.
    #[serde(rename = "RP")]
    Rp,
    /// Access control lists and firewall rules.
    #[serde(rename = "ACL")]
    Acl,
    /// Tunnels and VPNs only: IPSec, GRE, site-to-site.
    #[serde(rename = "TN")]
    Tn,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Cp, Category::Rp, Category::Acl, Category::Tn];

    /// The exact wire token the model is asked to produce.
    pub fn token(self) -> &'static str {
        match self {
            Self::Cp => "CP",
            Self::Rp => "RP",
            Self::Acl => "ACL",
            Self::Tn => "TN",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Cp => "configuration & performance",
            Self::Rp => "routing protocols",
            Self::Acl => "access control",
            Self::Tn => "tunnels & VPNs",
        }
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    /// Parses an exact token. `"rp"` or `" RP"` are not categories.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.token() == s)
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Category plus ordered implementation steps, exactly as the model produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub category: Category,
    pub steps: Vec<String>,
}

impl Classification {
    pub fn new(category: Category, steps: Vec<String>) -> Self {
        Self { category, steps }
    }

    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }
}
