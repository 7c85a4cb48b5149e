//! Static capability descriptor
//!
//! Declares which optional operations this provider supports. Pure
//! configuration, exposed once per session negotiation.

use serde::Serialize;

/// Capability flags for the provider contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub browse: bool,
    pub search: bool,
    pub edit: bool,
    pub multi_series: bool,
    pub meta: bool,
    pub revisions: bool,
    pub revisions_release: bool,
    pub revisions_complete_history: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        // The reference provider implements the full contract.
        Self {
            browse: true,
            search: true,
            edit: true,
            multi_series: true,
            meta: true,
            revisions: true,
            revisions_release: true,
            revisions_complete_history: true,
        }
    }
}
