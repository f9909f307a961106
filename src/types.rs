//! Shared types for the tick collateral exporter.
//!
//! The data model mirrors what the subgraph returns: a tick resolved once
//! per run, the active loans referencing it, and the flattened CSV rows
//! derived from them. Nothing here outlives a single run.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// A lending pool tick, fetched once per run and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Opaque string-encoded numeric value identifying the tick on-chain.
    pub raw: String,
    /// Identifier of the pool the tick belongs to.
    pub pool_id: String,
    /// Whether the tick has a pending redemption request.
    pub redemption_pending: bool,
}

// ---------------------------------------------------------------------------
// Loan
// ---------------------------------------------------------------------------

/// The collateral token contract backing a loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateralToken {
    pub id: String,
    pub name: String,
}

/// An active loan referencing the queried tick.
///
/// Loans arrive pre-filtered (pool match, tick match, status Active) and
/// pre-sorted by ascending maturity; both are contracts of the subgraph and
/// the list is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub id: String,
    pub collateral_token: CollateralToken,
    /// Token ids in list order as returned by the subgraph.
    pub collateral_token_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Report row
// ---------------------------------------------------------------------------

/// One CSV record: a single collateral token backing a single loan.
///
/// The pool id and redemption flag are denormalized onto every row. Field
/// order is column order; field names are the column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub pool_id: String,
    pub redemption_pending: bool,
    pub loan_id: String,
    pub collection_contract: String,
    pub collection_name: String,
    pub token: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Everything that can go wrong while producing a report.
///
/// All of these are fatal to the run; there is no retry. The query variants
/// carry the HTTP status code and response body so a failed run can be
/// diagnosed from the log alone.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Subgraph request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Query failed with status code {status}: {body}")]
    QueryFailed {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Subgraph returned errors: {0}")]
    GraphQl(String),

    #[error("Tick not found: {0}")]
    TickNotFound(String),

    #[error("Malformed subgraph response: {0}")]
    Malformed(String),

    #[error("Failed to write report: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_failed_display_contains_status_code() {
        let e = ExportError::QueryFailed {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream unavailable".to_string(),
        };
        let msg = e.to_string();
        assert!(msg.contains("502"), "missing status code in: {msg}");
        assert!(msg.contains("upstream unavailable"));
    }

    #[test]
    fn test_tick_not_found_display_names_the_tick() {
        let e = ExportError::TickNotFound("0xdeadbeef-1".to_string());
        assert!(e.to_string().contains("0xdeadbeef-1"));
    }

    #[test]
    fn test_config_error_display() {
        let e = ExportError::Config("GRAPHQL_SECRET is not set".to_string());
        assert_eq!(
            e.to_string(),
            "Configuration error: GRAPHQL_SECRET is not set"
        );
    }

    #[test]
    fn test_graphql_error_display_carries_messages() {
        let e = ExportError::GraphQl("tick id malformed; field unknown".to_string());
        assert!(e.to_string().contains("tick id malformed"));
    }
}
