//! GraphQL client for the pool subgraph.
//!
//! Two queries run per export: one resolving the tick, one listing the
//! active loans that reference it. Filtering (pool, tick membership,
//! Active status) and ordering (ascending maturity) are done server side;
//! the client never re-filters or re-sorts what it receives.
//!
//! The HTTP layer is deliberately thin: one POST per query, no retries,
//! no pagination. A non-2xx status or a GraphQL `errors` payload aborts
//! the run.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::types::{CollateralToken, ExportError, Loan, Tick};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("tick-collateral/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Resolves a tick id to its raw value, redemption flag, and owning pool.
const TICK_QUERY: &str = r#"
query($tickId: String!) {
    tick(id: $tickId) {
        raw
        redemptionPending
        pool {
            id
        }
    }
}
"#;

/// Lists the active loans of a pool whose tick list contains the given
/// raw tick value, ordered by ascending maturity.
const LOANS_QUERY: &str = r#"
query($pool: String!, $tick: String!) {
    loans(
        where: {
            pool: $pool,
            ticks_contains: [$tick],
            status: Active
        }
        orderBy: maturity
        orderDirection: asc
    ) {
        id
        collateralToken {
            id
            name
        }
        collateralTokenIds
    }
}
"#;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GraphQlRequest {
    query: &'static str,
    variables: serde_json::Value,
}

/// Standard GraphQL response envelope. `data` and `errors` can coexist;
/// a non-empty `errors` list always wins.
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct TickData {
    #[serde(default)]
    tick: Option<TickNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickNode {
    raw: String,
    redemption_pending: bool,
    pool: PoolRef,
}

#[derive(Debug, Deserialize)]
struct PoolRef {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct LoansData {
    #[serde(default)]
    loans: Option<Vec<LoanNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoanNode {
    id: String,
    collateral_token: TokenNode,
    #[serde(deserialize_with = "token_ids")]
    collateral_token_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TokenNode {
    id: String,
    name: String,
}

/// Token ids arrive as strings, but some indexers emit bare numbers.
/// Accept both and normalize to the decimal string form.
fn token_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TokenId {
        Text(String),
        Number(serde_json::Number),
    }

    let raw = Vec::<TokenId>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|id| match id {
            TokenId::Text(s) => s,
            TokenId::Number(n) => n.to_string(),
        })
        .collect())
}

impl From<TickNode> for Tick {
    fn from(node: TickNode) -> Self {
        Self {
            raw: node.raw,
            pool_id: node.pool.id,
            redemption_pending: node.redemption_pending,
        }
    }
}

impl From<LoanNode> for Loan {
    fn from(node: LoanNode) -> Self {
        Self {
            id: node.id,
            collateral_token: CollateralToken {
                id: node.collateral_token.id,
                name: node.collateral_token.name,
            },
            collateral_token_ids: node.collateral_token_ids,
        }
    }
}

// ---------------------------------------------------------------------------
// Data source trait
// ---------------------------------------------------------------------------

/// Source of tick and loan data. The export pipeline depends on this
/// trait rather than on the HTTP client so tests can substitute canned
/// responses.
#[async_trait]
pub trait TickDataSource: Send + Sync {
    /// Resolve a tick by id. Fails with [`ExportError::TickNotFound`]
    /// when the subgraph has no tick under that id.
    async fn fetch_tick(&self, tick_id: &str) -> Result<Tick, ExportError>;

    /// List the active loans of `pool_id` referencing the raw tick value
    /// `tick_raw`, in ascending maturity order.
    async fn fetch_tick_loans(
        &self,
        pool_id: &str,
        tick_raw: &str,
    ) -> Result<Vec<Loan>, ExportError>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Client for a single subgraph endpoint.
pub struct SubgraphClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SubgraphClient {
    /// Build a client for the given endpoint URL.
    ///
    /// The endpoint embeds the API key, so it is never logged here.
    pub fn new(endpoint: String) -> Result<Self, ExportError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, endpoint })
    }

    /// POST one GraphQL query and return the raw response body.
    ///
    /// Non-2xx responses become [`ExportError::QueryFailed`] carrying the
    /// status code and body.
    async fn post_query(
        &self,
        query: &'static str,
        variables: serde_json::Value,
    ) -> Result<String, ExportError> {
        let request = GraphQlRequest { query, variables };
        let response = self.http.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(%status, body = %body, "Subgraph query failed");
            return Err(ExportError::QueryFailed { status, body });
        }
        Ok(body)
    }
}

#[async_trait]
impl TickDataSource for SubgraphClient {
    async fn fetch_tick(&self, tick_id: &str) -> Result<Tick, ExportError> {
        debug!(tick_id, "Querying tick");
        let body = self
            .post_query(TICK_QUERY, serde_json::json!({ "tickId": tick_id }))
            .await?;
        debug!(body = %body, "Tick query response");
        let envelope = decode::<GraphQlResponse<TickData>>(&body)?;
        parse_tick(envelope, tick_id)
    }

    async fn fetch_tick_loans(
        &self,
        pool_id: &str,
        tick_raw: &str,
    ) -> Result<Vec<Loan>, ExportError> {
        debug!(pool_id, tick_raw, "Querying active loans");
        let body = self
            .post_query(
                LOANS_QUERY,
                serde_json::json!({ "pool": pool_id, "tick": tick_raw }),
            )
            .await?;
        debug!(body = %body, "Loans query response");
        let envelope = decode::<GraphQlResponse<LoansData>>(&body)?;
        parse_loans(envelope)
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ExportError> {
    serde_json::from_str(body)
        .map_err(|e| ExportError::Malformed(format!("invalid JSON body: {e}")))
}

/// Unwrap a GraphQL envelope: a non-empty `errors` list fails the run
/// even when partial `data` is present; missing `data` is malformed.
fn check_errors<T>(envelope: GraphQlResponse<T>) -> Result<T, ExportError> {
    if !envelope.errors.is_empty() {
        let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
        return Err(ExportError::GraphQl(messages.join("; ")));
    }
    envelope
        .data
        .ok_or_else(|| ExportError::Malformed("response has no data field".to_string()))
}

fn parse_tick(envelope: GraphQlResponse<TickData>, tick_id: &str) -> Result<Tick, ExportError> {
    let data = check_errors(envelope)?;
    let node = data
        .tick
        .ok_or_else(|| ExportError::TickNotFound(tick_id.to_string()))?;
    Ok(node.into())
}

fn parse_loans(envelope: GraphQlResponse<LoansData>) -> Result<Vec<Loan>, ExportError> {
    let data = check_errors(envelope)?;
    let nodes = data
        .loans
        .ok_or_else(|| ExportError::Malformed("response has no loans field".to_string()))?;
    Ok(nodes.into_iter().map(Loan::from).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
