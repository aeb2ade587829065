//! JSON-RPC ledger client over HTTP.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use splitline_transactions::{InclusionProof, MintCommitment, TransferCommitment};
use splitline_types::RequestId;
use std::time::Duration;

use crate::client::LedgerClient;
use crate::error::LedgerError;
use crate::status::SubmitStatus;

/// HTTP client for an aggregator node's JSON-RPC endpoint.
///
/// Every call is a POST of `{"action": ..., ...params}`; the node answers
/// with `{"result": ...}` or `{"error": "..."}`.
#[derive(Clone)]
pub struct RpcLedgerClient {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResult {
    status: SubmitStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProofResult {
    #[serde(default)]
    inclusion_proof: Option<InclusionProof>,
}

impl RpcLedgerClient {
    /// Create a client for `endpoint` (e.g. `https://aggregator.example/rpc`).
    pub fn new(
        endpoint: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn rpc_call(&self, action: &str, params: Value) -> Result<Value, LedgerError> {
        let body = with_action(action, params)?;

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(LedgerError::Http {
                status: response.status().as_u16(),
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(format!("invalid JSON: {e}")))?;
        unwrap_result(json)
    }

    async fn submit_commitment(
        &self,
        request_id: &RequestId,
        commitment: Value,
    ) -> Result<SubmitStatus, LedgerError> {
        let result = self
            .rpc_call(
                "submit_commitment",
                json!({ "requestId": request_id, "commitment": commitment }),
            )
            .await?;
        parse_submit_result(result)
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn submit_mint(&self, commitment: &MintCommitment) -> Result<SubmitStatus, LedgerError> {
        let body = serde_json::to_value(commitment)?;
        self.submit_commitment(&commitment.request_id, body).await
    }

    async fn submit_transfer(
        &self,
        commitment: &TransferCommitment,
    ) -> Result<SubmitStatus, LedgerError> {
        let body = serde_json::to_value(commitment)?;
        self.submit_commitment(&commitment.request_id, body).await
    }

    async fn get_inclusion_proof(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<InclusionProof>, LedgerError> {
        let result = self
            .rpc_call("get_inclusion_proof", json!({ "requestId": request_id }))
            .await?;
        parse_proof_result(result)
    }
}

fn with_action(action: &str, params: Value) -> Result<Value, LedgerError> {
    let mut body = params;
    body.as_object_mut()
        .ok_or_else(|| LedgerError::InvalidResponse("params must be a JSON object".into()))?
        .insert("action".to_string(), json!(action));
    Ok(body)
}

fn unwrap_result(json: Value) -> Result<Value, LedgerError> {
    if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
        return Err(LedgerError::Node(err.to_string()));
    }
    Ok(json.get("result").cloned().unwrap_or(json))
}

fn parse_submit_result(result: Value) -> Result<SubmitStatus, LedgerError> {
    let parsed: SubmitResult = serde_json::from_value(result)
        .map_err(|e| LedgerError::InvalidResponse(format!("submit_commitment: {e}")))?;
    Ok(parsed.status)
}

fn parse_proof_result(result: Value) -> Result<Option<InclusionProof>, LedgerError> {
    let parsed: ProofResult = serde_json::from_value(result)
        .map_err(|e| LedgerError::InvalidResponse(format!("get_inclusion_proof: {e}")))?;
    Ok(parsed.inclusion_proof)
}
