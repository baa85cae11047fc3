//! reqwest implementation of [`BridgeClient`].
//!
//! ## Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/api/v1/wallets` | Create wallet |
//! | GET    | `/api/v1/wallets/{id}/balance` | Wallet balance |
//! | POST   | `/api/v1/shield` | Build shield transaction |
//! | POST   | `/api/v1/unshield` | Build unshield transaction |
//! | POST   | `/api/v1/transfer` | Build private transfer |
//! | GET    | `/api/v1/merkle/{network}/root` | Current root |
//! | GET    | `/api/v1/merkle/{network}/proof/{commitment}` | Inclusion path |
//! | POST   | `/api/v1/merkle/{network}/rescan` | Re-index the tree |
//! | GET    | `/health` | Liveness |
//!
//! No retries: the caller owns retry policy.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use spool_core::Commitment;

use crate::config::BridgeConfig;
use crate::envelope;
use crate::error::BridgeError;
use crate::types::{
    BridgeMerkleProof, BridgeMerkleRoot, BuiltTransaction, CreateWalletRequest, HealthStatus,
    ShieldRequest, TransactionPayload, TransferRequest, UnshieldRequest, Wallet, WalletBalance,
};
use crate::BridgeClient;

const API_PREFIX: &str = "/api/v1";

/// Bearer-authenticated JSON client for the bridge.
#[derive(Debug, Clone)]
pub struct HttpBridgeClient {
    http: reqwest::Client,
    root: String,
}

impl HttpBridgeClient {
    /// Create a client from configuration.
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                let mut auth = reqwest::header::HeaderValue::from_str(&format!(
                    "Bearer {}",
                    config.api_token.as_str()
                ))
                .map_err(|_| {
                    BridgeError::Config(spool_core::ConfigError::Invalid {
                        var: "SPOOL_BRIDGE_TOKEN".into(),
                        reason: "token is not a valid header value".into(),
                    })
                })?;
                auth.set_sensitive(true);
                headers.insert(reqwest::header::AUTHORIZATION, auth);
                headers
            })
            .build()
            .map_err(|e| BridgeError::Unavailable {
                endpoint: "client_init".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            root: config.root(),
        })
    }

    /// Create a shielded wallet. Not used by the tree or prover paths.
    pub async fn create_wallet(&self, req: &CreateWalletRequest) -> Result<Wallet, BridgeError> {
        self.post("POST /wallets", &format!("{API_PREFIX}/wallets"), req)
            .await
    }

    /// Shielded balances of a wallet. Not used by the tree or prover paths.
    pub async fn wallet_balance(&self, wallet_id: &str) -> Result<WalletBalance, BridgeError> {
        self.get(
            "GET /wallets/{id}/balance",
            &format!("{API_PREFIX}/wallets/{wallet_id}/balance"),
        )
        .await
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, path: &str) -> Result<T, BridgeError> {
        let body = self.send(endpoint, self.http.get(self.url(path))).await?;
        envelope::parse_data(endpoint, &body)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
        req: &B,
    ) -> Result<T, BridgeError> {
        let body = self
            .send(endpoint, self.http.post(self.url(path)).json(req))
            .await?;
        envelope::parse_data(endpoint, &body)
    }

    async fn build_transaction<B: Serialize>(
        &self,
        endpoint: &str,
        path: &str,
        req: &B,
    ) -> Result<TransactionPayload, BridgeError> {
        let built: BuiltTransaction = self.post(endpoint, path, req).await?;
        Ok(built.transaction)
    }

    /// Send and return the body of a 2xx response.
    async fn send(&self, endpoint: &str, req: reqwest::RequestBuilder) -> Result<String, BridgeError> {
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(endpoint, error = %e, "bridge request failed");
            BridgeError::Unavailable {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| BridgeError::Unavailable {
            endpoint: endpoint.to_string(),
            reason: format!("reading body: {e}"),
        })?;

        if !status.is_success() {
            let detail = envelope::error_message(&body).unwrap_or(body);
            tracing::warn!(endpoint, status = status.as_u16(), "bridge returned error status");
            return Err(BridgeError::Unavailable {
                endpoint: endpoint.to_string(),
                reason: format!("HTTP {}: {detail}", status.as_u16()),
            });
        }
        Ok(body)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.root)
    }
}

impl BridgeClient for HttpBridgeClient {
    async fn merkle_root(&self, network: &str) -> Result<BridgeMerkleRoot, BridgeError> {
        self.get(
            "GET /merkle/{network}/root",
            &format!("{API_PREFIX}/merkle/{network}/root"),
        )
        .await
    }

    async fn merkle_proof(
        &self,
        network: &str,
        commitment: &Commitment,
    ) -> Result<BridgeMerkleProof, BridgeError> {
        self.get(
            "GET /merkle/{network}/proof/{commitment}",
            &format!("{API_PREFIX}/merkle/{network}/proof/{}", commitment.canonical()),
        )
        .await
    }

    async fn rescan(&self, network: &str) -> Result<(), BridgeError> {
        let endpoint = "POST /merkle/{network}/rescan";
        let req = self
            .http
            .post(self.url(&format!("{API_PREFIX}/merkle/{network}/rescan")))
            .json(&serde_json::json!({}));
        let body = self.send(endpoint, req).await?;
        envelope::parse_ack(endpoint, &body)
    }

    async fn shield(&self, req: &ShieldRequest) -> Result<TransactionPayload, BridgeError> {
        self.build_transaction("POST /shield", &format!("{API_PREFIX}/shield"), req)
            .await
    }

    async fn unshield(&self, req: &UnshieldRequest) -> Result<TransactionPayload, BridgeError> {
        self.build_transaction("POST /unshield", &format!("{API_PREFIX}/unshield"), req)
            .await
    }

    async fn transfer(&self, req: &TransferRequest) -> Result<TransactionPayload, BridgeError> {
        self.build_transaction("POST /transfer", &format!("{API_PREFIX}/transfer"), req)
            .await
    }

    async fn health(&self) -> Result<HealthStatus, BridgeError> {
        let endpoint = "GET /health";
        let body = self.send(endpoint, self.http.get(self.url("/health"))).await?;
        // Some deployments answer /health outside the envelope.
        envelope::parse_data(endpoint, &body).or_else(|envelope_err| {
            serde_json::from_str::<HealthStatus>(&body)
                .ok()
                .filter(|h| !h.status.is_empty())
                .ok_or(envelope_err)
        })
    }
}
