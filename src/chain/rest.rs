//! LCD REST client for contract smart queries and bank balances

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use super::traits::{BalanceProvider, QuoteSimulator, WalletBalances};
use crate::common::errors::{Result, TraderError};

/// REST client against the chain's LCD API
#[derive(Debug, Clone)]
pub struct ChainRestClient {
    /// HTTP client
    client: Client,
    /// LCD base URL
    base_url: String,
    /// Pool contract address for smart queries
    pool_contract: String,
    /// Base asset denom
    base_denom: String,
    /// Quote asset denom
    quote_denom: String,
}

/// Swap simulation smart-query message
#[derive(Debug, Clone, Serialize)]
struct SimulationQuery<'a> {
    simulation: SimulationBody<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct SimulationBody<'a> {
    offer_asset: OfferAsset<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct OfferAsset<'a> {
    amount: String,
    info: AssetInfo<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct AssetInfo<'a> {
    native_token: NativeToken<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct NativeToken<'a> {
    denom: &'a str,
}

/// Envelope returned by the LCD smart-query endpoint
#[derive(Debug, Clone, Deserialize)]
struct SmartQueryResponse<T> {
    data: T,
}

/// Simulation result as returned by the pool contract
#[derive(Debug, Clone, Deserialize)]
struct SimulationResponse {
    #[serde(alias = "returnAmount")]
    return_amount: String,
}

/// Response from the bank balances endpoint
#[derive(Debug, Clone, Deserialize)]
struct BalancesResponse {
    #[serde(default)]
    balances: Vec<Coin>,
}

#[derive(Debug, Clone, Deserialize)]
struct Coin {
    denom: String,
    amount: String,
}

impl ChainRestClient {
    /// Create a new LCD client with the default timeout
    pub fn new(
        base_url: &str,
        pool_contract: &str,
        base_denom: &str,
        quote_denom: &str,
    ) -> Result<Self> {
        Self::with_timeout(
            base_url,
            pool_contract,
            base_denom,
            quote_denom,
            Duration::from_secs(30),
        )
    }

    /// Create a new LCD client with a custom timeout
    pub fn with_timeout(
        base_url: &str,
        pool_contract: &str,
        base_denom: &str,
        quote_denom: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TraderError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            pool_contract: pool_contract.to_string(),
            base_denom: base_denom.to_string(),
            quote_denom: quote_denom.to_string(),
        })
    }

    /// Run a contract smart query and deserialize the `data` payload
    async fn smart_query<Q: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        query: &Q,
    ) -> Result<T> {
        let encoded = BASE64.encode(serde_json::to_vec(query)?);
        let url = format!(
            "{}/cosmwasm/wasm/v1/contract/{}/smart/{}",
            self.base_url, self.pool_contract, encoded
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(TraderError::InvalidResponse(format!(
                "Smart query returned status: {}",
                response.status()
            )));
        }

        let envelope: SmartQueryResponse<T> = response.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl QuoteSimulator for ChainRestClient {
    #[instrument(skip(self))]
    async fn simulate(&self, offer_denom: &str, offer_amount: u128) -> Result<u128> {
        let query = SimulationQuery {
            simulation: SimulationBody {
                offer_asset: OfferAsset {
                    amount: offer_amount.to_string(),
                    info: AssetInfo {
                        native_token: NativeToken { denom: offer_denom },
                    },
                },
            },
        };

        let response: SimulationResponse = self
            .smart_query(&query)
            .await
            .map_err(|e| TraderError::Simulation(e.to_string()))?;
        response
            .return_amount
            .parse()
            .map_err(|e| TraderError::Simulation(format!("bad return_amount: {}", e)))
    }
}

#[async_trait]
impl BalanceProvider for ChainRestClient {
    #[instrument(skip(self))]
    async fn balances(&self, address: &str) -> Result<WalletBalances> {
        let url = format!(
            "{}/cosmos/bank/v1beta1/balances/{}",
            self.base_url, address
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(TraderError::InvalidResponse(format!(
                "Balance query returned status: {}",
                response.status()
            )));
        }

        let body: BalancesResponse = response.json().await?;
        let amount_of = |denom: &str| -> u128 {
            body.balances
                .iter()
                .find(|coin| coin.denom == denom)
                .and_then(|coin| coin.amount.parse().ok())
                .unwrap_or(0)
        };

        let found = body
            .balances
            .iter()
            .any(|coin| coin.denom == self.base_denom || coin.denom == self.quote_denom);
        if !found {
            return Err(TraderError::InvalidResponse(
                "wallet holds neither traded denom".to_string(),
            ));
        }

        let balances = WalletBalances {
            base: amount_of(&self.base_denom),
            quote: amount_of(&self.quote_denom),
        };
        debug!(
            "Wallet {} balances: base={} quote={}",
            address, balances.base, balances.quote
        );
        Ok(balances)
    }
}
