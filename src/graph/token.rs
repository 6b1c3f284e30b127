use storypost_api_types::TokenExchangeResponse;
use tracing::info;

use super::client::GraphClient;
use super::error::GraphError;
use crate::domain::{Credential, LongLivedToken};

const GRANT_TYPE: &str = "fb_exchange_token";

/// Operator-supplied inputs for a token exchange.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    pub app_id: String,
    pub app_secret: Credential,
    pub short_lived_token: Credential,
}

impl GraphClient {
    /// Swap a short-lived user token for a long-lived one. Never retried.
    pub async fn exchange_token(
        &self,
        exchange: &TokenExchange,
    ) -> Result<LongLivedToken, GraphError> {
        let url = self.url(
            &["oauth", "access_token"],
            &[
                ("grant_type", GRANT_TYPE),
                ("client_id", exchange.app_id.as_str()),
                ("client_secret", exchange.app_secret.expose()),
                ("fb_exchange_token", exchange.short_lived_token.expose()),
            ],
        )?;

        let response: TokenExchangeResponse = self.get_json(url).await?;
        let access_token =
            Credential::new(&response.access_token).ok_or_else(|| GraphError::UnexpectedBody {
                body: "token exchange returned an empty access_token".to_string(),
            })?;

        info!(
            expires_in = ?response.expires_in,
            "exchanged short-lived token"
        );
        Ok(LongLivedToken {
            access_token,
            expires_in: response.expires_in,
        })
    }
}
