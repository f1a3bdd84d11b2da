//! Google OIDC client implementation using the openidconnect crate.
//!
//! The exchange produces a [`VerifiedIdentity`] for the lifecycle
//! controller: verified email, display name, avatar, and the Google
//! Workspace `hd` (hosted domain) claim when the account belongs to a
//! workspace.

use openidconnect::core::{CoreAuthenticationFlow, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse,
};
use trailhead_access::VerifiedIdentity;

use crate::config::GoogleOidcConfig;

/// OIDC client for authenticating users against Google.
pub struct GoogleOidcClient {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    scopes: Vec<String>,
}

/// Data needed to complete the OIDC callback.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
    pub nonce: String,
}

impl GoogleOidcClient {
    /// Creates a new OIDC client by discovering the provider metadata.
    pub async fn discover(config: &GoogleOidcConfig) -> Result<Self, OidcError> {
        let issuer_url = IssuerUrl::new(config.issuer_url.clone())
            .map_err(|e| OidcError::Configuration(format!("invalid issuer URL: {}", e)))?;

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                OidcError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| OidcError::Discovery(format!("failed to discover provider: {}", e)))?;

        let redirect_url = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|e| OidcError::Configuration(format!("invalid redirect URI: {}", e)))?;

        Ok(Self {
            provider_metadata,
            client_id: ClientId::new(config.client_id.clone()),
            client_secret: ClientSecret::new(config.client_secret.clone()),
            redirect_url,
            scopes: config.scopes().iter().map(|s| (*s).to_string()).collect(),
        })
    }

    /// Generates the authorization URL for redirecting the user.
    pub fn authorization_url(&self) -> (String, AuthState) {
        use openidconnect::core::CoreClient;

        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        // Add configured scopes
        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: nonce.secret().clone(),
        };

        (auth_url.to_string(), state)
    }

    /// Exchanges the authorization code and extracts the verified identity.
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<VerifiedIdentity, OidcError> {
        use openidconnect::core::CoreClient;

        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let pkce_verifier = PkceCodeVerifier::new(state.pkce_verifier.clone());

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                OidcError::TokenExchange(format!("failed to create HTTP client: {}", e))
            })?;

        let token_request = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| OidcError::TokenExchange(format!("token endpoint error: {}", e)))?;

        let token_response = token_request
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http_client)
            .await
            .map_err(|e| OidcError::TokenExchange(format!("token exchange failed: {}", e)))?;

        // Extract the ID token
        let id_token = token_response
            .id_token()
            .ok_or_else(|| OidcError::TokenExchange("no ID token in response".to_string()))?;

        // Verify and extract claims
        let nonce = Nonce::new(state.nonce.clone());
        let claims = id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| {
                OidcError::TokenValidation(format!("ID token validation failed: {}", e))
            })?;

        // The email claim is required: without it there is nothing to key
        // the account on.
        let email = claims
            .email()
            .map(|e| e.as_str().to_string())
            .ok_or_else(|| OidcError::MissingClaim {
                claim: "email".to_string(),
            })?;

        let display_name: Option<String> = claims
            .name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string())
            .or_else(|| claims.preferred_username().map(|u| u.as_str().to_string()));

        let avatar_url: Option<String> = claims
            .picture()
            .and_then(|p| p.get(None))
            .map(|p| p.as_str().to_string());

        // The hosted-domain claim is Google-specific and not part of the
        // standard claim set, so it is read from the raw JWT payload.
        let hosted_domain = extract_raw_string_claim(&token_response, "hd")?;

        Ok(VerifiedIdentity {
            email,
            display_name,
            avatar_url,
            hosted_domain,
        })
    }
}

/// Extracts a top-level string claim from the raw ID token in a token
/// response.
///
/// The verified claim set only exposes standard claims; provider-specific
/// claims such as Google's `hd` require parsing the raw JWT payload.
fn extract_raw_string_claim<TR>(
    token_response: &TR,
    claim: &str,
) -> Result<Option<String>, OidcError>
where
    TR: serde::Serialize,
{
    // Get the id_token from the response by serializing to JSON
    let response_json = serde_json::to_value(token_response).map_err(|e| {
        OidcError::TokenValidation(format!("Failed to serialize token response: {}", e))
    })?;

    let id_token_str = response_json
        .get("id_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| OidcError::TokenValidation("No id_token in response".to_string()))?;

    // JWT is base64url(header).base64url(payload).signature
    let parts: Vec<&str> = id_token_str.split('.').collect();
    if parts.len() != 3 {
        return Err(OidcError::TokenValidation("Invalid JWT format".to_string()));
    }

    // Decode the payload (second part)
    use base64::Engine;
    let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| OidcError::TokenValidation(format!("Failed to decode JWT payload: {}", e)))?;

    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes)
        .map_err(|e| OidcError::TokenValidation(format!("Failed to parse JWT payload: {}", e)))?;

    Ok(payload
        .get(claim)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string()))
}

/// OIDC-related errors.
#[derive(Debug)]
pub enum OidcError {
    /// Configuration error (invalid URLs, etc.)
    Configuration(String),
    /// Failed to discover provider metadata.
    Discovery(String),
    /// Token exchange failed.
    TokenExchange(String),
    /// Token validation failed.
    TokenValidation(String),
    /// A required claim was missing from the ID token.
    MissingClaim { claim: String },
}

impl std::fmt::Display for OidcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "OIDC configuration error: {}", msg),
            Self::Discovery(msg) => write!(f, "OIDC discovery error: {}", msg),
            Self::TokenExchange(msg) => write!(f, "OIDC token exchange error: {}", msg),
            Self::TokenValidation(msg) => write!(f, "OIDC token validation error: {}", msg),
            Self::MissingClaim { claim } => write!(f, "missing required claim: {}", claim),
        }
    }
}

impl std::error::Error for OidcError {}
