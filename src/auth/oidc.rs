use async_trait::async_trait;
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet, EndpointNotSet,
    EndpointSet, IssuerUrl, Nonce, RedirectUrl, Scope, TokenResponse,
};

use crate::auth::models::VerifiedIdentity;
use crate::config::AuthConfig;
use crate::error::AppError;

/// OIDC configuration, taken from the `auth` config section.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// The OIDC issuer URL (e.g., `https://accounts.google.com`).
    pub issuer_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// The redirect URI after OIDC login completes.
    pub redirect_uri: String,
}

impl OidcConfig {
    /// Returns `None` when sign-in is not configured.
    pub fn from_auth_config(auth: &AuthConfig) -> Option<Self> {
        Some(Self {
            issuer_url: auth.oidc_issuer_url.clone()?,
            client_id: auth.oidc_client_id.clone()?,
            client_secret: auth.oidc_client_secret.clone()?,
            redirect_uri: auth.oidc_redirect_uri.clone()?,
        })
    }
}

/// Everything needed to send the browser to the provider and check the callback later.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub csrf_state: String,
    pub nonce: String,
}

/// The external identity provider. The token exchange itself is delegated to it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorization_request(&self) -> AuthorizationRequest;

    /// Exchange an authorization code and return the verified email claim.
    async fn exchange_code(&self, code: &str, nonce: &str)
        -> Result<VerifiedIdentity, AppError>;
}

type DiscoveredClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// [`IdentityProvider`] backed by OpenID Connect discovery.
pub struct OidcIdentityProvider {
    client: DiscoveredClient,
    http_client: openidconnect::reqwest::Client,
}

impl OidcIdentityProvider {
    /// Discover the provider metadata and build the client.
    pub async fn discover(config: &OidcConfig) -> Result<Self, AppError> {
        let http_client = openidconnect::reqwest::ClientBuilder::new()
            // Following redirects opens the client up to SSRF.
            .redirect(openidconnect::reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        let issuer = IssuerUrl::new(config.issuer_url.clone())
            .map_err(|e| AppError::Config(format!("Invalid issuer URL: {e}")))?;
        let redirect = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|e| AppError::Config(format!("Invalid redirect URI: {e}")))?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer, &http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to discover OIDC provider: {e}")))?;

        let client = CoreClient::from_provider_metadata(
            provider_metadata,
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
        )
        .set_redirect_uri(redirect);

        Ok(Self {
            client,
            http_client,
        })
    }
}

#[async_trait]
impl IdentityProvider for OidcIdentityProvider {
    fn authorization_request(&self) -> AuthorizationRequest {
        let (url, csrf_token, nonce) = self
            .client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .add_extra_param("prompt", "consent")
            .url();

        AuthorizationRequest {
            url: url.to_string(),
            csrf_state: csrf_token.secret().clone(),
            nonce: nonce.secret().clone(),
        }
    }

    async fn exchange_code(
        &self,
        code: &str,
        nonce: &str,
    ) -> Result<VerifiedIdentity, AppError> {
        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| AppError::Internal(format!("Provider has no token endpoint: {e}")))?
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to exchange code: {e}")))?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| AppError::Auth("Provider did not return an ID token".into()))?;

        let verifier = self.client.id_token_verifier();
        let claims = id_token
            .claims(&verifier, &Nonce::new(nonce.to_string()))
            .map_err(|e| AppError::Auth(format!("Invalid ID token: {e}")))?;

        let email = claims
            .email()
            .map(|e| e.as_str().to_string())
            .ok_or_else(|| AppError::Auth("ID token carries no email".into()))?;
        let name = claims
            .name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string());

        Ok(VerifiedIdentity { email, name })
    }
}
