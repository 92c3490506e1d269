//! Identity provider adapters used by the session probes.
//!
//! The login callbacks that populate sessions live outside this crate; here
//! we only re-check what they stored.

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::config::OpenidConnectConfig;

/// Re-validates an identity token stored in a session.
///
/// Implementations must never fail loudly: malformed or unverifiable tokens
/// are simply invalid.
pub trait TokenValidator: Send + Sync {
    fn validate_token(&self, token: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[allow(dead_code)]
    sub: String,
}

const HMAC_ALGORITHMS: &[Algorithm] = &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];
const EC_ALGORITHMS: &[Algorithm] = &[Algorithm::ES256, Algorithm::ES384];

/// Decoding key and the algorithms it may verify. Fixed by the configured
/// key, never by the token header.
#[derive(Clone)]
struct VerificationKey {
    key: DecodingKey,
    algorithms: &'static [Algorithm],
}

impl VerificationKey {
    /// PEM material is an RSA or EC public key; anything else is an HMAC secret.
    fn from_config(raw: &str) -> Result<Self, anyhow::Error> {
        if raw.is_empty() {
            return Err(anyhow::anyhow!("No id token verification key configured"));
        }

        if !raw.trim_start().starts_with("-----BEGIN") {
            return Ok(Self {
                key: DecodingKey::from_secret(raw.as_bytes()),
                algorithms: HMAC_ALGORITHMS,
            });
        }

        if let Ok(key) = DecodingKey::from_rsa_pem(raw.as_bytes()) {
            return Ok(Self {
                key,
                algorithms: RSA_ALGORITHMS,
            });
        }

        let key = DecodingKey::from_ec_pem(raw.as_bytes())
            .map_err(|e| anyhow::anyhow!("Verification key is neither RSA nor EC PEM: {}", e))?;
        Ok(Self {
            key,
            algorithms: EC_ALGORITHMS,
        })
    }
}

/// Verifies OpenID Connect id tokens against the configured issuer,
/// client id (audience) and verification key.
#[derive(Clone)]
pub struct OidcTokenValidator {
    issuer: String,
    client_id: String,
    verification_key: Option<VerificationKey>,
}

impl OidcTokenValidator {
    pub fn new(config: &OpenidConnectConfig) -> Self {
        let verification_key = match VerificationKey::from_config(&config.verification_key) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(error = %e, "OpenID Connect id tokens will be rejected");
                None
            }
        };

        Self {
            issuer: config.issuer.clone(),
            client_id: config.client_id.clone(),
            verification_key,
        }
    }

    fn verify(&self, token: &str) -> Result<(), anyhow::Error> {
        let verification_key = self
            .verification_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No usable id token verification key"))?;

        let header = decode_header(token)?;
        if !verification_key.algorithms.contains(&header.alg) {
            return Err(anyhow::anyhow!(
                "Id token algorithm {:?} does not match the configured key",
                header.alg
            ));
        }

        let mut validation = Validation::new(header.alg);
        validation.algorithms = verification_key.algorithms.to_vec();
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.client_id.as_str()]);

        decode::<IdTokenClaims>(token, &verification_key.key, &validation)?;
        Ok(())
    }
}

impl TokenValidator for OidcTokenValidator {
    fn validate_token(&self, token: &str) -> bool {
        match self.verify(token) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Stored OpenID Connect id token rejected");
                false
            }
        }
    }
}

/// Validator with a fixed answer, for deployments without OpenID Connect
/// and for tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticTokenValidator(pub bool);

impl TokenValidator for StaticTokenValidator {
    fn validate_token(&self, _token: &str) -> bool {
        self.0
    }
}
