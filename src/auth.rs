use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, dangerous::insecure_decode, decode, errors::ErrorKind,
};

use crate::{config::GateConfig, error::TokenError, models::Claims};

/// TokenDecoder
///
/// Turns the raw session cookie value into `Claims`, or decides the visitor is
/// unauthenticated.
///
/// Two modes:
/// - **Structural** (default): the token must be a well-formed JWT whose payload
///   carries every `Claims` field. The signature is NOT checked; whoever issues the
///   cookie is trusted to have signed it.
/// - **Verified**: built with a shared secret, the HS256 signature must also match.
///
/// In both modes expiry is compared against the caller-supplied `now` with no leeway,
/// so evaluation stays a pure function of (token, now).
#[derive(Clone)]
pub struct TokenDecoder {
    mode: Mode,
}

#[derive(Clone)]
enum Mode {
    Structural,
    Verified {
        key: DecodingKey,
        validation: Validation,
    },
}

impl TokenDecoder {
    /// Structural-only decoding: format and expiry, no signature.
    pub fn structural() -> Self {
        Self {
            mode: Mode::Structural,
        }
    }

    /// Decoding that also verifies an HS256 signature made with `secret`.
    pub fn verified(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by hand against the injected clock.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        // Tokens minted for the site carry an audience we have no opinion on.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            mode: Mode::Verified {
                key: DecodingKey::from_secret(secret.as_bytes()),
                validation,
            },
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        match &config.jwt_secret {
            Some(secret) => Self::verified(secret),
            None => Self::structural(),
        }
    }

    pub fn verifies_signatures(&self) -> bool {
        matches!(self.mode, Mode::Verified { .. })
    }

    /// try_decode
    ///
    /// Full decode with the failure reason preserved. Only diagnostics care about the
    /// reason; the gate itself goes through `decode`.
    pub fn try_decode(&self, raw: Option<&str>, now: i64) -> Result<Claims, TokenError> {
        let token = raw
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(TokenError::Missing)?;

        let decoded = match &self.mode {
            Mode::Structural => insecure_decode::<Claims>(token),
            Mode::Verified { key, validation } => decode::<Claims>(token, key, validation),
        };
        let token_data = decoded.map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            // Bad base64, bad JSON, unknown algorithm, unknown role, missing claims...
            _ => TokenError::Malformed,
        })?;

        if !token_data.claims.is_live_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }

    /// decode
    ///
    /// Returns `Some(Claims)` only for a well-formed, unexpired (and, in verified mode,
    /// correctly signed) token. Missing, malformed and expired tokens all yield `None`.
    pub fn decode(&self, raw: Option<&str>, now: i64) -> Option<Claims> {
        match self.try_decode(raw, now) {
            Ok(claims) => Some(claims),
            Err(TokenError::Missing) => None,
            Err(reason) => {
                tracing::debug!(target: "edge_gate.auth", %reason, "Session token rejected");
                None
            }
        }
    }
}
