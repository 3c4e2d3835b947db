use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by bearer tokens issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // external identity
    pub exp: i64,    // expiration time
    pub iat: i64,    // issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Claims {
    pub fn new(subject: String, expiration_minutes: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::minutes(expiration_minutes);

        Self {
            sub: subject,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            email: None,
        }
    }
}

pub fn create_access_token(
    subject: &str,
    secret: &str,
    expiration_minutes: i64,
) -> anyhow::Result<String> {
    let claims = Claims::new(subject.to_string(), expiration_minutes);
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn verify_access_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let validation = Validation::default();
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;

    if token_data.claims.sub.trim().is_empty() {
        anyhow::bail!("token subject is empty");
    }

    Ok(token_data.claims)
}
