//! Token Codec：签发与校验 HS256 Bearer 令牌
//!
//! 载荷字段沿用旧客户端约定：user_id、username、iat、exp（Unix 秒）。
//! 签名由 jsonwebtoken 校验；过期判断由本模块自己做（now >= exp 即过期，不留 leeway），
//! 因此签名错误总是先于过期被报告为 Malformed。

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::core::{AuthFailure, TokenError};

/// 令牌载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn identity(&self) -> Identity {
        Identity {
            subject_id: self.user_id.clone(),
            display_name: self.username.clone(),
        }
    }
}

/// 签发结果：编码后的字符串与其载荷
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// 进程级签名密钥，启动时构造一次；更换密钥即令所有已签发令牌失效
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 过期由 verify_at 判断
        validation.validate_exp = false;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(
        &self,
        subject_id: &str,
        display_name: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject_id, display_name, ttl, Utc::now())
    }

    /// 以给定时刻签发；相同输入得到相同载荷。ttl 必须为正且 now + ttl 不溢出
    pub fn issue_at(
        &self,
        subject_id: &str,
        display_name: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        if ttl <= Duration::zero() {
            return Err(TokenError::InvalidLifetime(format!(
                "{}s is not positive",
                ttl.num_seconds()
            )));
        }
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            TokenError::InvalidLifetime(format!(
                "{}s overflows the expiry timestamp",
                ttl.num_seconds()
            ))
        })?;
        let claims = TokenClaims {
            user_id: subject_id.to_string(),
            username: display_name.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, claims })
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthFailure> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthFailure> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthFailure::Malformed
        })?;
        let claims = data.claims;
        if claims.user_id.trim().is_empty() {
            return Err(AuthFailure::Malformed);
        }
        if now.timestamp() >= claims.exp {
            return Err(AuthFailure::Expired);
        }
        Ok(claims.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-for-token-codec";

    fn codec() -> TokenCodec {
        TokenCodec::from_secret(SECRET)
    }

    #[test]
    fn test_round_trip_identity() {
        let codec = codec();
        let issued = codec.issue("u-1", "alice", Duration::hours(24)).unwrap();
        let identity = codec.verify(&issued.token).unwrap();
        assert_eq!(identity.subject_id, "u-1");
        assert_eq!(identity.display_name, "alice");
    }

    #[test]
    fn test_expired_token() {
        let codec = codec();
        let issued_at = Utc::now() - Duration::hours(2);
        let issued = codec
            .issue_at("u-1", "alice", Duration::hours(1), issued_at)
            .unwrap();
        assert_eq!(codec.verify(&issued.token), Err(AuthFailure::Expired));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let codec = codec();
        let now = Utc::now();
        let issued = codec.issue_at("u-1", "alice", Duration::seconds(60), now).unwrap();
        let at_expiry = DateTime::from_timestamp(issued.claims.exp, 0).unwrap();
        assert_eq!(codec.verify_at(&issued.token, at_expiry), Err(AuthFailure::Expired));
        let just_before = at_expiry - Duration::seconds(1);
        assert!(codec.verify_at(&issued.token, just_before).is_ok());
    }

    #[test]
    fn test_foreign_secret_is_malformed() {
        let other = TokenCodec::from_secret(b"another-secret");
        let issued = other.issue("u-1", "alice", Duration::hours(1)).unwrap();
        assert_eq!(codec().verify(&issued.token), Err(AuthFailure::Malformed));
    }

    #[test]
    fn test_foreign_secret_and_expired_is_malformed() {
        let other = TokenCodec::from_secret(b"another-secret");
        let issued = other
            .issue_at("u-1", "alice", Duration::hours(1), Utc::now() - Duration::hours(5))
            .unwrap();
        assert_eq!(codec().verify(&issued.token), Err(AuthFailure::Malformed));
    }

    #[test]
    fn test_corrupted_tokens_are_malformed() {
        let codec = codec();
        let issued = codec.issue("u-1", "alice", Duration::hours(1)).unwrap();
        // 改写载荷段首字符
        let tampered = issued.token.replacen(".eyJ", ".fyJ", 1);
        assert_ne!(tampered, issued.token);

        for token in ["", "not-a-token", "a.b.c", tampered.as_str()] {
            assert_eq!(codec.verify(token), Err(AuthFailure::Malformed), "token: {token}");
        }
    }

    #[test]
    fn test_empty_subject_is_malformed() {
        let codec = codec();
        let issued = codec.issue("  ", "ghost", Duration::hours(1)).unwrap();
        assert_eq!(codec.verify(&issued.token), Err(AuthFailure::Malformed));
    }

    #[test]
    fn test_non_positive_lifetime_is_rejected() {
        let codec = codec();
        for ttl in [Duration::zero(), Duration::hours(-5)] {
            assert!(matches!(
                codec.issue("u-1", "alice", ttl),
                Err(TokenError::InvalidLifetime(_))
            ));
        }
    }

    #[test]
    fn test_overflowing_lifetime_is_rejected() {
        let codec = codec();
        // 一百万年，超出 DateTime 上限
        let ttl = Duration::try_days(365_000_000).unwrap();
        assert!(matches!(
            codec.issue("u-1", "alice", ttl),
            Err(TokenError::InvalidLifetime(_))
        ));
    }

    #[test]
    fn test_same_instant_same_claims() {
        let codec = codec();
        let now = Utc::now();
        let a = codec.issue_at("u-1", "alice", Duration::hours(24), now).unwrap();
        let b = codec.issue_at("u-1", "alice", Duration::hours(24), now).unwrap();
        assert_eq!(a.claims, b.claims);
        assert_eq!(codec.verify(&a.token).unwrap(), codec.verify(&b.token).unwrap());
    }
}
