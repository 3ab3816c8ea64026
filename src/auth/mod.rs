//! 鉴权：令牌编解码与请求拦截

pub mod gate;
pub mod token;

use serde::Serialize;

pub use gate::{bearer_token, require_identity, AuthGate};
pub use token::{IssuedToken, TokenClaims, TokenCodec};

/// 调用者身份，请求期间不可变；本层不做持久化
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject_id: String,
    pub display_name: String,
}
