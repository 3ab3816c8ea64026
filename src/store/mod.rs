//! User Store：用户记录的外部协作方接口
//!
//! 持久化与密码存储不属于编排层；这里只定义接口，并附带一个进程内实现供单机部署与测试使用。

pub mod memory;

use async_trait::async_trait;

use crate::auth::Identity;
use crate::core::StoreError;

pub use memory::InMemoryUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_subject_id(&self, subject_id: &str) -> Result<Option<Identity>, StoreError>;

    /// 登录用；邮箱或密码不匹配都返回 None
    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, StoreError>;

    /// 邮箱或用户名已存在时返回 StoreError::Conflict
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, StoreError>;
}
