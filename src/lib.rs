//! Scrum Planner - 规划服务的请求编排层
//!
//! 模块划分：
//! - **app**: 由配置与协作方装配 AppState
//! - **auth**: Token Codec（HS256 Bearer 令牌）与 Auth Gate 中间件
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、流程阶段、规划编排与响应组装
//! - **integrations**: 看板发布集成与失败隔离
//! - **observability**: 日志初始化
//! - **planning**: 请求校验、管线调用、标题提取
//! - **store**: User Store 接口与进程内实现
//! - **web**: axum 路由与 handler

pub mod app;
pub mod auth;
pub mod config;
pub mod core;
pub mod integrations;
pub mod observability;
pub mod planning;
pub mod store;
pub mod web;

pub use app::{build_state, Collaborators};
pub use web::create_router;
