//! 外部集成：看板发布（可选副作用）及其失败隔离

pub mod isolator;
pub mod publisher;

pub use isolator::{SideEffectIsolator, SideEffectOutcome};
pub use publisher::{BoardPublisher, BoardReference, HttpBoardPublisher};
