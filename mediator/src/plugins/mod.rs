//! 标准插件（plugins）
//!
//! 仅基于 [`Plugin`](crate::plugin::Plugin) 协议实现的横切关注点：
//! - `LockingPlugin`：同一调用链上的重入保护；
//! - `TransactionPlugin`：begin / commit / rollback 事务包裹；
//! - `TimingPlugin`：成功分发的耗时统计；
//! - `LoggingPlugin`：前后追踪日志。
//!
//! 注册顺序决定包裹关系：先注册者 before 先执行、after 后执行。
//!
pub mod locking;
pub mod logging;
pub mod timing;
pub mod transaction;

pub use locking::{LockScope, LockingPlugin};
pub use logging::LoggingPlugin;
pub use timing::{DurationRecorder, TimingPlugin};
pub use transaction::{TransactionPlugin, TransactionalResource};
