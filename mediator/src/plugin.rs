//! 插件（Plugin）协议
//!
//! 横切关注点以钩子的形式包裹处理器执行：
//! - `before_handle`：按注册顺序执行；
//! - `after_handle`：处理器成功后按注册逆序执行；
//! - `handle_failed`：处理器失败后按注册逆序执行，不携带意图，
//!   插件需要的上下文应在自己的 `before_handle` 中通过 `DispatchScope::stash` 暂存。
//!
//! 插件实例在总线构造时注册并被所有分发共享，内部状态必须并发安全。
//!
use crate::{
    context::DispatchScope,
    error::BusResult,
    handler::Blocking,
    intent::AnyIntent,
};
use async_trait::async_trait;

#[async_trait]
pub trait Plugin: Send + Sync {
    /// 插件名称（用于钩子错误与日志）
    fn name(&self) -> &'static str;

    async fn before_handle(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()>;

    async fn after_handle(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()>;

    async fn handle_failed(&self, scope: &DispatchScope<'_>) -> BusResult<()>;
}

/// 阻塞式插件，经 [`Blocking`] 适配后与异步插件共用同一条流水线
pub trait SyncPlugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn before_handle(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()>;

    fn after_handle(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()>;

    fn handle_failed(&self, scope: &DispatchScope<'_>) -> BusResult<()>;
}

#[async_trait]
impl<P> Plugin for Blocking<P>
where
    P: SyncPlugin,
{
    fn name(&self) -> &'static str {
        self.0.name()
    }

    async fn before_handle(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        self.0.before_handle(scope, intent)
    }

    async fn after_handle(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        self.0.after_handle(scope, intent)
    }

    async fn handle_failed(&self, scope: &DispatchScope<'_>) -> BusResult<()> {
        self.0.handle_failed(scope)
    }
}
