use crate::{
    context::{DispatchContext, DispatchScope},
    error::{BusError, BusResult},
    intent::AnyIntent,
    plugin::Plugin,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

/// 锁的作用域
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LockScope {
    /// 按调用链（`DispatchContext::execution_id`）加锁，不同调用链互不影响
    #[default]
    Context,
    /// 进程内唯一的一把锁
    Process,
}

/// 重入保护插件
///
/// 同一作用域内已有分发在执行时，新的分发在 `before_handle` 中以
/// [`BusError::Reentrancy`] 被拒绝；`after_handle` 与 `handle_failed` 都无条件释放。
///
/// 限制：锁跨分发存在，无法挂在 [`DispatchScope`] 上。默认的
/// [`BeforeFailure::Propagate`](crate::pipeline::BeforeFailure::Propagate) 下，
/// 排在本插件之后的插件在 before 阶段失败时锁不会被释放；
/// `LockScope::Process` 下此后所有分发都会被拒绝。
/// 与会失败的 before 钩子组合使用时应配置
/// [`BeforeFailure::Compensate`](crate::pipeline::BeforeFailure::Compensate)。
#[derive(Debug, Default)]
pub struct LockingPlugin {
    scope: LockScope,
    // 作用域键 -> 正在执行的意图名称
    running: DashMap<Uuid, &'static str>,
}

impl LockingPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(scope: LockScope) -> Self {
        Self {
            scope,
            running: DashMap::new(),
        }
    }

    pub fn scope(&self) -> LockScope {
        self.scope
    }

    /// 当前上下文是否持有锁，返回正在执行的意图名称
    pub fn is_locked(&self, ctx: &DispatchContext) -> Option<&'static str> {
        self.running.get(&self.key(ctx)).map(|r| *r)
    }

    fn key(&self, ctx: &DispatchContext) -> Uuid {
        match self.scope {
            LockScope::Context => ctx.execution_id(),
            LockScope::Process => Uuid::nil(),
        }
    }

    fn release(&self, scope: &DispatchScope<'_>) {
        if let Some((_, name)) = self.running.remove(&self.key(scope.context())) {
            tracing::trace!(intent = name, "lock released");
        }
    }
}

#[async_trait]
impl Plugin for LockingPlugin {
    fn name(&self) -> &'static str {
        "locking"
    }

    async fn before_handle(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        match self.running.entry(self.key(scope.context())) {
            Entry::Occupied(held) => Err(BusError::Reentrancy {
                running: *held.get(),
                attempted: intent.name(),
            }),
            Entry::Vacant(slot) => {
                tracing::trace!(intent = intent.name(), "lock acquired");
                slot.insert(intent.name());
                Ok(())
            }
        }
    }

    async fn after_handle(&self, scope: &DispatchScope<'_>, _intent: &dyn AnyIntent) -> BusResult<()> {
        self.release(scope);
        Ok(())
    }

    async fn handle_failed(&self, scope: &DispatchScope<'_>) -> BusResult<()> {
        self.release(scope);
        Ok(())
    }
}
