use crate::{
    context::DispatchScope,
    error::{BusError, BusResult, HookPhase},
    intent::AnyIntent,
    plugin::Plugin,
};
use async_trait::async_trait;
use std::sync::Arc;

/// 事务性资源（例如数据库连接）
///
/// 三个操作均无返回值且可能失败，失败按普通钩子错误传播。
#[async_trait]
pub trait TransactionalResource: Send + Sync {
    async fn begin(&self) -> anyhow::Result<()>;

    async fn commit(&self) -> anyhow::Result<()>;

    async fn rollback(&self) -> anyhow::Result<()>;
}

/// 事务插件：before 开启事务，after 提交，handle_failed 回滚
///
/// 每次分发恰好发生一次提交或一次回滚。
pub struct TransactionPlugin {
    resource: Arc<dyn TransactionalResource>,
}

impl TransactionPlugin {
    pub fn new(resource: Arc<dyn TransactionalResource>) -> Self {
        Self { resource }
    }
}

#[async_trait]
impl Plugin for TransactionPlugin {
    fn name(&self) -> &'static str {
        "transaction"
    }

    async fn before_handle(&self, _scope: &DispatchScope<'_>, _intent: &dyn AnyIntent) -> BusResult<()> {
        self.resource
            .begin()
            .await
            .map_err(|e| BusError::hook(self.name(), HookPhase::Before, e))
    }

    async fn after_handle(&self, _scope: &DispatchScope<'_>, _intent: &dyn AnyIntent) -> BusResult<()> {
        self.resource
            .commit()
            .await
            .map_err(|e| BusError::hook(self.name(), HookPhase::After, e))
    }

    async fn handle_failed(&self, _scope: &DispatchScope<'_>) -> BusResult<()> {
        self.resource
            .rollback()
            .await
            .map_err(|e| BusError::hook(self.name(), HookPhase::Failed, e))
    }
}
