use crate::{
    context::DispatchScope,
    error::BusResult,
    intent::AnyIntent,
    plugin::Plugin,
};
use async_trait::async_trait;

/// 日志插件：只产生追踪记录，从不失败
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingPlugin;

impl LoggingPlugin {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for LoggingPlugin {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn before_handle(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        tracing::debug!(
            dispatch_id = %scope.dispatch_id(),
            kind = %intent.kind(),
            intent = ?intent,
            "about to handle {}",
            intent.name()
        );
        Ok(())
    }

    async fn after_handle(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        tracing::debug!(
            dispatch_id = %scope.dispatch_id(),
            intent = ?intent,
            "{} handled",
            intent.name()
        );
        Ok(())
    }

    async fn handle_failed(&self, scope: &DispatchScope<'_>) -> BusResult<()> {
        tracing::warn!(dispatch_id = %scope.dispatch_id(), "handler failed");
        Ok(())
    }
}
