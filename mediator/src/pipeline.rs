//! 插件流水线（Pipeline）
//!
//! 以固定的注册顺序 `[P1, .., Pn]` 编排钩子，在不嵌套调用栈的前提下模拟“洋葱”包裹：
//! 1. before：P1..Pn 顺序执行，任一失败立即返回，跳过后续钩子与处理器；
//! 2. 处理器恰好执行一次；
//! 3. 成功：after 按 Pn..P1 逆序执行；
//! 4. 失败：handle_failed 按 Pn..P1 逆序执行，然后原样返回处理器错误。
//!
//! 处理器一旦执行，after 与 handle_failed 两组钩子恰好执行其一，且组内不跳过任何钩子。
//!
use crate::{
    context::DispatchScope,
    error::{BusError, BusResult},
    intent::AnyIntent,
    plugin::Plugin,
};
use std::future::Future;
use std::sync::Arc;

/// before 阶段失败时的处理策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BeforeFailure {
    /// 直接返回错误，不调用任何插件的 handle_failed
    #[default]
    Propagate,
    /// 对 before 已成功的插件按逆序调用 handle_failed（失败的插件本身不补偿）
    Compensate,
}

/// 不可变的插件序列，构造后顺序即执行顺序
#[derive(Clone, Default)]
pub struct Pipeline {
    plugins: Arc<[Arc<dyn Plugin>]>,
    before_failure: BeforeFailure,
}

impl Pipeline {
    pub fn new(plugins: Vec<Arc<dyn Plugin>>) -> Self {
        Self {
            plugins: plugins.into(),
            before_failure: BeforeFailure::default(),
        }
    }

    pub fn with_before_failure(mut self, policy: BeforeFailure) -> Self {
        self.before_failure = policy;
        self
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// 按注册顺序返回插件名称
    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// 在完整的钩子协议中执行一次处理器调用
    pub async fn run<T, F, Fut>(
        &self,
        scope: &DispatchScope<'_>,
        intent: &dyn AnyIntent,
        invoke: F,
    ) -> BusResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.before(scope, intent).await?;

        match invoke().await {
            Ok(output) => {
                self.after(scope, intent).await?;
                Ok(output)
            }
            Err(err) => {
                self.failure(scope).await;
                Err(BusError::from_handler(err))
            }
        }
    }

    async fn before(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        for (idx, plugin) in self.plugins.iter().enumerate() {
            if let Err(err) = plugin.before_handle(scope, intent).await {
                tracing::debug!(plugin = plugin.name(), error = %err, "before_handle failed");
                if self.before_failure == BeforeFailure::Compensate {
                    self.unwind_failed(&self.plugins[..idx], scope).await;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    async fn after(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        let mut first_err: Option<BusError> = None;

        for plugin in self.plugins.iter().rev() {
            if let Err(err) = plugin.after_handle(scope, intent).await {
                match first_err {
                    None => first_err = Some(err),
                    Some(_) => {
                        tracing::warn!(plugin = plugin.name(), error = %err, "after_handle failed");
                    }
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn failure(&self, scope: &DispatchScope<'_>) {
        self.unwind_failed(&self.plugins, scope).await;
    }

    // 逆序调用 handle_failed；钩子自身的错误只记录，不覆盖原始错误
    async fn unwind_failed(&self, plugins: &[Arc<dyn Plugin>], scope: &DispatchScope<'_>) {
        for plugin in plugins.iter().rev() {
            if let Err(err) = plugin.handle_failed(scope).await {
                tracing::warn!(plugin = plugin.name(), error = %err, "handle_failed failed");
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("plugins", &self.plugin_names())
            .field("before_failure", &self.before_failure)
            .finish()
    }
}
