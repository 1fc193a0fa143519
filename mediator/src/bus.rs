//! 总线（Bus）
//!
//! 唯一的分发入口：校验意图 → 解析处理器 → 在插件流水线中执行 → 按意图种类返回结果。
//! 阻塞式变体见 [`BlockingBus`](crate::blocking::BlockingBus)，两者共用同一条流水线。
//!
use crate::{
    blocking::BlockingBus,
    context::{DispatchContext, DispatchScope},
    error::BusResult,
    intent::{self, Command, Intent, IntentKind, Query},
    pipeline::{BeforeFailure, Pipeline},
    plugin::Plugin,
    registry::HandlerRegistry,
};
use bon::Builder;
use std::sync::Arc;
use tracing::Instrument;

// 导入由 bon::Builder 生成的 typestate 模块与状态转换别名
use self::bus_builder::{IsUnset, SetPipeline, State as BuilderState};

/// 总线配置
#[derive(Clone, Copy, Debug, Default)]
pub struct BusConfig {
    /// before 钩子失败时是否补偿已成功的插件
    pub before_failure: BeforeFailure,
}

/// 异步总线：`handle` 与每个钩子都是挂起点
///
/// ```rust,ignore
/// let bus = Bus::builder()
///     .registry(registry)
///     .plugins(vec![Arc::new(LockingPlugin::new()), Arc::new(LoggingPlugin::new())])
///     .build();
/// ```
#[derive(Builder, Clone, Debug)]
#[builder(finish_fn(name = build_unconfigured, vis = ""))]
pub struct Bus {
    registry: Arc<HandlerRegistry>,
    #[builder(default, setters(vis = "pub(crate)"))]
    pipeline: Pipeline,
    #[builder(default)]
    config: BusConfig,
}

impl<S: BuilderState> BusBuilder<S> {
    /// 设置插件序列；此处的顺序即 before 的执行顺序，构造后不可再变
    pub fn plugins(self, plugins: Vec<Arc<dyn Plugin>>) -> BusBuilder<SetPipeline<S>>
    where
        <S as BuilderState>::Pipeline: IsUnset,
    {
        self.pipeline(Pipeline::new(plugins))
    }
}

impl<S: bus_builder::IsComplete> BusBuilder<S> {
    pub fn build(self) -> Bus {
        let mut bus = self.build_unconfigured();
        let pipeline = std::mem::take(&mut bus.pipeline);
        bus.pipeline = pipeline.with_before_failure(bus.config.before_failure);
        bus
    }
}

impl Bus {
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn config(&self) -> BusConfig {
        self.config
    }

    pub fn into_blocking(self) -> BlockingBus {
        BlockingBus::new(self)
    }

    /// 分发意图：查询返回 `Some(结果)`，命令总是返回 `None`（即便处理器产出了值）
    pub async fn handle<I: Intent>(
        &self,
        ctx: &DispatchContext,
        intent: I,
    ) -> BusResult<Option<I::Output>> {
        let output = self.dispatch(ctx, intent, None).await?;
        Ok(I::KIND.returns_value().then_some(output))
    }

    /// 执行命令
    pub async fn execute<C: Command>(&self, ctx: &DispatchContext, cmd: C) -> BusResult<()> {
        self.dispatch(ctx, cmd, Some(IntentKind::Command)).await?;
        Ok(())
    }

    /// 执行查询并返回处理器结果
    pub async fn ask<Q: Query>(&self, ctx: &DispatchContext, query: Q) -> BusResult<Q::Output> {
        self.dispatch(ctx, query, Some(IntentKind::Query)).await
    }

    async fn dispatch<I: Intent>(
        &self,
        ctx: &DispatchContext,
        intent: I,
        expected: Option<IntentKind>,
    ) -> BusResult<I::Output> {
        intent::validate::<I>(expected)?;
        let handler = self.registry.resolve::<I>()?;

        let scope = DispatchScope::new(ctx);
        let span = tracing::info_span!(
            "dispatch",
            intent = I::NAME,
            kind = %I::KIND,
            dispatch_id = %scope.dispatch_id(),
            execution_id = %ctx.execution_id(),
        );

        self.pipeline
            .run(&scope, &intent, || handler.handle(ctx, &intent))
            .instrument(span)
            .await
    }
}
