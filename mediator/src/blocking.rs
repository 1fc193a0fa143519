use crate::{
    bus::Bus,
    context::DispatchContext,
    error::BusResult,
    intent::{Command, Intent, Query},
};

/// 阻塞式总线
///
/// 与 [`Bus`] 共用同一条流水线与钩子顺序，区别仅在于 `handle` 及所有钩子
/// 都在调用线程上执行完毕后才返回。
/// 处理器内部可以再次通过同一个 `BlockingBus` 分发（嵌套调用同样在当前线程上完成）。
///
/// 不要在异步运行时的工作线程中调用，那里应直接使用 [`Bus`]。
#[derive(Clone, Debug)]
pub struct BlockingBus {
    inner: Bus,
}

impl BlockingBus {
    pub fn new(inner: Bus) -> Self {
        Self { inner }
    }

    pub fn as_async(&self) -> &Bus {
        &self.inner
    }

    pub fn into_inner(self) -> Bus {
        self.inner
    }

    pub fn handle<I: Intent>(&self, ctx: &DispatchContext, intent: I) -> BusResult<Option<I::Output>> {
        pollster::block_on(self.inner.handle(ctx, intent))
    }

    pub fn execute<C: Command>(&self, ctx: &DispatchContext, cmd: C) -> BusResult<()> {
        pollster::block_on(self.inner.execute(ctx, cmd))
    }

    pub fn ask<Q: Query>(&self, ctx: &DispatchContext, query: Q) -> BusResult<Q::Output> {
        pollster::block_on(self.inner.ask(ctx, query))
    }
}

impl From<Bus> for BlockingBus {
    fn from(inner: Bus) -> Self {
        Self::new(inner)
    }
}
