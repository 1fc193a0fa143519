use crate::{context::DispatchContext, intent::Intent};
use async_trait::async_trait;

/// 意图处理器：每种意图类型恰好对应一个处理器
///
/// 处理器只读取意图（`&I`），插件在处理完成后仍能观察到同一个意图。
#[async_trait]
pub trait Handler<I>: Send + Sync
where
    I: Intent,
{
    async fn handle(&self, ctx: &DispatchContext, intent: &I) -> anyhow::Result<I::Output>;
}

/// 阻塞式处理器，经 [`Blocking`] 适配后可注册到任意总线
pub trait SyncHandler<I>: Send + Sync
where
    I: Intent,
{
    fn handle(&self, ctx: &DispatchContext, intent: &I) -> anyhow::Result<I::Output>;
}

/// 把阻塞式实现（`SyncHandler` / `SyncPlugin`）适配为统一的异步契约
///
/// 适配后的 future 不会挂起，在阻塞式总线上等同于在调用线程上直接执行。
#[derive(Clone, Debug, Default)]
pub struct Blocking<T>(pub T);

impl<T> Blocking<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

#[async_trait]
impl<I, H> Handler<I> for Blocking<H>
where
    I: Intent,
    H: SyncHandler<I>,
{
    async fn handle(&self, ctx: &DispatchContext, intent: &I) -> anyhow::Result<I::Output> {
        self.0.handle(ctx, intent)
    }
}
