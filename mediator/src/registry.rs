use crate::{
    error::{BusError, BusResult, ResolutionError},
    handler::{Blocking, Handler, SyncHandler},
    intent::{Intent, IntentKind},
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

type HandlerFactory<I> = Arc<dyn Fn() -> Arc<dyn Handler<I>> + Send + Sync>;

struct Registration {
    name: &'static str,
    kind: IntentKind,
    // 实际类型为 HandlerFactory<I>，解析时按意图类型还原
    factory: Arc<dyn Any + Send + Sync>,
}

/// 处理器注册表（Handler Resolver）
/// - 以意图的 TypeId 为键，启动时显式注册，取代按命名约定的动态查找
/// - 每次解析通过工厂取得处理器：共享实例或每次新建
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<TypeId, Registration>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册共享的处理器实例
    pub fn register<I, H>(&self, handler: Arc<H>) -> BusResult<()>
    where
        I: Intent,
        H: Handler<I> + 'static,
    {
        let factory: HandlerFactory<I> = Arc::new(move || handler.clone() as Arc<dyn Handler<I>>);
        self.insert::<I>(factory)
    }

    /// 注册处理器工厂：每次分发都会取得一个新的处理器实例
    pub fn register_factory<I, H, F>(&self, make: F) -> BusResult<()>
    where
        I: Intent,
        H: Handler<I> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory: HandlerFactory<I> = Arc::new(move || Arc::new(make()) as Arc<dyn Handler<I>>);
        self.insert::<I>(factory)
    }

    /// 注册阻塞式处理器
    pub fn register_blocking<I, H>(&self, handler: H) -> BusResult<()>
    where
        I: Intent,
        H: SyncHandler<I> + 'static,
    {
        self.register::<I, _>(Arc::new(Blocking(handler)))
    }

    fn insert<I: Intent>(&self, factory: HandlerFactory<I>) -> BusResult<()> {
        match self.handlers.entry(TypeId::of::<I>()) {
            Entry::Occupied(_) => Err(BusError::AlreadyRegistered { intent: I::NAME }),
            Entry::Vacant(slot) => {
                slot.insert(Registration {
                    name: I::NAME,
                    kind: I::KIND,
                    factory: Arc::new(factory),
                });
                Ok(())
            }
        }
    }

    /// 解析意图对应的处理器
    pub fn resolve<I: Intent>(&self) -> Result<Arc<dyn Handler<I>>, ResolutionError> {
        let Some(factory) = self
            .handlers
            .get(&TypeId::of::<I>())
            .map(|r| r.factory.clone())
        else {
            return Err(ResolutionError::NotFound { intent: I::NAME });
        };

        match factory.downcast_ref::<HandlerFactory<I>>() {
            Some(make) => Ok(make()),
            None => Err(ResolutionError::ContractMismatch {
                intent: I::NAME,
                expected: type_name::<dyn Handler<I>>(),
            }),
        }
    }

    pub fn contains<I: Intent>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<I>())
    }

    /// 获取已注册的意图名称与种类（只读视图）
    pub fn registered(&self) -> Vec<(&'static str, IntentKind)> {
        let mut out: Vec<_> = self.handlers.iter().map(|e| (e.name, e.kind)).collect();
        out.sort_unstable_by_key(|(name, _)| *name);
        out
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("registered", &self.registered())
            .finish()
    }
}
