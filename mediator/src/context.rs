use bon::Builder;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use uuid::Uuid;

/// 分发上下文（Dispatch Context）
///
/// 显式随调用传递的调用链上下文，取代隐式的“上下文局部变量”：
/// - `execution_id`：调用链标识，同一条调用链上的嵌套分发共享它，
///   加锁插件以此判定重入；
/// - 关联追踪 `correlation_id`、因果链 `causation_id`、执行者类型/ID 等审计信息。
///
/// 典型用法：
/// ```rust
/// use mediator::context::DispatchContext;
///
/// let ctx = DispatchContext::builder()
///     .correlation_id("cor-123".into())
///     .actor_type("user".into())
///     .actor_id("u-1".into())
///     .build();
///
/// // 派生一条独立的调用链（例如后台任务），不会与当前调用链互斥
/// let child = ctx.fork();
/// assert_ne!(child.execution_id(), ctx.execution_id());
/// assert_eq!(child.correlation_id(), Some("cor-123"));
/// ```
#[derive(Builder, Debug, Clone, Serialize, Deserialize)]
pub struct DispatchContext {
    /// 调用链ID
    #[builder(default = Uuid::new_v4())]
    execution_id: Uuid,
    /// 关联ID
    correlation_id: Option<String>,
    /// 因果ID
    causation_id: Option<String>,
    /// 主体类型（如用户、系统等）
    actor_type: Option<String>,
    /// 主体ID
    actor_id: Option<String>,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DispatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn actor_type(&self) -> Option<&str> {
        self.actor_type.as_deref()
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    /// 派生新的调用链：沿用关联ID与执行者，因果ID指向当前调用链
    pub fn fork(&self) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            correlation_id: self.correlation_id.clone(),
            causation_id: Some(self.execution_id.to_string()),
            actor_type: self.actor_type.clone(),
            actor_id: self.actor_id.clone(),
        }
    }
}

type StashKey = (usize, TypeId);

/// 单次分发的视图，交给插件钩子使用
///
/// `dispatch_id` 对每次 `handle` 调用唯一。
/// 需要在 before/after/failed 之间传递的状态应通过 [`stash`](Self::stash) /
/// [`take`](Self::take) 挂在视图上：视图随分发结束而销毁，即使后续插件的
/// before 失败、本插件的 after/failed 都不会被调用，暂存的值也会一并释放。
pub struct DispatchScope<'a> {
    context: &'a DispatchContext,
    dispatch_id: Uuid,
    // (插件实例地址, 值类型) -> 暂存值
    stash: DashMap<StashKey, Box<dyn Any + Send + Sync>>,
}

impl<'a> DispatchScope<'a> {
    pub fn new(context: &'a DispatchContext) -> Self {
        Self {
            context,
            dispatch_id: Uuid::new_v4(),
            stash: DashMap::new(),
        }
    }

    pub fn context(&self) -> &'a DispatchContext {
        self.context
    }

    pub fn dispatch_id(&self) -> Uuid {
        self.dispatch_id
    }

    pub fn execution_id(&self) -> Uuid {
        self.context.execution_id
    }

    /// 为 `owner` 暂存本次分发内的值；同一 owner 同一类型的旧值被替换
    pub fn stash<O, V>(&self, owner: &O, value: V)
    where
        O: ?Sized,
        V: Send + Sync + 'static,
    {
        self.stash.insert(Self::key::<O, V>(owner), Box::new(value));
    }

    /// 取回 `owner` 暂存的值
    pub fn take<O, V>(&self, owner: &O) -> Option<V>
    where
        O: ?Sized,
        V: Send + Sync + 'static,
    {
        let (_, value) = self.stash.remove(&Self::key::<O, V>(owner))?;
        value.downcast::<V>().ok().map(|v| *v)
    }

    fn key<O: ?Sized, V: 'static>(owner: &O) -> StashKey {
        (owner as *const O as *const () as usize, TypeId::of::<V>())
    }
}

impl std::fmt::Debug for DispatchScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchScope")
            .field("context", self.context)
            .field("dispatch_id", &self.dispatch_id)
            .field("stashed", &self.stash.len())
            .finish()
    }
}
