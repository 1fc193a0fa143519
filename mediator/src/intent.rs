//! 意图模型（Intent）
//!
//! 调用方提交给总线的工作单元：
//! - `Command`：写意图，处理器的返回值不会交给调用方；
//! - `Query`：读意图，处理器的返回值原样返回给调用方。
//!
//! 意图的种类是类型上的静态属性（`Intent::KIND`），而不是调用方在运行时设置的标记。
//!
use crate::error::{BusError, BusResult};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::{self, Debug, Display};

/// 意图种类：是否需要把处理器的结果交还给调用方
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    /// 只执行，丢弃处理器返回值
    Command,
    /// 返回处理器结果
    Query,
}

impl IntentKind {
    pub fn returns_value(self) -> bool {
        matches!(self, IntentKind::Query)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntentKind::Command => "command",
            IntentKind::Query => "query",
        }
    }
}

impl Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 意图（命令或查询）
///
/// 关联常量：
/// - `NAME`：稳定名称，用于日志、错误与加锁状态。避免依赖 `type_name::<T>()`；
/// - `KIND`：意图种类，总线据此决定是否返回处理器结果。
///
/// 通常不手写实现，而是使用 `mediator-macros` 提供的 `#[command]` / `#[query]`。
pub trait Intent: Debug + Send + Sync + 'static {
    /// 意图的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    /// 意图种类
    const KIND: IntentKind;

    /// 处理器产出的值类型；对命令而言通常为 `()`，即便不是也会被总线丢弃
    type Output: Send + 'static;
}

/// 应用层命令（Command）
///
/// 表达“意图”的写操作请求，通常会修改状态，调用方只关心成功/失败。
/// 建议保持语义化的“动宾结构”命名，如 `Deposit`、`CloseOrder`。
pub trait Command: Intent {}

/// 应用层查询（Query）
///
/// 表达只读意图，处理器的 `Output` 即调用方拿到的结果。
pub trait Query: Intent {}

/// 类型擦除后的意图视图，供插件观察
pub trait AnyIntent: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> IntentKind;

    fn as_any(&self) -> &dyn Any;
}

impl<T: Intent> AnyIntent for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn kind(&self) -> IntentKind {
        T::KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn AnyIntent + '_ {
    /// 还原为具体意图类型
    pub fn downcast_ref<T: Intent>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// 校验意图是否可被总线识别
///
/// `expected` 为 `Some` 时，要求 `I::KIND` 与调用入口（`execute` / `ask`）一致。
pub(crate) fn validate<I: Intent>(expected: Option<IntentKind>) -> BusResult<()> {
    if I::NAME.trim().is_empty() {
        return Err(BusError::InvalidIntent {
            intent: std::any::type_name::<I>(),
            reason: "intent name must not be empty".to_string(),
        });
    }

    if let Some(expected) = expected {
        if I::KIND != expected {
            return Err(BusError::InvalidIntent {
                intent: I::NAME,
                reason: format!("declared as {}, dispatched as {}", I::KIND, expected),
            });
        }
    }

    Ok(())
}
