//! 总线统一错误定义
//!
//! 所有错误原样传递给调用方，总线本身不做本地恢复与重试。
//!
use std::fmt::{self, Display};
use thiserror::Error;

/// 钩子阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Before,
    After,
    Failed,
}

impl Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HookPhase::Before => "before_handle",
            HookPhase::After => "after_handle",
            HookPhase::Failed => "handle_failed",
        };
        f.write_str(s)
    }
}

/// 处理器解析失败
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("handler not found: intent={intent}")]
    NotFound { intent: &'static str },

    #[error("handler contract mismatch: intent={intent}, expected={expected}")]
    ContractMismatch {
        intent: &'static str,
        expected: &'static str,
    },
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BusError {
    #[error("invalid intent: {intent}: {reason}")]
    InvalidIntent { intent: &'static str, reason: String },

    #[error("resolution: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("handler already registered: intent={intent}")]
    AlreadyRegistered { intent: &'static str },

    #[error("reentrant dispatch: {attempted} while {running} is running")]
    Reentrancy {
        running: &'static str,
        attempted: &'static str,
    },

    /// 应用处理器返回的错误，Display 与 source 均透传原始错误
    #[error(transparent)]
    Handler(anyhow::Error),

    #[error("plugin {plugin} failed in {phase}: {source}")]
    Hook {
        plugin: &'static str,
        phase: HookPhase,
        #[source]
        source: anyhow::Error,
    },
}

/// 统一 Result 类型别名
pub type BusResult<T> = Result<T, BusError>;

impl BusError {
    /// 包装处理器错误
    ///
    /// 处理器内部再次分发（例如嵌套调用被加锁插件拒绝）得到的 `BusError` 原样透传，不再包一层。
    pub fn from_handler(err: anyhow::Error) -> Self {
        match err.downcast::<BusError>() {
            Ok(bus) => bus,
            Err(other) => BusError::Handler(other),
        }
    }

    pub fn hook(plugin: &'static str, phase: HookPhase, source: impl Into<anyhow::Error>) -> Self {
        BusError::Hook {
            plugin,
            phase,
            source: source.into(),
        }
    }

    pub fn is_handler(&self) -> bool {
        matches!(self, BusError::Handler(_))
    }

    /// 取回处理器返回的原始错误
    pub fn downcast_handler_ref<E>(&self) -> Option<&E>
    where
        E: Display + fmt::Debug + Send + Sync + 'static,
    {
        match self {
            BusError::Handler(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub fn into_handler_error(self) -> Option<anyhow::Error> {
        match self {
            BusError::Handler(err) => Some(err),
            _ => None,
        }
    }
}
