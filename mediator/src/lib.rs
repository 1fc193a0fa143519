//! 进程内命令/查询中介（mediator）
//!
//! 调用方把类型化的意图（命令或查询）提交给总线，总线：
//! - 通过注册表（`registry`）解析出唯一的处理器；
//! - 在插件流水线（`pipeline`）中执行处理器：before 顺序、after/failed 逆序；
//! - 只有查询才把处理器结果返回给调用方。
//!
//! 提供两种执行模型且语义完全一致：
//! - `Bus`：异步，`handle` 与每个钩子都是挂起点；
//! - `BlockingBus`：阻塞，在调用线程上执行完毕后返回。
//!
//! 典型用法：
//! 1. 使用 `#[command]` / `#[query(output = T)]`（`mediator-macros`）定义意图；
//! 2. 实现 `Handler<I>`（或 `SyncHandler<I>`）并注册到 `HandlerRegistry`；
//! 3. 以 `Bus::builder()` 组装注册表与插件序列；
//! 4. 以 `DispatchContext` 标识调用链并分发。
//!
pub mod blocking;
pub mod bus;
pub mod context;
pub mod error;
pub mod handler;
pub mod intent;
pub mod pipeline;
pub mod plugin;
pub mod plugins;
pub mod registry;

pub use blocking::BlockingBus;
pub use bus::{Bus, BusConfig};
pub use context::{DispatchContext, DispatchScope};
pub use error::{BusError, BusResult, HookPhase, ResolutionError};
pub use handler::{Blocking, Handler, SyncHandler};
pub use intent::{AnyIntent, Command, Intent, IntentKind, Query};
pub use pipeline::{BeforeFailure, Pipeline};
pub use plugin::{Plugin, SyncPlugin};
pub use registry::HandlerRegistry;

// 允许在本 crate 内部通过 ::mediator 进行自引用，
// 以便过程宏在本 crate 的测试中也能解析到 ::mediator 路径。
extern crate self as mediator;
