use crate::{
    context::DispatchScope,
    error::BusResult,
    intent::AnyIntent,
    plugin::Plugin,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// 耗时记录器
pub trait DurationRecorder: Send + Sync {
    fn record(&self, intent: &'static str, elapsed: Duration);
}

impl<F> DurationRecorder for F
where
    F: Fn(&'static str, Duration) + Send + Sync,
{
    fn record(&self, intent: &'static str, elapsed: Duration) {
        self(intent, elapsed)
    }
}

struct TraceRecorder;

impl DurationRecorder for TraceRecorder {
    fn record(&self, intent: &'static str, elapsed: Duration) {
        tracing::info!(intent, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "dispatch timed");
    }
}

/// 计时插件
///
/// before 记录开始时刻，after 上报耗时；失败的分发不上报。
/// 开始时刻暂存在 [`DispatchScope`] 上而不是插件自身：排在其后的插件在 before
/// 阶段失败时（默认策略下本插件的 failed 不会被调用），它随分发结束一起释放。
pub struct TimingPlugin {
    recorder: Arc<dyn DurationRecorder>,
    in_flight: Arc<AtomicUsize>,
}

// 单次分发的开始时刻；销毁时扣减进行中计数
struct Started {
    at: Instant,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for Started {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for TimingPlugin {
    fn default() -> Self {
        Self::with_recorder(Arc::new(TraceRecorder))
    }
}

impl TimingPlugin {
    /// 通过 `tracing` 上报耗时
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recorder(recorder: Arc<dyn DurationRecorder>) -> Self {
        Self {
            recorder,
            in_flight: Arc::default(),
        }
    }

    /// 进行中的分发数量
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Plugin for TimingPlugin {
    fn name(&self) -> &'static str {
        "timing"
    }

    async fn before_handle(&self, scope: &DispatchScope<'_>, _intent: &dyn AnyIntent) -> BusResult<()> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        scope.stash(
            self,
            Started {
                at: Instant::now(),
                in_flight: self.in_flight.clone(),
            },
        );
        Ok(())
    }

    async fn after_handle(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        if let Some(started) = scope.take::<_, Started>(self) {
            self.recorder.record(intent.name(), started.at.elapsed());
        }
        Ok(())
    }

    async fn handle_failed(&self, scope: &DispatchScope<'_>) -> BusResult<()> {
        drop(scope.take::<_, Started>(self));
        Ok(())
    }
}
