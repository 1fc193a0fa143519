use mediator::plugins::LockingPlugin;
use mediator::{
    AnyIntent, Blocking, Bus, BusResult, DispatchContext, DispatchScope, HandlerRegistry,
    SyncHandler, SyncPlugin,
};
use mediator_macros::{command, query};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[command]
struct Increment {
    by: u64,
}

#[query(output = u64)]
struct Current;

struct Counter {
    value: Arc<AtomicU64>,
}

impl SyncHandler<Increment> for Counter {
    fn handle(&self, _ctx: &DispatchContext, cmd: &Increment) -> anyhow::Result<()> {
        self.value.fetch_add(cmd.by, Ordering::SeqCst);
        Ok(())
    }
}

impl SyncHandler<Current> for Counter {
    fn handle(&self, _ctx: &DispatchContext, _q: &Current) -> anyhow::Result<u64> {
        Ok(self.value.load(Ordering::SeqCst))
    }
}

struct Printer;

impl SyncPlugin for Printer {
    fn name(&self) -> &'static str {
        "printer"
    }

    fn before_handle(&self, scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        println!("-> {} ({})", intent.name(), scope.dispatch_id());
        Ok(())
    }

    fn after_handle(&self, _scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        println!("<- {}", intent.name());
        Ok(())
    }

    fn handle_failed(&self, scope: &DispatchScope<'_>) -> BusResult<()> {
        println!("!! {}", scope.dispatch_id());
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let value = Arc::new(AtomicU64::new(0));
    let registry = HandlerRegistry::new();
    registry.register_blocking::<Increment, _>(Counter {
        value: value.clone(),
    })?;
    registry.register_blocking::<Current, _>(Counter { value })?;

    let bus = Bus::builder()
        .registry(Arc::new(registry))
        .plugins(vec![
            Arc::new(LockingPlugin::new()),
            Arc::new(Blocking(Printer)),
        ])
        .build()
        .into_blocking();

    let ctx = DispatchContext::new();
    for by in 1..=3 {
        bus.execute(&ctx, Increment { by })?;
    }
    println!("current = {}", bus.ask(&ctx, Current)?);

    Ok(())
}
