use anyhow::Result as AnyResult;
use async_trait::async_trait;
use mediator::plugins::{LockingPlugin, LoggingPlugin, TransactionPlugin, TransactionalResource};
use mediator::{
    AnyIntent, Blocking, BlockingBus, Bus, BusError, BusResult, DispatchContext, DispatchScope,
    HandlerRegistry, SyncHandler, SyncPlugin,
};
use mediator_macros::{command, query};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

type Journal = Arc<Mutex<Vec<String>>>;

#[command]
struct Rename {
    name: String,
}

#[command]
struct Explode;

#[query(output = String)]
struct Echo(String);

#[command]
struct Reenter {
    fork: bool,
}

/// 记录钩子调用顺序的阻塞式插件
struct Recorder {
    name: &'static str,
    journal: Journal,
}

impl Recorder {
    fn boxed(name: &'static str, journal: &Journal) -> Arc<Blocking<Recorder>> {
        Arc::new(Blocking(Recorder {
            name,
            journal: journal.clone(),
        }))
    }

    fn push(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

impl SyncPlugin for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn before_handle(&self, _scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        self.push(format!("{}.before({})", self.name, intent.name()));
        Ok(())
    }

    fn after_handle(&self, _scope: &DispatchScope<'_>, intent: &dyn AnyIntent) -> BusResult<()> {
        self.push(format!("{}.after({})", self.name, intent.name()));
        Ok(())
    }

    fn handle_failed(&self, _scope: &DispatchScope<'_>) -> BusResult<()> {
        self.push(format!("{}.failed", self.name));
        Ok(())
    }
}

struct RenameHandler {
    journal: Journal,
}

impl SyncHandler<Rename> for RenameHandler {
    fn handle(&self, _ctx: &DispatchContext, cmd: &Rename) -> AnyResult<()> {
        self.journal.lock().unwrap().push(format!("handler({})", cmd.name));
        Ok(())
    }
}

struct ExplodeHandler {
    journal: Journal,
}

impl SyncHandler<Explode> for ExplodeHandler {
    fn handle(&self, _ctx: &DispatchContext, _cmd: &Explode) -> AnyResult<()> {
        self.journal.lock().unwrap().push("handler(explode)".into());
        anyhow::bail!("kaboom")
    }
}

struct EchoHandler;

impl SyncHandler<Echo> for EchoHandler {
    fn handle(&self, _ctx: &DispatchContext, q: &Echo) -> AnyResult<String> {
        Ok(q.0.clone())
    }
}

struct ReenterHandler {
    bus: Arc<OnceLock<BlockingBus>>,
}

impl SyncHandler<Reenter> for ReenterHandler {
    fn handle(&self, ctx: &DispatchContext, cmd: &Reenter) -> AnyResult<()> {
        let bus = self.bus.get().expect("bus wired");
        let nested_ctx = if cmd.fork { ctx.fork() } else { ctx.clone() };
        bus.execute(
            &nested_ctx,
            Rename {
                name: "nested".into(),
            },
        )?;
        Ok(())
    }
}

struct Fixture {
    bus: BlockingBus,
    journal: Journal,
    locking: Arc<LockingPlugin>,
}

// [Locking, p1, p2]
fn fixture() -> Fixture {
    let journal = Journal::default();
    let registry = HandlerRegistry::new();
    registry
        .register_blocking::<Rename, _>(RenameHandler {
            journal: journal.clone(),
        })
        .unwrap();
    registry
        .register_blocking::<Explode, _>(ExplodeHandler {
            journal: journal.clone(),
        })
        .unwrap();
    registry.register_blocking::<Echo, _>(EchoHandler).unwrap();

    let slot: Arc<OnceLock<BlockingBus>> = Arc::default();
    registry
        .register_blocking::<Reenter, _>(ReenterHandler { bus: slot.clone() })
        .unwrap();

    let locking = Arc::new(LockingPlugin::new());
    let bus = Bus::builder()
        .registry(Arc::new(registry))
        .plugins(vec![
            locking.clone(),
            Recorder::boxed("p1", &journal),
            Recorder::boxed("p2", &journal),
        ])
        .build()
        .into_blocking();
    let _ = slot.set(bus.clone());

    Fixture {
        bus,
        journal,
        locking,
    }
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

#[test]
fn success_order_matches_async_model() {
    let f = fixture();
    let out = f
        .bus
        .handle(
            &DispatchContext::new(),
            Rename {
                name: "bob".into(),
            },
        )
        .unwrap();

    assert_eq!(out, None);
    assert_eq!(
        entries(&f.journal),
        vec![
            "p1.before(Rename)",
            "p2.before(Rename)",
            "handler(bob)",
            "p2.after(Rename)",
            "p1.after(Rename)",
        ]
    );
}

#[test]
fn failure_order_matches_async_model() {
    let f = fixture();
    let ctx = DispatchContext::new();
    let err = f.bus.execute(&ctx, Explode).unwrap_err();

    assert!(err.is_handler());
    assert_eq!(err.to_string(), "kaboom");
    assert_eq!(
        entries(&f.journal),
        vec![
            "p1.before(Explode)",
            "p2.before(Explode)",
            "handler(explode)",
            "p2.failed",
            "p1.failed",
        ]
    );
    assert_eq!(f.locking.is_locked(&ctx), None);
}

#[test]
fn query_returns_handler_value() {
    let f = fixture();
    let ctx = DispatchContext::new();

    assert_eq!(
        f.bus.ask(&ctx, Echo("hello".into())).unwrap(),
        "hello".to_string()
    );
    assert_eq!(
        f.bus.handle(&ctx, Echo("again".into())).unwrap(),
        Some("again".to_string())
    );
}

#[test]
fn nested_dispatch_on_same_context_is_rejected() {
    let f = fixture();
    let ctx = DispatchContext::new();

    let err = f.bus.execute(&ctx, Reenter { fork: false }).unwrap_err();

    assert!(matches!(
        err,
        BusError::Reentrancy {
            running: "Reenter",
            attempted: "Rename"
        }
    ));
    assert_eq!(
        entries(&f.journal),
        vec!["p1.before(Reenter)", "p2.before(Reenter)", "p2.failed", "p1.failed"]
    );
    assert_eq!(f.locking.is_locked(&ctx), None);

    // 锁已释放，同一上下文可再次分发
    f.bus
        .execute(
            &ctx,
            Rename {
                name: "after".into(),
            },
        )
        .unwrap();
}

#[test]
fn nested_dispatch_on_forked_context_runs_inside_outer() {
    let f = fixture();
    f.bus
        .execute(&DispatchContext::new(), Reenter { fork: true })
        .unwrap();

    assert_eq!(
        entries(&f.journal),
        vec![
            "p1.before(Reenter)",
            "p2.before(Reenter)",
            "p1.before(Rename)",
            "p2.before(Rename)",
            "handler(nested)",
            "p2.after(Rename)",
            "p1.after(Rename)",
            "p2.after(Reenter)",
            "p1.after(Reenter)",
        ]
    );
}

#[test]
fn blocking_and_async_views_share_the_pipeline() {
    let f = fixture();

    assert_eq!(
        f.bus.as_async().pipeline().plugin_names(),
        vec!["locking", "p1", "p2"]
    );
}

#[query(output = u64)]
struct GetBalance {
    account: String,
}

struct FixedBalance;

impl SyncHandler<GetBalance> for FixedBalance {
    fn handle(&self, _ctx: &DispatchContext, q: &GetBalance) -> AnyResult<u64> {
        Ok(if q.account == "A" { 42 } else { 0 })
    }
}

#[test]
fn query_without_plugins_returns_handler_value() {
    let registry = HandlerRegistry::new();
    registry
        .register_blocking::<GetBalance, _>(FixedBalance)
        .unwrap();
    let bus = BlockingBus::new(Bus::builder().registry(Arc::new(registry)).build());

    let balance = bus
        .ask(
            &DispatchContext::new(),
            GetBalance {
                account: "A".into(),
            },
        )
        .unwrap();

    assert_eq!(balance, 42);
    assert!(bus.as_async().pipeline().is_empty());
}

#[command]
struct Deposit {
    account: String,
    amount: u64,
}

#[command]
struct Withdraw {
    account: String,
    amount: u64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("insufficient funds: balance={balance}, requested={requested}")]
struct InsufficientFunds {
    balance: u64,
    requested: u64,
}

type Accounts = Arc<Mutex<HashMap<String, u64>>>;

struct Teller {
    accounts: Accounts,
}

impl SyncHandler<Deposit> for Teller {
    fn handle(&self, _ctx: &DispatchContext, cmd: &Deposit) -> AnyResult<()> {
        *self
            .accounts
            .lock()
            .unwrap()
            .entry(cmd.account.clone())
            .or_default() += cmd.amount;
        Ok(())
    }
}

impl SyncHandler<Withdraw> for Teller {
    fn handle(&self, _ctx: &DispatchContext, cmd: &Withdraw) -> AnyResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let balance = accounts.entry(cmd.account.clone()).or_default();
        if *balance < cmd.amount {
            return Err(InsufficientFunds {
                balance: *balance,
                requested: cmd.amount,
            }
            .into());
        }
        *balance -= cmd.amount;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingDatabase {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingDatabase {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionalResource for RecordingDatabase {
    async fn begin(&self) -> AnyResult<()> {
        self.calls.lock().unwrap().push("begin");
        Ok(())
    }

    async fn commit(&self) -> AnyResult<()> {
        self.calls.lock().unwrap().push("commit");
        Ok(())
    }

    async fn rollback(&self) -> AnyResult<()> {
        self.calls.lock().unwrap().push("rollback");
        Ok(())
    }
}

struct Bank {
    bus: BlockingBus,
    accounts: Accounts,
    db: Arc<RecordingDatabase>,
    locking: Arc<LockingPlugin>,
}

// [Locking, Transaction, Logging]
fn bank() -> Bank {
    let accounts = Accounts::default();
    let registry = HandlerRegistry::new();
    registry
        .register_blocking::<Deposit, _>(Teller {
            accounts: accounts.clone(),
        })
        .unwrap();
    registry
        .register_blocking::<Withdraw, _>(Teller {
            accounts: accounts.clone(),
        })
        .unwrap();

    let db = Arc::new(RecordingDatabase::default());
    let locking = Arc::new(LockingPlugin::new());
    let bus = Bus::builder()
        .registry(Arc::new(registry))
        .plugins(vec![
            locking.clone(),
            Arc::new(TransactionPlugin::new(db.clone())),
            Arc::new(LoggingPlugin::new()),
        ])
        .build()
        .into_blocking();

    Bank {
        bus,
        accounts,
        db,
        locking,
    }
}

#[test]
fn deposit_commits_once_and_releases_the_lock() {
    let b = bank();
    let ctx = DispatchContext::new();

    let out = b
        .bus
        .handle(
            &ctx,
            Deposit {
                account: "A".into(),
                amount: 10,
            },
        )
        .unwrap();

    assert_eq!(out, None);
    assert_eq!(b.db.calls(), vec!["begin", "commit"]);
    assert_eq!(b.locking.is_locked(&ctx), None);
    assert_eq!(b.accounts.lock().unwrap().get("A"), Some(&10));
}

#[test]
fn insufficient_funds_rolls_back_once_and_surfaces_unchanged() {
    let b = bank();
    let ctx = DispatchContext::new();

    let err = b
        .bus
        .execute(
            &ctx,
            Withdraw {
                account: "A".into(),
                amount: 5,
            },
        )
        .unwrap_err();

    assert_eq!(err.to_string(), "insufficient funds: balance=0, requested=5");
    assert_eq!(
        err.downcast_handler_ref::<InsufficientFunds>(),
        Some(&InsufficientFunds {
            balance: 0,
            requested: 5
        })
    );
    assert_eq!(b.db.calls(), vec!["begin", "rollback"]);
    assert_eq!(b.locking.is_locked(&ctx), None);
}

#[test]
fn every_dispatch_ends_in_exactly_one_commit_or_rollback() {
    let b = bank();
    let ctx = DispatchContext::new();

    for round in 0..10u64 {
        b.bus
            .execute(
                &ctx,
                Deposit {
                    account: "A".into(),
                    amount: 1,
                },
            )
            .unwrap();
        let _ = b
            .bus
            .execute(
                &ctx,
                Withdraw {
                    account: "A".into(),
                    amount: 100 + round,
                },
            )
            .unwrap_err();
    }

    let calls = b.db.calls();
    assert_eq!(calls.iter().filter(|c| **c == "begin").count(), 20);
    assert_eq!(calls.iter().filter(|c| **c == "commit").count(), 10);
    assert_eq!(calls.iter().filter(|c| **c == "rollback").count(), 10);
    assert_eq!(b.accounts.lock().unwrap().get("A"), Some(&10));
}
