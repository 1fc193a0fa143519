use async_trait::async_trait;
use mediator::plugins::{LockingPlugin, LoggingPlugin, TimingPlugin, TransactionPlugin, TransactionalResource};
use mediator::{Bus, DispatchContext, Handler, HandlerRegistry};
use mediator_macros::{command, query};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

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

#[query(output = u64)]
struct GetBalance {
    account: String,
}

#[derive(Debug, thiserror::Error)]
#[error("insufficient funds: balance {balance}, requested {requested}")]
struct InsufficientFunds {
    balance: u64,
    requested: u64,
}

type Ledger = Arc<Mutex<HashMap<String, u64>>>;

struct Database;

#[async_trait]
impl TransactionalResource for Database {
    async fn begin(&self) -> anyhow::Result<()> {
        println!("db: BEGIN");
        Ok(())
    }

    async fn commit(&self) -> anyhow::Result<()> {
        println!("db: COMMIT");
        Ok(())
    }

    async fn rollback(&self) -> anyhow::Result<()> {
        println!("db: ROLLBACK");
        Ok(())
    }
}

struct DepositHandler {
    ledger: Ledger,
}

#[async_trait]
impl Handler<Deposit> for DepositHandler {
    async fn handle(&self, _ctx: &DispatchContext, cmd: &Deposit) -> anyhow::Result<()> {
        let mut ledger = self.ledger.lock().unwrap();
        *ledger.entry(cmd.account.clone()).or_default() += cmd.amount;
        Ok(())
    }
}

struct WithdrawHandler {
    ledger: Ledger,
}

#[async_trait]
impl Handler<Withdraw> for WithdrawHandler {
    async fn handle(&self, _ctx: &DispatchContext, cmd: &Withdraw) -> anyhow::Result<()> {
        let mut ledger = self.ledger.lock().unwrap();
        let balance = ledger.entry(cmd.account.clone()).or_default();
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

struct GetBalanceHandler {
    ledger: Ledger,
}

#[async_trait]
impl Handler<GetBalance> for GetBalanceHandler {
    async fn handle(&self, _ctx: &DispatchContext, q: &GetBalance) -> anyhow::Result<u64> {
        Ok(self.ledger.lock().unwrap().get(&q.account).copied().unwrap_or(0))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let ledger = Ledger::default();
    let registry = HandlerRegistry::new();
    registry.register::<Deposit, _>(Arc::new(DepositHandler {
        ledger: ledger.clone(),
    }))?;
    registry.register::<Withdraw, _>(Arc::new(WithdrawHandler {
        ledger: ledger.clone(),
    }))?;
    registry.register::<GetBalance, _>(Arc::new(GetBalanceHandler { ledger }))?;

    let bus = Bus::builder()
        .registry(Arc::new(registry))
        .plugins(vec![
            Arc::new(LockingPlugin::new()),
            Arc::new(TimingPlugin::new()),
            Arc::new(TransactionPlugin::new(Arc::new(Database))),
            Arc::new(LoggingPlugin::new()),
        ])
        .build();

    let ctx = DispatchContext::builder()
        .correlation_id("cor-1".into())
        .actor_type("user".into())
        .actor_id("u-1".into())
        .build();

    bus.execute(
        &ctx,
        Deposit {
            account: "alice".into(),
            amount: 100,
        },
    )
    .await?;

    let withdrawn = bus
        .execute(
            &ctx,
            Withdraw {
                account: "alice".into(),
                amount: 250,
            },
        )
        .await;
    if let Err(err) = withdrawn {
        match err.downcast_handler_ref::<InsufficientFunds>() {
            Some(e) => println!("withdraw rejected: {e}"),
            None => return Err(err.into()),
        }
    }

    let balance = bus
        .ask(
            &ctx,
            GetBalance {
                account: "alice".into(),
            },
        )
        .await?;
    println!("alice balance = {balance}");

    Ok(())
}
