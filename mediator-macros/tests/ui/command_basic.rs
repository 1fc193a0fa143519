use mediator::intent::{Command, Intent, IntentKind};
use mediator_macros::command;

#[command]
struct Deposit {
    account: String,
    amount: u64,
}

#[command(name = "account.close", output = bool)]
#[derive(Clone)]
struct CloseAccount(String);

#[command]
enum Adjust {
    Credit { amount: u64 },
    Debit { amount: u64 },
}

fn assert_command<C: Command>() {}

fn main() {
    assert_command::<Deposit>();
    assert_command::<CloseAccount>();
    assert_command::<Adjust>();

    assert_eq!(Deposit::NAME, "Deposit");
    assert_eq!(Deposit::KIND, IntentKind::Command);
    assert_eq!(CloseAccount::NAME, "account.close");

    let _: <CloseAccount as Intent>::Output = true;
    let _: <Deposit as Intent>::Output = ();

    let cmd = Deposit {
        account: "A".into(),
        amount: 10,
    };
    let _ = format!("{:?} {:?}", cmd, CloseAccount("A".into()).clone());
    let _ = format!("{:?}", Adjust::Credit { amount: 1 });
    let _ = format!("{:?}", Adjust::Debit { amount: 1 });
    let _ = (cmd.account, cmd.amount);
}
