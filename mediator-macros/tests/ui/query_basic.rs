use mediator::intent::{Intent, IntentKind, Query};
use mediator_macros::query;

#[query(output = u64)]
struct GetBalance {
    account: String,
}

#[query(output = Vec<String>, name = "accounts.list")]
struct ListAccounts;

fn assert_query<Q: Query>() {}

fn main() {
    assert_query::<GetBalance>();
    assert_query::<ListAccounts>();

    assert_eq!(GetBalance::NAME, "GetBalance");
    assert_eq!(GetBalance::KIND, IntentKind::Query);
    assert_eq!(ListAccounts::NAME, "accounts.list");

    let _: <GetBalance as Intent>::Output = 42u64;
    let _: <ListAccounts as Intent>::Output = vec!["A".to_string()];

    let q = GetBalance {
        account: "A".into(),
    };
    let _ = format!("{:?} {:?}", q, ListAccounts);
    let _ = q.account;
}
