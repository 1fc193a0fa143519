use mediator_macros::query;

#[query]
struct Lookup;

fn main() {}
