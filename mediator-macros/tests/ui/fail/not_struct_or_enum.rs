use mediator_macros::command;

#[command]
fn ping() {}

fn main() {}
