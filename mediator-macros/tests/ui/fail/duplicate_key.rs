use mediator_macros::command;

#[command(name = "a", name = "b")]
struct Ping;

fn main() {}
