use mediator_macros::command;

#[command(name = "  ")]
struct Ping;

fn main() {}
