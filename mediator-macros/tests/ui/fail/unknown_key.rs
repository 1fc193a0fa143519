use mediator_macros::command;

#[command(label = "ping")]
struct Ping;

fn main() {}
