use mediator::intent::Intent;
use mediator_macros::command;

#[command(debug = false)]
struct Login {
    user: String,
    password: String,
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Login({}, <redacted>)", self.user)
    }
}

fn main() {
    let cmd = Login {
        user: "u-1".into(),
        password: "secret".into(),
    };
    // 使用手写 Debug，实现可编译则说明未自动派生 Debug
    let rendered = format!("{:?}", cmd);
    assert!(!rendered.contains(&cmd.password));
    assert_eq!(Login::NAME, "Login");
}
