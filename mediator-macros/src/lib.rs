use proc_macro::TokenStream;

mod intent;
mod utils;

/// 命令宏
/// - 为结构体/枚举实现 `::mediator::intent::Intent`（`KIND = Command`）与 `::mediator::intent::Command`
/// - 合并/追加派生：Debug（可通过 `debug = false` 关闭）
/// - 支持参数：
///   - `name = "..."`：稳定名称，默认取类型名
///   - `output = Type`：处理器产出类型，默认 `()`；总线总会丢弃命令的结果
///
/// ```rust,ignore
/// #[command]
/// struct Deposit {
///     amount: u64,
/// }
/// ```
#[proc_macro_attribute]
pub fn command(attr: TokenStream, item: TokenStream) -> TokenStream {
    intent::expand(intent::Kind::Command, attr, item)
}

/// 查询宏
/// - 为结构体/枚举实现 `::mediator::intent::Intent`（`KIND = Query`）与 `::mediator::intent::Query`
/// - 合并/追加派生：Debug（可通过 `debug = false` 关闭）
/// - 支持参数：
///   - `output = Type`：必填，调用方拿到的结果类型
///   - `name = "..."`：稳定名称，默认取类型名
///
/// ```rust,ignore
/// #[query(output = u64)]
/// struct GetBalance {
///     account: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn query(attr: TokenStream, item: TokenStream) -> TokenStream {
    intent::expand(intent::Kind::Query, attr, item)
}
