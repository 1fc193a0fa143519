use crate::utils::apply_derives;
use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Ident, Item, LitBool, LitStr, Result, Token, Type, parse::Parse, parse::ParseStream,
    parse_macro_input,
};

#[derive(Clone, Copy)]
pub(crate) enum Kind {
    Command,
    Query,
}

impl Kind {
    fn attr_name(self) -> &'static str {
        match self {
            Kind::Command => "#[command]",
            Kind::Query => "#[query]",
        }
    }
}

/// #[command] / #[query] 宏实现
/// - 支持结构体（具名、tuple、unit）与枚举
/// - 生成 `Intent` 与对应标记 trait 的实现，意图种类在编译期确定
pub(crate) fn expand(kind: Kind, attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as IntentAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let mut required: Vec<syn::Path> = Vec::new();
    if cfg.derive_debug.as_ref().map(LitBool::value).unwrap_or(true) {
        required.push(syn::parse_quote!(Debug));
    }

    let (ident, generics) = match &mut input {
        Item::Struct(st) => {
            apply_derives(&mut st.attrs, required);
            (st.ident.clone(), st.generics.clone())
        }
        Item::Enum(en) => {
            apply_derives(&mut en.attrs, required);
            (en.ident.clone(), en.generics.clone())
        }
        other => {
            // 只标注首个 token（如 `fn`、`impl`）
            let span = other
                .to_token_stream()
                .into_iter()
                .next()
                .map(|tt| tt.span())
                .unwrap_or_else(proc_macro2::Span::call_site);
            let msg = format!("{} only supports struct or enum", kind.attr_name());
            return syn::Error::new(span, msg).to_compile_error().into();
        }
    };

    let output: Type = match (kind, cfg.output) {
        (_, Some(ty)) => ty,
        (Kind::Command, None) => syn::parse_quote!(()),
        (Kind::Query, None) => {
            return syn::Error::new(
                ident.span(),
                "#[query] requires an output type, e.g. #[query(output = u64)]",
            )
            .to_compile_error()
            .into();
        }
    };

    let name = cfg
        .name
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
    if name.value().trim().is_empty() {
        return syn::Error::new(name.span(), "intent name must not be empty")
            .to_compile_error()
            .into();
    }

    let (kind_variant, marker) = match kind {
        Kind::Command => (quote!(Command), quote!(::mediator::intent::Command)),
        Kind::Query => (quote!(Query), quote!(::mediator::intent::Query)),
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let out = quote! {
        #input

        impl #impl_generics ::mediator::intent::Intent for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
            const KIND: ::mediator::intent::IntentKind = ::mediator::intent::IntentKind::#kind_variant;
            type Output = #output;
        }

        impl #impl_generics #marker for #ident #ty_generics #where_clause {}
    };

    TokenStream::from(out)
}

// -------- parsing --------

// 解析键值参数：name = "..."、output = <Type>、debug = <bool>
#[derive(Default)]
struct IntentAttrConfig {
    name: Option<LitStr>,
    output: Option<Type>,
    derive_debug: Option<LitBool>,
}

enum IntentAttrElem {
    Name(LitStr),
    Output(Type),
    Debug(LitBool),
}

impl Parse for IntentAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        match key.to_string().as_str() {
            "name" => Ok(Self::Name(input.parse()?)),
            "output" => Ok(Self::Output(input.parse()?)),
            "debug" => Ok(Self::Debug(input.parse()?)),
            _ => Err(syn::Error::new(
                key.span(),
                "unknown key; expected 'name' | 'output' | 'debug'",
            )),
        }
    }
}

impl Parse for IntentAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cfg = Self::default();
        if input.is_empty() {
            return Ok(cfg);
        }

        let pairs: Punctuated<IntentAttrElem, Token![,]> = Punctuated::parse_terminated(input)?;
        for elem in pairs.into_iter() {
            match elem {
                IntentAttrElem::Name(lit) => {
                    if cfg.name.is_some() {
                        return Err(syn::Error::new(lit.span(), "duplicate key 'name' in attribute"));
                    }
                    cfg.name = Some(lit);
                }
                IntentAttrElem::Output(ty) => {
                    if cfg.output.is_some() {
                        return Err(syn::Error::new(ty.span(), "duplicate key 'output' in attribute"));
                    }
                    cfg.output = Some(ty);
                }
                IntentAttrElem::Debug(lit) => {
                    if cfg.derive_debug.is_some() {
                        return Err(syn::Error::new(lit.span(), "duplicate key 'debug' in attribute"));
                    }
                    cfg.derive_debug = Some(lit);
                }
            }
        }

        Ok(cfg)
    }
}
