use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemFn, parse_macro_input};

/// Test attribute that routes the body through the crate's tracing setup and
/// tags every event with the test's name (each test runs inside a span named
/// after it, so interleaved output from parallel tests stays attributable).
///
/// Works on sync and async functions; attribute arguments are forwarded to
/// `#[tokio::test]` for async ones:
///
/// #[turnstile::test]
/// async fn drains_overflow_queue() { ... }
///
/// #[turnstile::test(flavor = "multi_thread")]
/// async fn contends_for_scan_slots() { ... }
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let tokio_args = proc_macro2::TokenStream::from(attr);
    let func = parse_macro_input!(item as ItemFn);
    let vis = &func.vis;
    let sig = &func.sig;
    let body = &func.block;
    let test_name = sig.ident.to_string();

    let expanded = if sig.asyncness.is_some() {
        let test_attr = if tokio_args.is_empty() {
            quote!(#[tokio::test])
        } else {
            quote!(#[tokio::test(#tokio_args)])
        };
        quote! {
            #test_attr
            #vis #sig {
                turnstile::trace::with_test_tracing(#test_name, || async move #body).await
            }
        }
    } else {
        quote! {
            #[test]
            #vis #sig {
                turnstile::trace::with_test_tracing_sync(#test_name, || #body)
            }
        }
    };
    expanded.into()
}
