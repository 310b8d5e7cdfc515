use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, parse_quote, spanned::Spanned, Ident, ItemFn, LitStr, Stmt};

const USAGE: &str = "rxwindow_macro::test only accepts: #[rxwindow_macro::test], \
                     #[rxwindow_macro::test(local)] or #[rxwindow_macro::test(shared)]";

/// Marks a sync or async test for the `rxwindow` crate.
///
/// Sync functions become `#[test]`, async functions become `#[tokio::test]`.
/// The `local` flavor runs on a current-thread runtime, `shared` on a
/// multi-thread one. Every test installs `env_logger` in test mode first, so
/// `RUST_LOG=rxwindow=trace` shows what the operators are doing.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let mut input = parse_macro_input!(item as ItemFn);
  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let tokio_args = if raw_args.is_empty() {
    proc_macro2::TokenStream::new()
  } else {
    if !is_async {
      return syn::Error::new(
        raw_args.span(),
        "rxwindow_macro::test flavor args are only supported for async tests",
      )
      .to_compile_error()
      .into();
    }
    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      ident.to_string()
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      lit.value()
    } else {
      return syn::Error::new(raw_args.span(), USAGE)
        .to_compile_error()
        .into();
    };
    match flavor.as_str() {
      "local" => quote!(flavor = "current_thread"),
      "shared" => quote!(flavor = "multi_thread"),
      _ => {
        return syn::Error::new(raw_args.span(), USAGE)
          .to_compile_error()
          .into()
      }
    }
  };

  let init_logger: Stmt = parse_quote! {
    let _ = ::env_logger::builder().is_test(true).try_init();
  };
  input.block.stmts.insert(0, init_logger);

  let native_attr = if is_async { quote!(#[::tokio::test(#tokio_args)]) } else { quote!(#[test]) };

  let expanded = quote! {
    #native_attr
    #input
  };

  TokenStream::from(expanded)
}
