/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use proc_macro::TokenStream;

use quote::quote;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Expr, ExprLit, ItemFn, Lit, MetaNameValue, Token};

/// Runs an `async fn` test on its own multi-threaded Tokio runtime.
///
/// Accepts an optional `timeout_secs = N` argument. When present, the test body
/// is cancelled and the test fails once the deadline passes, so a stuck actor
/// cannot hang the whole suite.
#[proc_macro_attribute]
pub fn switchboard_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr with Punctuated::<MetaNameValue, Token![,]>::parse_terminated);
    let input = parse_macro_input!(item as ItemFn);

    let mut timeout_secs: Option<u64> = None;
    for arg in &args {
        if !arg.path.is_ident("timeout_secs") {
            return syn::Error::new_spanned(&arg.path, "expected `timeout_secs = <integer>`")
                .to_compile_error()
                .into();
        }
        match &arg.value {
            Expr::Lit(ExprLit {
                lit: Lit::Int(value),
                ..
            }) => match value.base10_parse::<u64>() {
                Ok(secs) => timeout_secs = Some(secs),
                Err(err) => return err.to_compile_error().into(),
            },
            other => {
                return syn::Error::new_spanned(other, "`timeout_secs` must be an integer literal")
                    .to_compile_error()
                    .into();
            }
        }
    }

    let vis = &input.vis;
    let sig = &input.sig;
    let body = &input.block;
    let attrs = &input.attrs;
    let name = &sig.ident;
    let inputs = &sig.inputs;
    let output = &sig.output;

    if sig.asyncness.is_none() {
        return syn::Error::new_spanned(sig.fn_token, "#[switchboard_test] requires an async fn")
            .to_compile_error()
            .into();
    }

    let async_name = syn::Ident::new(&format!("__{name}_async"), name.span());

    let run_body = match timeout_secs {
        Some(secs) => quote! {
            match ::switchboard_test::__private::tokio::time::timeout(
                ::std::time::Duration::from_secs(#secs),
                #async_name(),
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(_) => panic!(
                    "test `{}` did not finish within {} seconds",
                    stringify!(#name),
                    #secs
                ),
            }
        },
        None => quote! { #async_name().await },
    };

    let expanded = quote! {
        #[test]
        #(#attrs)*
        #vis fn #name() {
            let runtime = ::switchboard_test::__private::tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("failed to build the test runtime");

            let test_span = ::switchboard_test::__private::tracing::info_span!(
                "switchboard_test",
                name = stringify!(#name)
            );
            let outcome = runtime.block_on(::switchboard_test::__private::tracing::Instrument::instrument(
                async { #run_body },
                test_span,
            ));

            runtime.shutdown_timeout(::std::time::Duration::from_secs(1));
            ::switchboard_test::TestOutcome::finish(outcome);
        }

        async fn #async_name(#inputs) #output #body
    };

    expanded.into()
}
