//! opbench Macros
//!
//! Procedural macro for benchmark registration.
//!
//! - `#[bench]` - Register a `benchmark_*` function with the harness

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use opbench_core::BenchTime;
use quote::{format_ident, quote};
use syn::{FnArg, ItemFn, Type, parse_macro_input};

/// Name prefix that marks a function as a benchmark
const BENCHMARK_PREFIX: &str = "benchmark_";

mod attr {
    use syn::meta::ParseNestedMeta;

    /// Get the attribute name as a string
    pub fn name(meta: &ParseNestedMeta) -> String {
        meta.path
            .get_ident()
            .map(|i| i.to_string())
            .unwrap_or_default()
    }

    /// Parse a string literal attribute: `attr = "value"`
    pub fn string(meta: &ParseNestedMeta) -> syn::Result<String> {
        let value: syn::LitStr = meta.value()?.parse()?;
        Ok(value.value())
    }

    /// Parse an integer literal attribute: `attr = 42`
    pub fn int(meta: &ParseNestedMeta) -> syn::Result<u64> {
        let value: syn::LitInt = meta.value()?.parse()?;
        value.base10_parse()
    }

    /// Parse a comma-separated string as tags: `tags = "a, b, c"`
    pub fn tags(meta: &ParseNestedMeta) -> syn::Result<Vec<String>> {
        let value: syn::LitStr = meta.value()?.parse()?;
        Ok(value
            .value()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// Create an unknown attribute error
    pub fn unknown(meta: &ParseNestedMeta, name: &str) -> syn::Error {
        meta.error(format!("unknown attribute: {}", name))
    }
}

/// Register a benchmark function
///
/// The function must be named `benchmark_*` and take exactly one
/// `&mut Bencher` argument.
///
/// # Example
///
/// ```ignore
/// #[bench]
/// fn benchmark_int_add(b: &mut Bencher) {
///     let mut val = 1i64;
///     for i in 0..b.n() {
///         val = val.wrapping_add(std::hint::black_box(i) as i64);
///     }
///     b.consume(val);
/// }
///
/// // With configuration
/// #[bench(group = "scalar", tags = "int, add", bench_time = "500ms")]
/// fn benchmark_tuned(b: &mut Bencher) { ... }
///
/// #[bench(iterations = 1000)]
/// fn benchmark_fixed(b: &mut Bencher) { ... }
/// ```
#[proc_macro_attribute]
pub fn bench(args: TokenStream, item: TokenStream) -> TokenStream {
    let args = TokenStream2::from(args);
    let func = parse_macro_input!(item as ItemFn);

    bench_impl(args, func)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn bench_impl(args: TokenStream2, func: ItemFn) -> Result<TokenStream2, syn::Error> {
    validate_signature(&func)?;

    let config = parse_bench_config(args)?;

    let fn_name = &func.sig.ident;
    let fn_name_str = fn_name.to_string();
    let wrapper_name = format_ident!("_opbench_wrapper_{}", fn_name);

    let id = config.id.unwrap_or_else(|| fn_name_str.clone());
    let group = config.group.unwrap_or_else(|| "default".to_string());
    let tags: Vec<_> = config.tags.iter().map(|t| quote! { #t }).collect();
    let iterations = config
        .iterations
        .map(|v| quote! { Some(#v) })
        .unwrap_or(quote! { None });
    let bench_time_ns = config
        .bench_time_ns
        .map(|v| quote! { Some(#v) })
        .unwrap_or(quote! { None });

    Ok(quote! {
        #func

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #wrapper_name(bencher: &mut ::opbench::Bencher) {
            #fn_name(bencher);
        }

        ::opbench::internal::inventory::submit! {
            ::opbench::BenchmarkDef {
                id: #id,
                name: #fn_name_str,
                group: #group,
                tags: &[#(#tags),*],
                runner_fn: #wrapper_name,
                file: file!(),
                line: line!(),
                module_path: module_path!(),
                iterations: #iterations,
                bench_time_ns: #bench_time_ns,
            }
        }
    })
}

#[derive(Default)]
struct BenchConfig {
    id: Option<String>,
    group: Option<String>,
    tags: Vec<String>,
    iterations: Option<u64>,
    bench_time_ns: Option<u64>,
}

fn parse_bench_config(args: TokenStream2) -> Result<BenchConfig, syn::Error> {
    let mut config = BenchConfig::default();

    if args.is_empty() {
        return Ok(config);
    }

    let parser = syn::meta::parser(|meta| {
        let name = attr::name(&meta);
        match name.as_str() {
            "id" => config.id = Some(attr::string(&meta)?),
            "group" => config.group = Some(attr::string(&meta)?),
            "tags" => config.tags = attr::tags(&meta)?,
            "iterations" => config.iterations = Some(attr::int(&meta)?),
            "bench_time" => {
                let value = attr::string(&meta)?;
                match value.parse::<BenchTime>() {
                    Ok(BenchTime::Duration(d)) => {
                        let ns = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
                        config.bench_time_ns = Some(ns);
                    }
                    Ok(BenchTime::Iterations(n)) => config.iterations = Some(n),
                    Err(e) => {
                        return Err(meta.error(format!("invalid bench_time {:?}: {}", value, e)));
                    }
                }
            }
            _ => return Err(attr::unknown(&meta, &name)),
        }
        Ok(())
    });

    syn::parse::Parser::parse2(parser, args)?;

    Ok(config)
}

fn validate_signature(func: &ItemFn) -> syn::Result<()> {
    if !func.sig.ident.to_string().starts_with(BENCHMARK_PREFIX) {
        return Err(syn::Error::new_spanned(
            &func.sig.ident,
            format!(
                "opbench: benchmark functions must be named `{}*`",
                BENCHMARK_PREFIX
            ),
        ));
    }

    if let Some(asyncness) = &func.sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "opbench: benchmark functions must be synchronous",
        ));
    }

    let takes_bencher = func.sig.inputs.len() == 1
        && matches!(
            func.sig.inputs.first(),
            Some(FnArg::Typed(arg)) if matches!(&*arg.ty, Type::Reference(r) if r.mutability.is_some())
        );
    if !takes_bencher {
        return Err(syn::Error::new_spanned(
            &func.sig,
            "opbench: function must take exactly one argument: `&mut Bencher`",
        ));
    }

    Ok(())
}
