use heck::ToSnakeCase;
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{DeriveInput, Expr, Lit, LitStr, Meta, Path, Token, parse::Parse, parse::ParseStream, parse_macro_input, punctuated::Punctuated};

mod bind;
mod inject;
mod utils;

use utils::validate_module_id;

/// Configuration parsed from `#[module(...)]`
struct ModuleConfig {
    id: String,
    config: Option<Path>, // config record type; `NoConfig` when absent
    ctor: Option<Expr>,   // `Fn(Arc<Config>) -> anyhow::Result<Self>`
}

impl Parse for ModuleConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut id: Option<String> = None;
        let mut config: Option<Path> = None;
        let mut ctor: Option<Expr> = None;

        let punctuated: Punctuated<Meta, Token![,]> = input.parse_terminated(Meta::parse, Token![,])?;

        for meta in punctuated {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("id") => {
                    if id.is_some() {
                        return Err(syn::Error::new_spanned(nv.path, "duplicate `id` parameter"));
                    }
                    match nv.value {
                        Expr::Lit(syn::ExprLit { lit: Lit::Str(s), .. }) => {
                            let module_id = s.value();
                            if let Err(err) = validate_module_id(&module_id) {
                                return Err(syn::Error::new_spanned(s, err));
                            }
                            id = Some(module_id);
                        }
                        other => {
                            return Err(syn::Error::new_spanned(
                                other,
                                "id must be a string literal, e.g. id = \"heartbeat\"",
                            ));
                        }
                    }
                }
                Meta::NameValue(nv) if nv.path.is_ident("config") => {
                    if config.is_some() {
                        return Err(syn::Error::new_spanned(nv.path, "duplicate `config` parameter"));
                    }
                    match nv.value {
                        Expr::Path(ep) => config = Some(ep.path),
                        other => {
                            return Err(syn::Error::new_spanned(
                                other,
                                "config must be a type path, e.g. config = crate::config::HeartbeatConfig",
                            ));
                        }
                    }
                }
                Meta::NameValue(nv) if nv.path.is_ident("ctor") => {
                    if ctor.is_some() {
                        return Err(syn::Error::new_spanned(nv.path, "duplicate `ctor` parameter"));
                    }
                    if let Expr::Lit(syn::ExprLit { lit: Lit::Str(s), .. }) = &nv.value {
                        return Err(syn::Error::new_spanned(
                            s,
                            "ctor must be a Rust path or closure, not a string literal. \
                             Use: ctor = MyModule::from_config",
                        ));
                    }
                    ctor = Some(nv.value);
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "unknown module parameter; expected `id`, `config` or `ctor`",
                    ));
                }
            }
        }

        let Some(id) = id else {
            return Err(syn::Error::new(
                Span::call_site(),
                "missing required `id` parameter, e.g. #[bootkit::module(id = \"heartbeat\")]",
            ));
        };

        Ok(Self { id, config, ctor })
    }
}

/// Registers a component type with the process-wide registry.
///
/// ```ignore
/// #[bootkit::module(id = "heartbeat", config = HeartbeatConfig, ctor = HeartbeatModule::new)]
/// #[derive(Inject)]
/// pub struct HeartbeatModule { /* ... */ }
/// ```
///
/// - `id`: registry key referenced by definitions (required)
/// - `config`: config record implementing `Bind + Default`; `bootkit::NoConfig` when omitted
/// - `ctor`: `Fn(Arc<Config>) -> anyhow::Result<Self>`; `Self::new` when omitted
///
/// The type must implement `bootkit::Component` and `bootkit::inject::Injectable`
/// (usually via `#[derive(Inject)]`). Also emits `Self::MODULE_ID`.
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = parse_macro_input!(attr as ModuleConfig);
    let input = parse_macro_input!(item as DeriveInput);

    let struct_ident = &input.ident;
    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "#[bootkit::module] does not support generic types")
            .to_compile_error()
            .into();
    }

    let id_lit = LitStr::new(&config.id, Span::call_site());
    let config_ty = config
        .config
        .map_or_else(|| quote! { ::bootkit::NoConfig }, |path| quote! { #path });
    let constructor = config
        .ctor
        .map_or_else(|| quote! { #struct_ident::new }, |expr| quote! { #expr });

    let registrator_name = format_ident!("__bootkit_register_{}", struct_ident.to_string().to_snake_case());

    let expanded = quote! {
        #input

        // Required impls for a registrable module
        const _: () = {
            #[allow(dead_code)]
            fn __bootkit_require_component_impl()
            where
                #struct_ident: ::bootkit::Component + ::bootkit::inject::Injectable,
                #config_ty: ::bootkit::binding::Bind + ::core::default::Default,
            {}
        };

        impl #struct_ident {
            pub const MODULE_ID: &'static str = #id_lit;
        }

        #[doc(hidden)]
        fn #registrator_name(
            r: &::bootkit::Registry,
        ) -> ::core::result::Result<(), ::bootkit::RegistryError> {
            r.register(
                #id_lit,
                <#config_ty as ::core::default::Default>::default,
                #constructor,
            )
            .map(|_| ())
        }

        ::bootkit::inventory::submit! {
            ::bootkit::registry::Registrator(#registrator_name)
        }
    };

    TokenStream::from(expanded)
}

/// Derives `bootkit::Bind` for a config record.
///
/// Mapping keys are normalized (`handshake-timeout`, `HandshakeTimeout` and
/// `handshake_timeout` all match field `handshake_timeout`); unknown keys are
/// rejected. Field options:
///
/// - `#[bind(rename = "key")]`: match another key
/// - `#[bind(skip)]`: never bound from configuration
///
/// Every bound field's type must implement `Bind`.
#[proc_macro_derive(Bind, attributes(bind))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    bind::expand(&input).unwrap_or_else(syn::Error::into_compile_error).into()
}

/// Derives `bootkit::inject::Injectable`.
///
/// - `#[inject]` on an `Inject<T>` field exposes it as a slot named after the field
/// - `#[inject(name = "slot")]` renames the slot
/// - `#[inject(setter(name = "slot", with = Self::method))]` on the struct exposes
///   `fn method(&self, Arc<T>)` as a slot; a field slot of the same name wins
#[proc_macro_derive(Inject, attributes(inject))]
pub fn derive_inject(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    inject::expand(&input).unwrap_or_else(syn::Error::into_compile_error).into()
}
