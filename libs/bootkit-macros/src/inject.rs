use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, ExprPath, Fields, LitStr, Type};

use crate::utils::{path_last_is, unraw};

struct Setter {
    name: LitStr,
    with: ExprPath,
}

fn parse_setters(input: &DeriveInput) -> syn::Result<Vec<Setter>> {
    let mut setters = Vec::new();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("inject")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("setter") {
                return Err(meta.error("expected `setter(name = \"...\", with = Self::method)`"));
            }
            let mut name: Option<LitStr> = None;
            let mut with: Option<ExprPath> = None;
            meta.parse_nested_meta(|inner| {
                if inner.path.is_ident("name") {
                    name = Some(inner.value()?.parse()?);
                    Ok(())
                } else if inner.path.is_ident("with") {
                    with = Some(inner.value()?.parse()?);
                    Ok(())
                } else {
                    Err(inner.error("unknown setter option; expected `name` or `with`"))
                }
            })?;
            match (name, with) {
                (Some(name), Some(with)) => {
                    setters.push(Setter { name, with });
                    Ok(())
                }
                _ => Err(meta.error("setter needs both `name = \"...\"` and `with = Self::method`")),
            }
        })?;
    }
    Ok(setters)
}

fn field_slot_name(field: &syn::Field) -> syn::Result<Option<LitStr>> {
    let mut marked = false;
    let mut name: Option<LitStr> = None;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("inject")) {
        marked = true;
        if matches!(attr.meta, syn::Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unknown inject option; expected `name = \"...\"`"))
            }
        })?;
    }
    if !marked {
        return Ok(None);
    }
    let Some(ident) = &field.ident else {
        return Ok(None);
    };

    let is_slot = match &field.ty {
        Type::Path(tp) => path_last_is(&tp.path, "Inject"),
        _ => false,
    };
    if !is_slot {
        return Err(syn::Error::new_spanned(
            &field.ty,
            "#[inject] fields must have type bootkit::Inject<T>",
        ));
    }
    Ok(Some(name.unwrap_or_else(|| LitStr::new(&unraw(ident), ident.span()))))
}

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(ident, "Inject cannot be derived for tuple structs"));
            }
        },
        _ => return Err(syn::Error::new_spanned(ident, "Inject can only be derived for structs")),
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut field_slots = Vec::new();
    for field in fields {
        if let Some(name) = field_slot_name(field)? {
            if !seen.insert(name.value()) {
                return Err(syn::Error::new_spanned(&name, "duplicate field slot name"));
            }
            let member = &field.ident;
            field_slots.push(quote! {
                .field(#name, |__this: &Self, __target: &::bootkit::Instance| __this.#member.assign(__target))
            });
        }
    }

    let mut setter_names: HashSet<String> = HashSet::new();
    let mut setter_slots = Vec::new();
    for Setter { name, with } in parse_setters(input)? {
        if !setter_names.insert(name.value()) {
            return Err(syn::Error::new_spanned(&name, "duplicate setter slot name"));
        }
        setter_slots.push(quote! {
            .setter(#name, |__this: &Self, __target: &::bootkit::Instance| {
                ::bootkit::inject::call_setter(__this, #with, __target)
            })
        });
    }

    Ok(quote! {
        impl #impl_generics ::bootkit::inject::Injectable for #ident #ty_generics #where_clause {
            fn slot_table() -> ::bootkit::inject::SlotTable<Self> {
                ::bootkit::inject::SlotTable::new()
                    #(#field_slots)*
                    #(#setter_slots)*
            }
        }
    })
}
