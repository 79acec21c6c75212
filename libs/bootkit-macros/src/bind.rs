use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr};

use crate::utils::{to_field_name, unraw};

struct BoundField {
    ident: Ident,
    key: String,
}

fn parse_field_attrs(field: &syn::Field) -> syn::Result<(Option<LitStr>, bool)> {
    let mut rename: Option<LitStr> = None;
    let mut skip = false;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("bind")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if rename.is_some() {
                    return Err(meta.error("duplicate `rename` parameter"));
                }
                rename = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unknown bind option; expected `rename = \"...\"` or `skip`"))
            }
        })?;
    }
    Ok((rename, skip))
}

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(named) => &named.named,
            Fields::Unit => {
                return Ok(quote! {
                    impl #impl_generics ::bootkit::binding::Bind for #ident #ty_generics #where_clause {
                        fn bind(
                            &mut self,
                            value: &::bootkit::Value,
                            path: &mut ::bootkit::binding::FieldPath,
                        ) -> ::core::result::Result<(), ::bootkit::binding::BindError> {
                            ::bootkit::binding::bind_record(value, path, |_, _, _| ::core::option::Option::None)
                        }
                    }
                });
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Bind cannot be derived for tuple structs; config records need named fields",
                ));
            }
        },
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(
                ident,
                "Bind cannot be derived for enums; bind a String and convert it, or use bootkit::Value",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(ident, "Bind cannot be derived for unions"));
        }
    };

    let mut bound: Vec<BoundField> = Vec::new();
    let mut seen: HashMap<String, Ident> = HashMap::new();
    for field in fields {
        let Some(field_ident) = field.ident.clone() else {
            continue;
        };
        let (rename, skip) = parse_field_attrs(field)?;
        if skip {
            continue;
        }
        let key = match &rename {
            Some(lit) => {
                let key = to_field_name(&lit.value());
                if key.is_empty() {
                    return Err(syn::Error::new_spanned(lit, "rename must contain at least one letter or digit"));
                }
                key
            }
            None => to_field_name(&unraw(&field_ident)),
        };
        if let Some(other) = seen.get(&key) {
            return Err(syn::Error::new_spanned(
                &field_ident,
                format!("config key `{key}` is already bound by field `{other}`"),
            ));
        }
        seen.insert(key.clone(), field_ident.clone());
        bound.push(BoundField {
            ident: field_ident,
            key,
        });
    }

    let matcher = if bound.is_empty() {
        quote! { |_, _, _| ::core::option::Option::None }
    } else {
        let keys = bound.iter().map(|f| LitStr::new(&f.key, f.ident.span()));
        let idents = bound.iter().map(|f| &f.ident);
        quote! {
            |__name, __value, __path| match __name {
                #(
                    #keys => ::core::option::Option::Some(
                        ::bootkit::binding::Bind::bind(&mut self.#idents, __value, __path)
                    ),
                )*
                _ => ::core::option::Option::None,
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::bootkit::binding::Bind for #ident #ty_generics #where_clause {
            fn bind(
                &mut self,
                value: &::bootkit::Value,
                path: &mut ::bootkit::binding::FieldPath,
            ) -> ::core::result::Result<(), ::bootkit::binding::BindError> {
                ::bootkit::binding::bind_record(value, path, #matcher)
            }
        }
    })
}
