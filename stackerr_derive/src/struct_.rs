use crate::{mentions_type_params, FieldsAttrArg};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    ext::IdentExt, parse_quote, punctuated::Punctuated, spanned::Spanned, Error, Field, Index,
    ItemStruct, LitStr, Member, Token,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Into,
    Display,
    Debug,
}

struct FieldEntry<'f> {
    field: &'f Field,
    member: Member,
    key: String,
    conversion: Conversion,
}

/// Reads the `#[fields(...)]` attributes of a field. Returns `None` if the field is skipped.
fn field_entry(index: usize, field: &Field) -> Result<Option<FieldEntry<'_>>, Error> {
    let mut rename: Option<LitStr> = None;
    let mut conversion = Conversion::Into;

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("fields")) {
        let args =
            attr.parse_args_with(Punctuated::<FieldsAttrArg, Token![,]>::parse_terminated)?;

        for arg in args {
            match arg {
                FieldsAttrArg::Skip => return Ok(None),
                FieldsAttrArg::Rename(lit) => rename = Some(lit),
                FieldsAttrArg::Display | FieldsAttrArg::Debug => {
                    if conversion != Conversion::Into {
                        return Err(Error::new(
                            attr.span(),
                            "`display` and `debug` can't be used together",
                        ));
                    }

                    conversion = if arg == FieldsAttrArg::Display {
                        Conversion::Display
                    } else {
                        Conversion::Debug
                    };
                }
            }
        }
    }

    let (member, default_key) = match &field.ident {
        Some(ident) => (Member::Named(ident.clone()), ident.unraw().to_string()),
        None => (
            Member::Unnamed(Index {
                index: index as u32,
                span: field.span(),
            }),
            index.to_string(),
        ),
    };

    Ok(Some(FieldEntry {
        field,
        member,
        key: rename.map(|lit| lit.value()).unwrap_or(default_key),
        conversion,
    }))
}

pub fn derive_fields_struct(struct_: &ItemStruct) -> Result<TokenStream, Error> {
    let entries = struct_
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| field_entry(i, f))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

    let mut generics = struct_.generics.clone();
    let where_clause = generics.make_where_clause();
    for entry in &entries {
        let ty = &entry.field.ty;
        if !mentions_type_params(&struct_.generics, ty) {
            continue;
        }

        where_clause.predicates.push(match entry.conversion {
            Conversion::Into => parse_quote!(#ty: ::core::convert::Into<::stackerr::Value>),
            Conversion::Display => parse_quote!(#ty: ::core::fmt::Display),
            Conversion::Debug => parse_quote!(#ty: ::core::fmt::Debug),
        });
    }

    let inserts = entries.iter().map(|entry| {
        let FieldEntry {
            member, key, conversion, ..
        } = entry;

        let value = match conversion {
            Conversion::Into => quote! {
                ::core::convert::Into::<::stackerr::Value>::into(self.#member)
            },
            Conversion::Display => quote! {
                ::stackerr::Value::String(::std::string::ToString::to_string(&self.#member))
            },
            Conversion::Debug => quote! {
                ::stackerr::Value::String(::std::format!("{:?}", &self.#member))
            },
        };

        quote! {
            fields.insert(::std::string::String::from(#key), #value);
        }
    });

    let ty_ident = &struct_.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::stackerr::IntoFields for #ty_ident #ty_generics #where_clause {
            #[allow(unused_mut)]
            fn into_fields(self) -> ::stackerr::Fields {
                let mut fields = ::stackerr::Fields::new();
                #(#inserts)*
                fields
            }
        }
    })
}
