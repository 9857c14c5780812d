//! Derive macro for the `stackerr` crate.

mod struct_;

use syn::{
    parse::Parse,
    parse_macro_input,
    spanned::Spanned,
    visit::{self, Visit},
    Error, Generics, Ident, Item, LitStr, Token, Type, TypePath,
};

const UNKNOWN_ARG: &str =
    "unknown fields argument. valid arguments are `skip`, `display`, `debug` or `rename = \"...\"`.";

#[derive(PartialEq, Eq)]
enum FieldsAttrArg {
    Skip,
    Display,
    Debug,
    Rename(LitStr),
}

impl Parse for FieldsAttrArg {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let ident: Ident = input
            .parse()
            .map_err(|e| Error::new(e.span(), UNKNOWN_ARG))?;

        if ident == "skip" {
            return Ok(Self::Skip);
        }

        if ident == "display" {
            return Ok(Self::Display);
        }

        if ident == "debug" {
            return Ok(Self::Debug);
        }

        if ident == "rename" {
            input.parse::<Token![=]>()?;
            return Ok(Self::Rename(input.parse()?));
        }

        Err(Error::new(ident.span(), UNKNOWN_ARG))
    }
}

fn is_required_generic_for_type(ty: &Type, generic: &Ident) -> bool {
    struct PathVisitor<'g> {
        generic: &'g Ident,
        required: bool,
    }

    impl<'ast> Visit<'ast> for PathVisitor<'_> {
        fn visit_type_path(&mut self, node: &'ast TypePath) {
            if node.qself.is_none() {
                if let Some(first_segment) = node.path.segments.first() {
                    if first_segment.ident == *self.generic {
                        self.required = true;
                        return;
                    }
                }
            }

            visit::visit_type_path(self, node);
        }
    }

    let mut path_visitor = PathVisitor {
        generic,
        required: false,
    };

    path_visitor.visit_type(ty);
    path_visitor.required
}

/// Whether `ty` mentions any of the type parameters in `generics`.
fn mentions_type_params(generics: &Generics, ty: &Type) -> bool {
    generics
        .type_params()
        .any(|param| is_required_generic_for_type(ty, &param.ident))
}

/// Implements `stackerr::IntoFields` for a struct, turning each of its fields into an entry of
/// the field map.
///
/// Named fields are keyed by their name and tuple fields by their index. Every field must
/// convert into `stackerr::Value` unless it is marked with one of:
///
/// - `#[fields(skip)]`: leave the field out.
/// - `#[fields(rename = "key")]`: use `key` instead of the field name.
/// - `#[fields(display)]`: store the `Display` rendering of the field.
/// - `#[fields(debug)]`: store the `Debug` rendering of the field.
#[proc_macro_derive(Fields, attributes(fields))]
pub fn derive_fields(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input: Item = parse_macro_input!(input);

    let result = match input {
        Item::Struct(s) => struct_::derive_fields_struct(&s),
        _ => Err(syn::Error::new(
            input.span(),
            "`Fields` can only be derived for structs",
        )),
    };

    match result {
        Ok(ok) => ok.into(),
        Err(e) => e.into_compile_error().into(),
    }
}
