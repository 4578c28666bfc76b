use proc_macro::TokenStream;
use proc_macro_error::{abort, proc_macro_error};
use quote::quote;
use syn::{ext::IdentExt, parse_macro_input, Data, DeriveInput, Fields, LitStr, Visibility};

const EXPORTS: &str = "exports";
const SKIP: &str = "skip";
const RENAME: &str = "rename";
const PRIVATE_PREFIX: char = '_';

/// Per-field options from `#[exports(...)]`.
#[derive(Default)]
struct FieldOptions {
    skip: bool,
    rename: Option<String>,
}

fn field_options(attrs: &[syn::Attribute]) -> FieldOptions {
    let mut options = FieldOptions::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident(EXPORTS)) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(SKIP) {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident(RENAME) {
                let name: LitStr = meta.value()?.parse()?;
                options.rename = Some(name.value());
                Ok(())
            } else {
                Err(meta.error("Only 'skip' and 'rename' are supported in #[exports]"))
            }
        });
        if let Err(e) = parsed {
            abort!(e.span(), "Failed to parse exports attribute: {}", e);
        }
    }
    options
}

/// Derive `stsm::registry::Exports` for a struct with named fields.
///
/// Every `pub` field becomes an instance member holding a clone of the field,
/// named after the field. Fields starting with `_` or marked
/// `#[exports(skip)]` are left out; `#[exports(rename = "...")]` changes the
/// member name.
#[proc_macro_derive(Exports, attributes(exports))]
#[proc_macro_error]
pub fn derive_exports(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => abort!(input.ident, "Exports can only be derived for structs with named fields"),
        },
        _ => abort!(input.ident, "Exports can only be derived for structs"),
    };

    let inserts = fields.iter().filter_map(|field| {
        let ident = field.ident.as_ref()?;
        if !matches!(field.vis, Visibility::Public(_)) {
            return None;
        }
        let options = field_options(&field.attrs);
        let member = options.rename.unwrap_or_else(|| ident.unraw().to_string());
        if options.skip || member.starts_with(PRIVATE_PREFIX) {
            return None;
        }
        Some(quote! {
            namespace.insert(
                #member,
                ::stsm::registry::Symbol::instance(::std::clone::Clone::clone(&self.#ident)),
            );
        })
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let expanded = quote! {
        impl #impl_generics ::stsm::registry::Exports for #name #ty_generics #where_clause {
            fn exports(&self) -> ::stsm::registry::Namespace {
                let mut namespace = ::stsm::registry::Namespace::new();
                #(#inserts)*
                namespace
            }
        }
    };

    TokenStream::from(expanded)
}
