//! PanelField derive macro implementation
//!
//! Generates the field metadata for unit enums that name the canonical
//! columns of a panel record.

use darling::{ast, FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::utils;

/// Receiver for the enum that derives `PanelField`
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(panel), supports(enum_unit))]
struct PanelFieldReceiver {
    /// The enum identifier
    ident: syn::Ident,
    /// The enum variants
    data: ast::Data<PanelVariantReceiver, ()>,
}

/// Receiver for a single variant
#[derive(Debug, FromVariant)]
#[darling(attributes(panel))]
struct PanelVariantReceiver {
    /// The variant identifier
    ident: syn::Ident,
    /// Canonical column name
    column: String,
    /// Human readable label, defaults to the column name
    #[darling(default)]
    label: Option<String>,
    /// Alternative header spellings accepted during reconciliation
    #[darling(multiple, rename = "alias")]
    aliases: Vec<String>,
}

/// Process the PanelField derive macro
pub fn process_derive_panel_field(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let receiver = match PanelFieldReceiver::from_derive_input(&input) {
        Ok(receiver) => receiver,
        Err(err) => return err.write_errors().into(),
    };

    let ast::Data::Enum(variants) = &receiver.data else {
        unreachable!("Darling ensures this is an enum")
    };

    if variants.is_empty() {
        return syn::Error::new(receiver.ident.span(), "PanelField requires at least one variant")
            .to_compile_error()
            .into();
    }

    TokenStream::from(generate_panel_field_impl(&receiver.ident, variants))
}

fn generate_panel_field_impl(
    enum_name: &syn::Ident,
    variants: &[PanelVariantReceiver],
) -> proc_macro2::TokenStream {
    let count = variants.len();
    let idents: Vec<_> = variants.iter().map(|v| &v.ident).collect();
    let columns: Vec<_> = variants.iter().map(|v| v.column.clone()).collect();
    let labels: Vec<_> = variants
        .iter()
        .map(|v| v.label.clone().unwrap_or_else(|| v.column.clone()))
        .collect();
    let alias_lists: Vec<_> = variants
        .iter()
        .map(|v| {
            let aliases = utils::alias_list(&v.column, &v.aliases);
            quote! { &[#(#aliases),*] }
        })
        .collect();
    let indices: Vec<_> = (0..count).collect();
    let enum_name_str = enum_name.to_string();

    quote! {
        impl #enum_name {
            /// Every variant in declaration order
            pub const ALL: [Self; #count] = [#(Self::#idents),*];

            /// Number of variants
            pub const COUNT: usize = #count;
        }

        impl ::labsynth::models::PanelField for #enum_name {
            fn all() -> &'static [Self] {
                &Self::ALL
            }

            fn column(self) -> &'static str {
                match self {
                    #(Self::#idents => #columns,)*
                }
            }

            fn label(self) -> &'static str {
                match self {
                    #(Self::#idents => #labels,)*
                }
            }

            fn aliases(self) -> &'static [&'static str] {
                match self {
                    #(Self::#idents => #alias_lists,)*
                }
            }

            fn index(self) -> usize {
                match self {
                    #(Self::#idents => #indices,)*
                }
            }
        }

        impl ::std::fmt::Display for #enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(<Self as ::labsynth::models::PanelField>::column(*self))
            }
        }

        impl ::std::str::FromStr for #enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                <Self as ::labsynth::models::PanelField>::from_header(s)
                    .ok_or_else(|| format!("unknown {} '{}'", #enum_name_str, s))
            }
        }
    }
}
