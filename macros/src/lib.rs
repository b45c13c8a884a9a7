//! Procedural macros for the labsynth crate
//!
//! This crate provides the derive macro used to describe the canonical
//! columns of a screening panel, so the column names, header aliases and
//! positional indices live next to the enum variants they belong to.

use proc_macro::TokenStream;

mod panel_field;
mod utils;

/// Derive macro for canonical panel field enums
///
/// Implements `labsynth::models::PanelField` together with `Display`,
/// `FromStr` and the `ALL` / `COUNT` associated constants.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, PanelField)]
/// enum NumericField {
///     #[panel(column = "hb", label = "Hemoglobin (g/dL)", alias = "hgb", alias = "hemoglobin")]
///     Hb,
///
///     #[panel(column = "ferritin", label = "Ferritin (ng/mL)", alias = "serum_ferritin")]
///     Ferritin,
/// }
/// ```
#[proc_macro_derive(PanelField, attributes(panel))]
pub fn derive_panel_field(input: TokenStream) -> TokenStream {
    panel_field::process_derive_panel_field(input)
}
