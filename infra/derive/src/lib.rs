#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the Faceclaimer crates.
//!
//! [`macro@fc_error`] turns a plain enum into a context-carrying `thiserror` error. The
//! examples are `ignore`d because they need the consuming crates to compile.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for defining domain-specific error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Context Access**: Generates `context_note(&self) -> Option<&str>` to read the
///   context attached to a variant (used when errors are logged at the HTTP boundary).
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` if an
///   `Internal` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants only.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants with a `source` field must also carry `context`.
///
/// # Example
///
/// ```rust,ignore
/// use fc_derive::fc_error;
/// use std::borrow::Cow;
///
/// #[fc_error]
/// pub enum StorageError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read_manifest(path: &Path) -> Result<Vec<u8>, StorageError> {
///     std::fs::read(path).context("Reading manifest")
/// }
/// ```
#[proc_macro_attribute]
pub fn fc_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
