//! Proc macros for the strata-config crate.
//!
//! This crate provides the `#[derive(Extension)]` macro

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Expr, Fields, GenericArgument, Lit, PathArguments, Type,
    ext::IdentExt, meta::ParseNestedMeta, parse_macro_input, spanned::Spanned,
};

/// Extension options parsed from the container `#[extension(...)]` attribute.
struct ExtensionOptions {
    name: Option<String>,
}

impl ExtensionOptions {
    fn from_attrs(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut name = None;

        for attr in attrs {
            if attr.path().is_ident("extension") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        name = Some(string_value(&meta, "name")?);
                    } else {
                        return Err(unknown_attribute(&meta));
                    }
                    Ok(())
                })?;
            }
        }

        Ok(Self { name })
    }
}

/// Field options parsed from a field's `#[extension(...)]` attribute.
#[derive(Default)]
struct FieldOptions {
    default: Option<String>,
    env: Option<String>,
}

impl FieldOptions {
    fn from_attrs(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut options = Self::default();

        for attr in attrs {
            if attr.path().is_ident("extension") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("default") {
                        options.default = Some(string_value(&meta, "default")?);
                    } else if meta.path.is_ident("env") {
                        options.env = Some(string_value(&meta, "env")?);
                    } else {
                        return Err(unknown_attribute(&meta));
                    }
                    Ok(())
                })?;
            }
        }

        Ok(options)
    }
}

fn string_value(meta: &ParseNestedMeta, what: &str) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(expr_lit) = value {
        if let Lit::Str(lit_str) = expr_lit.lit {
            Ok(lit_str.value())
        } else {
            Err(syn::Error::new(
                expr_lit.span(),
                format!("{what} must be a string"),
            ))
        }
    } else {
        Err(syn::Error::new(
            value.span(),
            format!("{what} must be a literal"),
        ))
    }
}

fn unknown_attribute(meta: &ParseNestedMeta) -> syn::Error {
    syn::Error::new(
        meta.path.span(),
        format!("unknown extension attribute: {:?}", meta.path.get_ident()),
    )
}

/// Maps a field type to its `FieldKind` and whether it is optional.
///
/// Integer fields carry the range of their declared type.
fn field_kind(ty: &Type) -> syn::Result<(proc_macro2::TokenStream, bool)> {
    let unsupported = || {
        syn::Error::new(
            ty.span(),
            "unsupported extension field type, expected String, bool, an integer, \
             f32/f64, PathBuf, or Option of one of those",
        )
    };

    let Type::Path(type_path) = ty else {
        return Err(unsupported());
    };
    let segment = type_path.path.segments.last().ok_or_else(unsupported)?;

    if segment.ident == "Option" {
        let PathArguments::AngleBracketed(args) = &segment.arguments else {
            return Err(unsupported());
        };
        let Some(GenericArgument::Type(inner)) = args.args.first() else {
            return Err(unsupported());
        };
        let (kind, nested_option) = field_kind(inner)?;
        if nested_option {
            return Err(unsupported());
        }
        return Ok((kind, true));
    }

    let ident = &segment.ident;
    let kind = match ident.to_string().as_str() {
        "String" => quote!(String),
        "bool" => quote!(Bool),
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
            quote!(integer(
                ::core::primitive::#ident::MIN as i128,
                ::core::primitive::#ident::MAX as i128
            ))
        }
        "f32" | "f64" => quote!(Float),
        "PathBuf" => quote!(Path),
        _ => return Err(unsupported()),
    };

    Ok((quote!(::strata_config::FieldKind::#kind), false))
}

/// Derive macro for the `Extension` trait.
///
/// This macro automatically:
/// - Implements the `Extension` trait with the extension name
/// - Describes every named field as a `FieldSpec`
///
/// `Option<T>` fields are optional; other fields are required unless they
/// carry a default. Registration stays explicit, either through
/// `Resolver::register` or `submit_extension!`.
///
/// # Example
///
/// ```rust,ignore
/// use serde::Deserialize;
/// use strata_config::Extension;
///
/// #[derive(Debug, Deserialize, Extension)]
/// #[extension(name = "server")]
/// struct Server {
///     #[extension(env = "SERVER_HOST")]
///     host: String,
///     #[extension(default = "8080")]
///     port: u16,
///     debug: Option<bool>,
/// }
/// ```
///
/// This expands to roughly:
///
/// ```rust,ignore
/// impl strata_config::Extension for Server {
///     const NAME: &'static str = "server";
///
///     fn fields() -> Vec<strata_config::FieldSpec> {
///         vec![
///             FieldSpec::new("host", FieldKind::String).env_key("SERVER_HOST"),
///             FieldSpec::new("port", FieldKind::integer(0, 65535)).default_value("8080"),
///             FieldSpec::new("debug", FieldKind::Bool).optional(),
///         ]
///     }
/// }
/// ```
#[proc_macro_derive(Extension, attributes(extension))]
pub fn derive_extension(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_extension_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_extension_impl(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let options = ExtensionOptions::from_attrs(&input.attrs)?;
    let ident = &input.ident;
    let name = options
        .name
        .unwrap_or_else(|| ident.to_string().to_lowercase());

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "Extension can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new(
            data.fields.span(),
            "Extension requires named fields",
        ));
    };

    let mut specs = Vec::with_capacity(named.named.len());
    for field in &named.named {
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let field_name = field_ident.unraw().to_string();
        let field_options = FieldOptions::from_attrs(&field.attrs)?;
        let (kind, optional) = field_kind(&field.ty)?;

        let mut spec = quote!(::strata_config::FieldSpec::new(#field_name, #kind));
        if optional {
            spec = quote!(#spec.optional());
        }
        if let Some(default) = &field_options.default {
            spec = quote!(#spec.default_value(#default));
        }
        if let Some(env) = &field_options.env {
            spec = quote!(#spec.env_key(#env));
        }
        specs.push(spec);
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::strata_config::Extension for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;

            fn fields() -> ::std::vec::Vec<::strata_config::FieldSpec> {
                ::std::vec![#(#specs),*]
            }
        }
    })
}
