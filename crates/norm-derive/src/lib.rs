//! Derive macro for entity metadata.
//!
//! This crate provides `#[derive(Entity)]`, which turns a plain struct into a
//! record type that `norm` can map onto a collection.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, LitBool, Meta, Type, Visibility,
    parse_macro_input,
};

/// Derives `norm_core::Entity` for a struct with named fields.
///
/// # Attributes
///
/// - `#[collection(name = "Posts")]` - Collection (table) name (optional,
///   defaults to the struct name)
///
/// # Field Attributes
///
/// - `#[column]` - Maps the field to a column named after the field
/// - `#[column(name = "column_name")]` - Overrides the column name
/// - `#[column(nullable)]` - Marks the column nullable (implied by `Option<T>`)
/// - `#[primary_key]` - Marks the column as auto-increment primary key
/// - `#[primary_key(auto_increment = false)]` - Primary key assigned by the caller
/// - `#[reference(column = "author_id")]` - Records a reference to another
///   entity; never emitted as a column
///
/// Fields without attributes are ignored.
///
/// # Generated Items
///
/// For a struct `Post`, this macro generates:
///
/// - `impl Entity for Post`
/// - `PostColumns` - A module with one column type per column (`Id`, `Title`, ...)
/// - Column accessors on `Post` (`Post::id()`, `Post::title()`, ...) for
///   building predicates
/// - `PartialEq` and `Hash` comparing column values, timestamps at second
///   granularity
///
/// The generated code refers to `::norm_core`, which must be a dependency of
/// the deriving crate.
#[proc_macro_derive(Entity, attributes(collection, column, primary_key, reference))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let vis = &input.vis;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity derive does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Entity derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Entity derive only supports structs",
            ));
        }
    };

    let collection_name = get_collection_name(&input.attrs)?;

    let mut columns: Vec<ColumnInfo> = Vec::new();
    let mut references: Vec<(Ident, String)> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_field_attrs(&field.attrs)?;

        if let Some(column) = attrs.reference {
            references.push((field_name.clone(), column));
        }

        let Some(column_name) = attrs.column else {
            if attrs.primary_key.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "#[primary_key] requires #[column] on the same field",
                ));
            }
            continue;
        };

        columns.push(ColumnInfo {
            column_name: column_name.unwrap_or_else(|| field_name.to_string()),
            field_name,
            field_type: field.ty.clone(),
            nullable: attrs.nullable,
            primary_key: attrs.primary_key,
        });
    }

    if columns.iter().filter(|c| c.primary_key.is_some()).count() > 1 {
        return Err(syn::Error::new_spanned(
            input,
            "Entity derive supports at most one #[primary_key] field",
        ));
    }

    let column_descriptors: Vec<TokenStream2> = columns
        .iter()
        .map(|info| {
            let field = info.field_name.to_string();
            let column_name = &info.column_name;
            let field_type = &info.field_type;
            let nullable = info.nullable;
            let primary_key = info
                .primary_key
                .map(|auto_increment| quote! { .primary_key(#auto_increment) });

            quote! {
                ::norm_core::schema::ColumnDescriptor::new(
                    #field,
                    #column_name,
                    <#field_type as ::norm_core::schema::FieldValue>::SEMANTIC_TYPE,
                )
                .nullable(<#field_type as ::norm_core::schema::FieldValue>::NULLABLE || #nullable)
                #primary_key
            }
        })
        .collect();

    let reference_descriptors: Vec<TokenStream2> = references
        .iter()
        .map(|(field, column)| {
            let field = field.to_string();
            quote! {
                ::norm_core::schema::ReferenceDescriptor {
                    field: #field,
                    column: #column,
                }
            }
        })
        .collect();

    let field_names: Vec<&Ident> = columns.iter().map(|c| &c.field_name).collect();
    let indices: Vec<usize> = (0..columns.len()).collect();

    let type_name = struct_name.to_string();
    let collection_token = match &collection_name {
        Some(name) => quote! { Some(#name) },
        None => quote! { None },
    };

    let columns_mod = generate_columns_module(struct_name, vis, &columns);

    let expanded = quote! {
        impl ::norm_core::schema::Entity for #struct_name {
            fn describe() -> ::norm_core::schema::EntityDescriptor {
                ::norm_core::schema::EntityDescriptor::new(
                    #type_name,
                    #collection_token,
                    vec![#(#column_descriptors),*],
                    vec![#(#reference_descriptors),*],
                )
            }

            fn column_values(&self) -> Vec<::norm_core::SqlValue> {
                vec![#(::norm_core::schema::FieldValue::to_value(&self.#field_names)),*]
            }

            fn assign(
                &mut self,
                index: usize,
                value: ::norm_core::SqlValue,
            ) -> ::core::result::Result<(), ::norm_core::ValueError> {
                match index {
                    #(#indices => {
                        self.#field_names = ::norm_core::schema::FieldValue::from_value(value)?;
                    })*
                    other => return Err(::norm_core::ValueError::UnknownColumn(other)),
                }
                Ok(())
            }
        }

        impl ::core::cmp::PartialEq for #struct_name {
            fn eq(&self, other: &Self) -> bool {
                ::norm_core::schema::records_equal(self, other)
            }
        }

        impl ::core::hash::Hash for #struct_name {
            fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                ::norm_core::schema::hash_record(self, state);
            }
        }

        #columns_mod
    };

    Ok(expanded)
}

fn generate_columns_module(
    struct_name: &Ident,
    vis: &Visibility,
    columns: &[ColumnInfo],
) -> TokenStream2 {
    let columns_mod_name = format_ident!("{}Columns", struct_name);

    let column_type_names: Vec<Ident> = columns
        .iter()
        .map(|c| format_ident!("{}", to_pascal_case(&c.field_name.to_string())))
        .collect();

    let column_structs: Vec<TokenStream2> = columns
        .iter()
        .zip(column_type_names.iter())
        .map(|(info, type_name)| {
            let field = info.field_name.to_string();
            let field_type = &info.field_type;

            quote! {
                /// Column handle for building predicates.
                #[derive(Debug, Clone, Copy)]
                pub struct #type_name;

                impl ::norm_core::Column for #type_name {
                    type Entity = super::#struct_name;
                    type Value = #field_type;

                    const FIELD: &'static str = #field;
                }
            }
        })
        .collect();

    let column_accessors: Vec<TokenStream2> = columns
        .iter()
        .zip(column_type_names.iter())
        .map(|(info, type_name)| {
            let method_name = &info.field_name;
            quote! {
                /// Returns the column handle for building predicates.
                #[inline]
                #vis const fn #method_name() -> #columns_mod_name::#type_name {
                    #columns_mod_name::#type_name
                }
            }
        })
        .collect();

    let doc = format!("Column handles for `{struct_name}`.");

    quote! {
        #[doc = #doc]
        #[allow(non_snake_case, unused_imports)]
        #vis mod #columns_mod_name {
            use super::*;

            #(#column_structs)*
        }

        impl #struct_name {
            #(#column_accessors)*
        }
    }
}

struct ColumnInfo {
    field_name: Ident,
    field_type: Type,
    column_name: String,
    nullable: bool,
    /// `Some(auto_increment)` for the primary key.
    primary_key: Option<bool>,
}

#[derive(Default)]
struct FieldAttrs {
    /// `Some(name override)` when the field carries `#[column]`.
    column: Option<Option<String>>,
    nullable: bool,
    primary_key: Option<bool>,
    reference: Option<String>,
}

fn get_collection_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    for attr in attrs {
        if attr.path().is_ident("collection") {
            let mut name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    name = Some(parse_str_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported collection attribute"))
                }
            })?;
            if name.is_some() {
                return Ok(name);
            }
        }
    }
    Ok(None)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            let mut name = None;
            // Handle empty attribute like #[column]
            if !matches!(attr.meta, Meta::Path(_)) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        name = Some(parse_str_value(&meta)?);
                    } else if meta.path.is_ident("nullable") {
                        result.nullable = true;
                    } else {
                        return Err(meta.error("unsupported column attribute"));
                    }
                    Ok(())
                })?;
            }
            result.column = Some(name);
        } else if attr.path().is_ident("primary_key") {
            let mut auto_increment = true;
            if !matches!(attr.meta, Meta::Path(_)) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("auto_increment") {
                        let value: LitBool = meta.value()?.parse()?;
                        auto_increment = value.value;
                        Ok(())
                    } else {
                        Err(meta.error("unsupported primary_key attribute"))
                    }
                })?;
            }
            result.primary_key = Some(auto_increment);
        } else if attr.path().is_ident("reference") {
            let mut column = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("column") {
                    column = Some(parse_str_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported reference attribute"))
                }
            })?;
            match column {
                Some(column) => result.reference = Some(column),
                None => {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "#[reference] requires column = \"...\"",
                    ))
                }
            }
        }
    }

    Ok(result)
}

fn parse_str_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(lit) = &value {
        if let Lit::Str(s) = &lit.lit {
            return Ok(s.value());
        }
    }
    Err(syn::Error::new_spanned(value, "expected a string literal"))
}

fn to_pascal_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = true;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}
