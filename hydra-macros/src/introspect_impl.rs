use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, Fields, GenericArgument, Ident, Meta, PathArguments, Type,
};

/// 类型级选项：`#[introspect(...)]`
struct TypeOptions {
    markers: Vec<Expr>,
    constructor: bool,
}

pub(crate) fn derive_introspect_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let options = type_options(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    name,
                    "#[derive(Introspect)] requires named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "#[derive(Introspect)] only supports structs",
            ))
        }
    };

    let mut params: Vec<(&Ident, &Type)> = Vec::new();
    let mut setters: Vec<&Ident> = Vec::new();
    let mut defaults: Vec<&Ident> = Vec::new();
    let mut properties: Vec<TokenStream> = Vec::new();

    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let property_name = ident.to_string();

        if field.attrs.iter().any(|attr| attr.path().is_ident("inject")) {
            if let Some(inner) = generic_argument(&field.ty, "Arc") {
                params.push((ident, inner));
            } else if let Some(inner) =
                generic_argument(&field.ty, "Option").and_then(|ty| generic_argument(ty, "Arc"))
            {
                setters.push(ident);
                properties.push(quote! {
                    .property(
                        ::hydra_core::PropertyDescriptor::writable(
                            #property_name,
                            |bean: &mut Self, value: ::std::sync::Arc<#inner>| {
                                bean.#ident = ::std::option::Option::Some(value);
                            },
                        )
                        .inject()
                    )
                });
            } else {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "#[inject] fields must be `Arc<T>` or `Option<Arc<T>>`",
                ));
            }
        } else {
            defaults.push(ident);
        }

        if let Some(markers) = property_markers(&field.attrs)? {
            let ty = &field.ty;
            properties.push(quote! {
                .property(
                    ::hydra_core::PropertyDescriptor::read_only::<#ty, _>(#property_name, |bean: &Self| {
                        ::hydra_core::__private::serde_json::to_value(&bean.#ident)
                            .unwrap_or(::hydra_core::__private::serde_json::Value::Null)
                    })
                    #(.marker(#markers))*
                )
            });
        }
    }

    let constructor = if options.constructor {
        let param_idents = params.iter().map(|(ident, _)| ident);
        let param_types: Vec<&Type> = params.iter().map(|(_, ty)| *ty).collect();
        let (args, inject) = if params.is_empty() {
            (quote! { _ }, quote! {})
        } else {
            (quote! { args }, quote! { .inject() })
        };
        quote! {
            .constructor(
                ::hydra_core::ConstructorDescriptor::new(|#args| {
                    ::std::result::Result::Ok(Self {
                        #(#param_idents: args.next::<#param_types>()?,)*
                        #(#setters: ::std::option::Option::None,)*
                        #(#defaults: ::std::default::Default::default(),)*
                    })
                })
                #(.param::<#param_types>())*
                #inject
            )
        }
    } else {
        quote! {}
    };

    let type_markers = &options.markers;

    Ok(quote! {
        impl #impl_generics ::hydra_core::Introspect for #name #ty_generics #where_clause {
            fn describe() -> ::hydra_core::TypeDescription<Self> {
                ::hydra_core::TypeDescription::new()
                    #(.marker(#type_markers))*
                    #constructor
                    #(#properties)*
            }
        }
    })
}

fn type_options(attrs: &[Attribute]) -> syn::Result<TypeOptions> {
    let mut options = TypeOptions {
        markers: Vec::new(),
        constructor: true,
    };

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("introspect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("marker") {
                options.markers.push(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("no_constructor") {
                options.constructor = false;
                Ok(())
            } else {
                Err(meta.error("expected `marker = ...` or `no_constructor`"))
            }
        })?;
    }

    Ok(options)
}

/// `#[property]` 或 `#[property(marker = ...)]`；没有该属性时返回 `None`
fn property_markers(attrs: &[Attribute]) -> syn::Result<Option<Vec<Expr>>> {
    let mut found: Option<Vec<Expr>> = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("property")) {
        let markers = found.get_or_insert_with(Vec::new);
        if matches!(attr.meta, Meta::List(_)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("marker") {
                    markers.push(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `marker = ...`"))
                }
            })?;
        }
    }

    Ok(found)
}

/// 从 `Wrapper<T>` 中提取 `T`
fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
