//! Proc-macro crate for deriving Job implementations.
//!
//! Provides the `#[job]` attribute macro.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, FnArg, ItemFn, LitStr, Pat, ReturnType, Type};

/// Derive a Job implementation from a plain function.
///
/// The first parameter receives the session and is not part of the job's
/// arguments. Every other parameter becomes a field of the generated
/// `<Name>Args` struct, so its type must implement `serde::Deserialize` and
/// `schemars::JsonSchema`. Doc comments on the function become the job's
/// documentation; doc comments on parameters become their descriptions.
/// `#[arg(default = expr)]` makes a parameter optional (its type must then
/// also implement `serde::Serialize`).
///
/// Returning `Result<Output, Error>` makes the job fallible. Any other return
/// type is treated as infallible output.
///
/// # Example
///
/// ```ignore
/// /// Checks if the first number is lower than the second
/// #[job]
/// fn first_condition(
///     session: &mut Session,
///     /// Number expected to be low
///     #[arg(default = 10)]
///     lower_number: i64,
///     #[arg(default = 20)]
///     greater_number: i64,
/// ) -> bool {
///     session.insert("lower_number", lower_number);
///     lower_number < greater_number
/// }
///
/// // Generates `FirstConditionArgs` and the unit struct `FirstConditionJob`.
/// ```
#[proc_macro_attribute]
pub fn job(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = syn::parse_macro_input!(attr as JobArgs);
    let func = syn::parse_macro_input!(item as ItemFn);

    match expand_job(args, func) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

// Parse the attribute args: name = "..." (optional)
struct JobArgs {
    name: Option<String>,
}

impl syn::parse::Parse for JobArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut name = None;

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            let _: syn::Token![=] = input.parse()?;
            let value: LitStr = input.parse()?;

            match ident.to_string().as_str() {
                "name" => name = Some(value.value()),
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {other}"),
                    ));
                }
            }

            if !input.is_empty() {
                let _: syn::Token![,] = input.parse()?;
            }
        }

        Ok(JobArgs { name })
    }
}

fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().to_string() + &chars.collect::<String>(),
            }
        })
        .collect()
}

/// Join `#[doc = "..."]` lines the way rustdoc renders them.
fn collect_doc(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').unwrap_or(&line).to_string())
        .collect();

    let doc = lines.join("\n").trim().to_string();
    if doc.is_empty() { None } else { Some(doc) }
}

/// Pull `#[arg(default = ...)]` off a parameter, returning the default expression.
fn take_default(attrs: &mut Vec<Attribute>) -> syn::Result<Option<syn::Expr>> {
    let mut default = None;
    let mut kept = Vec::with_capacity(attrs.len());

    for attr in attrs.drain(..) {
        if !attr.path().is_ident("arg") {
            kept.push(attr);
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                default = Some(meta.value()?.parse::<syn::Expr>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported arg option, expected `default = ...`"))
            }
        })?;
    }

    *attrs = kept;
    Ok(default)
}

fn expand_job(args: JobArgs, mut func: ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    if func.sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            func.sig.asyncness,
            "jobs run synchronously; remove `async`",
        ));
    }
    if !func.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig.generics,
            "generic jobs are not supported",
        ));
    }

    let func_name = func.sig.ident.clone();
    let vis = func.vis.clone();
    let pascal = to_pascal_case(&func_name.to_string());
    let job_struct = format_ident!("{}Job", pascal);
    let args_struct = format_ident!("{}Args", pascal);

    let job_name = args.name.unwrap_or_else(|| func_name.to_string());
    let doc = match collect_doc(&func.attrs) {
        Some(doc) => quote! { ::core::option::Option::Some(#doc) },
        None => quote! { ::core::option::Option::None },
    };

    if func.sig.inputs.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig,
            "the first parameter must receive the session (`session: &mut Session`)",
        ));
    }

    // Build Args struct fields from every parameter after the session
    let mut field_names = Vec::new();
    let mut field_defs = Vec::new();
    let mut default_fns = Vec::new();

    for (index, param) in func.sig.inputs.iter_mut().enumerate() {
        let pat_type = match param {
            FnArg::Typed(pat_type) => pat_type,
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "self parameter not supported",
                ));
            }
        };

        let default = take_default(&mut pat_type.attrs)?;
        if index == 0 {
            if let Some(expr) = default {
                return Err(syn::Error::new_spanned(
                    expr,
                    "the session parameter cannot have a default",
                ));
            }
            continue;
        }

        let name = match pat_type.pat.as_ref() {
            Pat::Ident(ident) => ident.ident.clone(),
            _ => {
                return Err(syn::Error::new_spanned(
                    &pat_type.pat,
                    "expected identifier pattern",
                ));
            }
        };
        let ty = &pat_type.ty;

        // Doc comments carry over to the field and land in the schema
        let docs: Vec<_> = pat_type
            .attrs
            .iter()
            .filter(|a| a.path().is_ident("doc"))
            .cloned()
            .collect();
        // rustc rejects doc comments on function parameters
        pat_type.attrs.retain(|a| !a.path().is_ident("doc"));

        let serde_default = match default {
            Some(expr) => {
                let default_fn = format_ident!("__{}_default_{}", func_name, name);
                let path = LitStr::new(&default_fn.to_string(), name.span());
                default_fns.push(quote! {
                    #[doc(hidden)]
                    fn #default_fn() -> #ty {
                        #expr
                    }
                });
                quote! { #[serde(default = #path)] }
            }
            None => quote! {},
        };

        field_defs.push(quote! {
            #(#docs)*
            #serde_default
            pub #name: #ty
        });
        field_names.push(name);
    }

    // Extract return type: Result<Output, Error> is fallible, anything else is not
    let (output_type, error_type, fallible) = match &func.sig.output {
        ReturnType::Type(_, ty) => match extract_result_types(ty)? {
            Some((output, error)) => (output, error, true),
            None => (ty.clone(), Box::new(infallible()), false),
        },
        ReturnType::Default => (
            Box::<Type>::new(syn::parse_quote!(())),
            Box::new(infallible()),
            false,
        ),
    };

    let invoke = quote! { #func_name(session, #(#field_names),*) };
    let body = if fallible {
        invoke
    } else {
        quote! { ::core::result::Result::Ok(#invoke) }
    };

    let args_doc = format!("Arguments of the `{job_name}` job.");
    let job_doc = format!("The `{job_name}` job, generated from [`{func_name}`].");

    Ok(quote! {
        #func

        #[doc = #args_doc]
        #[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
        #[serde(deny_unknown_fields)]
        #vis struct #args_struct {
            #(#field_defs,)*
        }

        #(#default_fns)*

        #[doc = #job_doc]
        #[derive(Debug, Clone, Copy, Default)]
        #vis struct #job_struct;

        impl #job_struct {
            /// The name this job registers under.
            pub const NAME: &'static str = #job_name;
        }

        impl sauron_types::Job for #job_struct {
            type Args = #args_struct;
            type Output = #output_type;
            type Error = #error_type;

            fn name(&self) -> &str {
                Self::NAME
            }

            fn doc(&self) -> ::core::option::Option<&str> {
                #doc
            }

            fn call(
                &self,
                session: &mut sauron_types::Session,
                args: Self::Args,
            ) -> ::core::result::Result<Self::Output, Self::Error> {
                let #args_struct { #(#field_names,)* } = args;
                #body
            }
        }
    })
}

fn infallible() -> Type {
    syn::parse_quote!(::core::convert::Infallible)
}

/// Split `Result<Output, Error>` into its parts; `None` for any other type.
fn extract_result_types(ty: &Type) -> syn::Result<Option<(Box<Type>, Box<Type>)>> {
    let Type::Path(type_path) = ty else {
        return Ok(None);
    };
    let Some(last_segment) = type_path.path.segments.last() else {
        return Ok(None);
    };
    if last_segment.ident != "Result" {
        return Ok(None);
    }

    if let syn::PathArguments::AngleBracketed(args) = &last_segment.arguments {
        let mut types = args.args.iter().filter_map(|arg| {
            if let syn::GenericArgument::Type(t) = arg {
                Some(t.clone())
            } else {
                None
            }
        });

        let output = types
            .next()
            .ok_or_else(|| syn::Error::new_spanned(ty, "Result must have Output type"))?;
        let error = types
            .next()
            .ok_or_else(|| syn::Error::new_spanned(ty, "Result must have Error type"))?;

        return Ok(Some((Box::new(output), Box::new(error))));
    }

    Err(syn::Error::new_spanned(
        ty,
        "return type must be Result<Output, Error>",
    ))
}
