use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, Meta};

/// Derive a columnar companion for a per-step flux struct.
///
/// Every field of the source struct must be `f64`. The generated
/// `{StructName}Series` struct stores one `Vec<f64>` per field and offers
/// `with_capacity`, `push`, `len`, `is_empty` and `column(name)`. The source
/// struct gains a `field_names()` associated function.
///
/// `#[series(name = "CustomName")]` overrides the generated struct name.
#[proc_macro_derive(StepSeries, attributes(series))]
pub fn derive_step_series(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let series_name =
        extract_series_name(&input).unwrap_or_else(|| format_ident!("{}Series", name));

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return syn::Error::new_spanned(
                    name,
                    "StepSeries can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "StepSeries can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    if fields.is_empty() {
        return syn::Error::new_spanned(name, "StepSeries struct must have at least one field")
            .to_compile_error()
            .into();
    }

    let mut idents = Vec::with_capacity(fields.len());
    for field in fields {
        if !is_f64(&field.ty) {
            return syn::Error::new_spanned(&field.ty, "StepSeries derive: all fields must be f64")
                .to_compile_error()
                .into();
        }
        // Named fields always carry an ident.
        if let Some(ident) = field.ident.as_ref() {
            idents.push(ident);
        }
    }

    let labels: Vec<String> = idents.iter().map(|i| i.to_string()).collect();
    let first = idents[0];

    let expanded = quote! {
        /// Columnar per-step values, one vector per flux.
        #[derive(Debug, Clone, Default)]
        pub struct #series_name {
            #(pub #idents: Vec<f64>,)*
        }

        impl #series_name {
            /// Pre-allocate every column for `n` steps.
            pub fn with_capacity(n: usize) -> Self {
                Self {
                    #(#idents: Vec::with_capacity(n),)*
                }
            }

            /// Append one step.
            pub fn push(&mut self, step: &#name) {
                #(self.#idents.push(step.#idents);)*
            }

            /// Number of stored steps.
            pub fn len(&self) -> usize {
                self.#first.len()
            }

            /// Returns `true` if no steps have been stored.
            pub fn is_empty(&self) -> bool {
                self.#first.is_empty()
            }

            /// Borrow a column by field name.
            pub fn column(&self, field: &str) -> Option<&[f64]> {
                match field {
                    #(#labels => Some(self.#idents.as_slice()),)*
                    _ => None,
                }
            }
        }

        impl #name {
            /// Field names in declaration order.
            pub fn field_names() -> &'static [&'static str] {
                &[#(#labels),*]
            }
        }
    };

    expanded.into()
}

fn extract_series_name(input: &DeriveInput) -> Option<proc_macro2::Ident> {
    let attr = input.attrs.iter().find(|a| a.path().is_ident("series"))?;
    let nested = attr
        .parse_args_with(syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated)
        .ok()?;
    nested.into_iter().find_map(|meta| match meta {
        Meta::NameValue(nv) if nv.path.is_ident("name") => match &nv.value {
            syn::Expr::Lit(expr) => match &expr.lit {
                Lit::Str(s) => Some(format_ident!("{}", s.value())),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    })
}

fn is_f64(ty: &syn::Type) -> bool {
    matches!(ty, syn::Type::Path(p) if p.path.is_ident("f64"))
}
