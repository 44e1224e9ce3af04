use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Data,
    DataStruct,
    DeriveInput,
    Fields,
    Result,
};

use self::{
    attributes::CallTarget,
    fields::{
        CallField,
        Role,
    },
};

mod attributes;
mod fields;

pub(super) fn derive_call(input: DeriveInput) -> Result<TokenStream> {
    let fields = match input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => fields.named,
        _ => return Err(syn::Error::new(input.ident.span(), "this derive macro only works on structs with named fields")),
    };
    let target = &input.ident;

    let CallTarget { module, function } = attributes::parse(target, &input.attrs)?;
    let fields = fields::process(&fields)?;

    let type_args = fields.iter().filter(|f| f.role == Role::TypeArg).map(|CallField { ident, .. }| {
        quote! {
            ::core::convert::Into::<::tunemint_core::TypeTag>::into(::core::clone::Clone::clone(&self.#ident))
        }
    });
    let args = fields.iter().filter_map(|CallField { ident, role }| match role {
        Role::TypeArg => None,
        Role::Pure => Some(quote!(::tunemint_core::MoveArg::pure(&self.#ident)?)),
        Role::Object { mutable } => Some(quote! {
            ::tunemint_core::MoveArg::Object {
                id: ::core::convert::Into::<::tunemint_core::ObjectId>::into(self.#ident),
                mutable: #mutable,
            }
        }),
        Role::Coin => Some(quote!(::tunemint_core::MoveArg::SplitGas(::core::convert::Into::<u64>::into(self.#ident)))),
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::tunemint_core::MoveCall for #target #ty_generics #where_clause {
            const MODULE: &'static str = #module;
            const FUNCTION: &'static str = #function;

            fn type_arguments(&self) -> ::std::vec::Vec<::tunemint_core::TypeTag> {
                ::std::vec![#(#type_args),*]
            }

            fn arguments(&self) -> ::core::result::Result<::std::vec::Vec<::tunemint_core::MoveArg>, ::tunemint_core::EncodeError> {
                ::core::result::Result::Ok(::std::vec![#(#args),*])
            }
        }
    })
}
