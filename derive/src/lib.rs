extern crate proc_macro;

use proc_macro::TokenStream;
use syn::{
    parse_macro_input,
    DeriveInput,
};

mod call;
use call::derive_call;


/// Implements `tunemint_core::MoveCall` for a struct with named fields
///
/// ```ignore
/// #[derive(MoveCall)]
/// #[move_call(module = "marketplace", function = "list")]
/// struct List {
///     #[type_arg]
///     item_type: TypeTag,
///     #[object]
///     marketplace: ObjectId,
///     #[object]
///     item: ObjectId,
///     ask: u64,
/// }
/// ```
///
/// Fields become arguments in declaration order. Untagged fields are BCS encoded pure values,
/// `#[object]`/`#[object(read_only)]` pass an object by id, `#[coin]` splits the amount off the gas coin.
/// `#[type_arg]` fields are collected into the type argument list instead.
#[proc_macro_derive(MoveCall, attributes(move_call, object, type_arg, coin))]
pub fn derive_move_call(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_call(input).unwrap_or_else(|e| e.to_compile_error()).into()
}
