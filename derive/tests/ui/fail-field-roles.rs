#![allow(dead_code)]
use tunemint_derive::MoveCall;

#[derive(MoveCall)]
#[move_call(module = "trade", function = "accept_trade")]
struct Accept {
    #[object]
    #[type_arg]
    trade: u64,
}

fn main() {}
