#![allow(dead_code)]
use tunemint_derive::MoveCall;

#[derive(MoveCall)]
#[move_call(module = "trade", entry = "accept_trade")]
struct Accept {
    #[object]
    trade: u64,
}

fn main() {}
