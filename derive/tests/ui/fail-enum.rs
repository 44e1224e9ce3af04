#![allow(dead_code)]
use tunemint_derive::MoveCall;

#[derive(MoveCall)]
#[move_call(module = "trade", function = "cancel_trade")]
enum Cancel {
    Trade(u64),
}

fn main() {}
