#![allow(dead_code)]
use tunemint_derive::MoveCall;

#[derive(MoveCall)]
struct ClaimRewards {
    #[object]
    marketplace: u64,
}

fn main() {}
