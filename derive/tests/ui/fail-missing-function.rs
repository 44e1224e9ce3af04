#![allow(dead_code)]
use tunemint_derive::MoveCall;

#[derive(MoveCall)]
#[move_call(module = "music_marketplace")]
struct ClaimRewards {
    #[object]
    marketplace: u64,
}

fn main() {}
