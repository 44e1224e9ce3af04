#![allow(dead_code)]
use tunemint_derive::MoveCall;

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "stop_listening")]
struct Stop {
    #[move_call(module = "music_marketplace")]
    marketplace: u64,
}

fn main() {}
