#![allow(dead_code)]
use tunemint_derive::MoveCall;

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "start_listening")]
struct Start {
    #[object(shared)]
    marketplace: u64,
}

fn main() {}
