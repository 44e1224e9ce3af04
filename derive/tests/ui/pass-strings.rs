use tunemint_core::{
    MoveArg,
    MoveCall,
    ObjectId,
};
use tunemint_derive::MoveCall;

#[derive(MoveCall)]
#[move_call(module = "music_nft", function = "mint_to_sender")]
struct Mint<'a> {
    #[object]
    collection: ObjectId,
    name: &'a str,
    description: String,
}

fn main() {
    let call = Mint {
        collection: ObjectId::FRAMEWORK,
        name: "Song",
        description: String::new(),
    };
    let args = call.arguments().unwrap();
    assert_eq!(args[1], MoveArg::Pure(vec![4, b'S', b'o', b'n', b'g']));
    assert_eq!(args[2], MoveArg::Pure(vec![0]));
}
