use tunemint_core::{
    MoveCall,
    ObjectId,
    TypeTag,
};
use tunemint_derive::MoveCall;

#[derive(MoveCall)]
#[move_call(module = "trade", function = "create_trade")]
struct CreateTrade<T: serde::Serialize> {
    #[object]
    initiator_nft: ObjectId,
    target: T,
    #[type_arg]
    offered: TypeTag,
}

fn main() {
    let call = CreateTrade {
        initiator_nft: ObjectId::CLOCK,
        target: ObjectId::ZERO,
        offered: TypeTag::U8,
    };
    assert_eq!(call.arguments().unwrap().len(), 2);
}
