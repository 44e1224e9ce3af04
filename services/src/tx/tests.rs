use serde_json::json;
use tunemint_core::{
    Mist,
    TypeTag,
};
use tunemint_derive::MoveCall;

use super::*;
use crate::rpc::{
    fixture::Fixture,
    DevInspectResults,
};

const DIGEST: &str = "6Ls5JmNHvfDuvVvhfS7nAEwT2SrbYhRJYRNsxyu7Tx2g";

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "update_listening")]
struct Update {
    #[object]
    marketplace: ObjectId,
    seconds: u64,
    #[object(read_only)]
    clock: ObjectId,
}

#[derive(MoveCall)]
#[move_call(module = "music_marketplace", function = "is_listening")]
struct IsListening {
    #[object(read_only)]
    marketplace: ObjectId,
    user: Address,
}

#[derive(MoveCall)]
#[move_call(module = "marketplace", function = "buy_and_take")]
struct Buy {
    #[type_arg]
    item_type: TypeTag,
    #[object]
    marketplace: ObjectId,
    item_id: ObjectId,
    #[coin]
    paid: Mist,
}

fn id(s: &str) -> ObjectId { s.parse().unwrap() }

fn calls(kind: &TransactionKind) -> &ProgrammableTransaction {
    match kind {
        TransactionKind::ProgrammableTransaction(pt) => pt,
    }
}

#[test]
fn shared_inputs_are_reused_and_widened() {
    let mut builder = TransactionBuilder::new();
    builder
        .move_call(id("0x98"), &IsListening {
            marketplace: id("0xc9"),
            user: id("0x1"),
        })
        .unwrap()
        .move_call(id("0x98"), &Update {
            marketplace: id("0xc9"),
            seconds: 10,
            clock: ObjectId::CLOCK,
        })
        .unwrap();

    assert_eq!(builder.inputs, vec![
        Input::Object {
            id: id("0xc9"),
            mutable: true,
        },
        Input::Pure(id("0x1").as_bytes().to_vec()),
        Input::Pure(10u64.to_le_bytes().to_vec()),
        Input::Object {
            id: ObjectId::CLOCK,
            mutable: false,
        },
    ]);
    let Command::MoveCall(update) = &builder.commands[1] else { panic!("expected a move call") };
    assert_eq!(update.module, "music_marketplace");
    assert_eq!(update.function, "update_listening");
    assert_eq!(update.arguments, vec![Argument::Input(0), Argument::Input(2), Argument::Input(3)]);
}

#[test]
fn payment_splits_gas() {
    let mut builder = TransactionBuilder::new();
    builder
        .move_call(id("0x08"), &Buy {
            item_type: "0xef::music_nft::MusicNFT".parse().unwrap(),
            marketplace: id("0xb9"),
            item_id: id("0x42"),
            paid: Mist(2_500_000_000),
        })
        .unwrap();

    assert_eq!(builder.gas_spend(), 2_500_000_000);
    assert_eq!(builder.commands[0], Command::SplitCoins(Argument::GasCoin, vec![Argument::Input(2)]));
    let Command::MoveCall(buy) = &builder.commands[1] else { panic!("expected a move call") };
    assert_eq!(buy.arguments, vec![Argument::Input(0), Argument::Input(1), Argument::NestedResult(0, 0)]);
    assert_eq!(buy.type_arguments.len(), 1);
}

#[test]
fn input_indices_do_not_wrap() {
    let mut builder = TransactionBuilder::new();
    for _ in 0..=u16::MAX {
        builder.input(Input::Pure(vec![])).unwrap();
    }

    let err = builder
        .move_call(id("0x08"), &Update {
            marketplace: id("0xc9"),
            seconds: 10,
            clock: ObjectId::CLOCK,
        })
        .unwrap_err();

    assert!(matches!(err, EncodeError::ExceededMaxLen(65536)));
    assert_eq!(builder.inputs.len(), 65536);
    assert!(builder.is_empty());
}

#[test]
fn resolves_shared_and_owned_objects() {
    let client = SuiClient::new(Fixture::new().with("sui_multiGetObjects", json!([
        { "data": { "objectId": "0xc9", "version": "40", "digest": DIGEST, "owner": { "Shared": { "initial_shared_version": 3 } } } },
        { "data": { "objectId": "0x77", "version": "12", "digest": DIGEST, "owner": { "AddressOwner": "0x1" } } },
        { "data": { "objectId": "0x6", "version": "99", "digest": DIGEST, "owner": { "Shared": { "initial_shared_version": 1 } } } }
    ])));

    #[derive(MoveCall)]
    #[move_call(module = "music_marketplace", function = "list_music")]
    struct ListMusic {
        #[object]
        marketplace: ObjectId,
        #[object]
        nft: ObjectId,
        #[object(read_only)]
        clock: ObjectId,
    }

    let mut builder = TransactionBuilder::new();
    builder
        .move_call(id("0x98"), &ListMusic {
            marketplace: id("0xc9"),
            nft: id("0x77"),
            clock: ObjectId::CLOCK,
        })
        .unwrap();
    let kind = builder.resolve(&client).unwrap();

    let pt = calls(&kind);
    assert_eq!(pt.inputs, vec![
        CallArg::Object(ObjectArg::SharedObject {
            id: id("0xc9"),
            initial_shared_version: 3,
            mutable: true,
        }),
        CallArg::Object(ObjectArg::ImmOrOwnedObject((id("0x77"), 12, Digest::from_base58(DIGEST).unwrap()))),
        CallArg::Object(ObjectArg::SharedObject {
            id: ObjectId::CLOCK,
            initial_shared_version: 1,
            mutable: false,
        }),
    ]);

    let requested = &client.transport().calls("sui_multiGetObjects")[0];
    assert_eq!(requested[0].as_array().map(Vec::len), Some(3));
    assert_eq!(requested[1]["showOwner"], json!(true));

    let bytes = bcs::to_bytes(&kind).unwrap();
    assert_eq!(bcs::from_bytes::<TransactionKind>(&bytes).unwrap(), kind);
}

#[test]
fn bcs_layout() {
    assert_eq!(bcs::to_bytes(&Argument::NestedResult(1, 0)).unwrap(), [3, 1, 0, 0, 0]);
    assert_eq!(bcs::to_bytes(&CallArg::Pure(vec![7])).unwrap(), [0, 1, 7]);
    assert_eq!(bcs::to_bytes(&TransactionExpiration::None).unwrap(), [0]);

    let data = TransactionData::new(
        TransactionKind::ProgrammableTransaction(ProgrammableTransaction {
            inputs: vec![],
            commands: vec![],
        }),
        Address::ZERO,
        GasData {
            payment: vec![],
            owner: Address::ZERO,
            price: 1,
            budget: 2,
        },
    );
    let bytes = bcs::to_bytes(&data).unwrap();
    // version, kind, empty inputs, empty commands
    assert_eq!(&bytes[..4], &[0, 0, 0, 0]);
    assert_eq!(bytes.len(), 4 + 32 + 1 + 32 + 8 + 8 + 1);
}

#[test]
fn gas_uses_largest_coins_first() {
    let client = SuiClient::new(
        Fixture::new()
            .with("suix_getCoins", json!({
                "data": [
                    { "coinType": "0x2::sui::SUI", "coinObjectId": "0xa1", "version": "3", "digest": DIGEST, "balance": "100" }
                ],
                "nextCursor": "0xa1",
                "hasNextPage": true
            }))
            .with("suix_getCoins", json!({
                "data": [
                    { "coinType": "0x2::sui::SUI", "coinObjectId": "0xa2", "version": "4", "digest": DIGEST, "balance": "900" },
                    { "coinType": "0x2::sui::SUI", "coinObjectId": "0xa3", "version": "5", "digest": DIGEST, "balance": "50" }
                ],
                "nextCursor": null,
                "hasNextPage": false
            })),
    );

    let payment = select_gas(&client, Address::ZERO, 950).unwrap();

    let ids: Vec<_> = payment.iter().map(|(id, ..)| *id).collect();
    assert_eq!(ids, [id("0xa2"), id("0xa1")]);
    assert_eq!(client.transport().calls("suix_getCoins")[1][2], json!("0xa1"));
}

#[test]
fn gas_insufficient() {
    let client = SuiClient::new(Fixture::new().with("suix_getCoins", json!({
        "data": [{ "coinObjectId": "0xa1", "version": "3", "digest": DIGEST, "balance": "100" }],
        "nextCursor": null,
        "hasNextPage": false
    })));

    let err = select_gas(&client, Address::ZERO, 1_000).unwrap_err();
    assert!(matches!(err, Error::InsufficientBalance {
        required: 1_000,
        available: 100
    }));
}

#[test]
fn return_values() {
    let results: DevInspectResults = serde_json::from_value(json!({
        "effects": { "status": { "status": "success" } },
        "results": [
            { "mutableReferenceOutputs": [] },
            {
                "returnValues": [
                    [[1], "bool"],
                    [[232, 3, 0, 0, 0, 0, 0, 0], "u64"],
                    [[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 6], "address"]
                ]
            }
        ]
    }))
    .unwrap();

    let values = ReturnValues::from_results(results).unwrap();
    assert_eq!(values.len(), 3);
    assert!(values.bool(0).unwrap());
    assert_eq!(values.u64(1).unwrap(), 1_000);
    assert_eq!(values.address(2).unwrap(), Address::CLOCK);
    assert!(matches!(values.u64(3), Err(Error::Decode(_))));
}

#[test]
fn inspect_abort() {
    let results: DevInspectResults = serde_json::from_value(json!({
        "effects": { "status": { "status": "failure", "error": "MoveAbort in 1st command" } },
        "results": [],
        "error": "MoveAbort in 1st command"
    }))
    .unwrap();

    let err = ReturnValues::from_results(results).unwrap_err();
    assert_eq!(err.to_string(), "execution failed: MoveAbort in 1st command");
}
