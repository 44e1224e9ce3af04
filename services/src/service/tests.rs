use serde_json::{
    json,
    Value,
};

use super::*;
use crate::{
    rpc::fixture::Fixture,
    tx::{
        CallArg,
        Command,
        ProgrammableMoveCall,
        ProgrammableTransaction,
        TransactionKind,
    },
};

pub(crate) const DIGEST: &str = "6Ls5JmNHvfDuvVvhfS7nAEwT2SrbYhRJYRNsxyu7Tx2g";
pub(crate) const TX_DIGEST: &str = "9tUnq1BuDjbbjkx6HszxyQw4VZyrkVAPQpsqoYS4H5mN";


pub(crate) fn signer() -> Keypair { Keypair::from_secret(&core::array::from_fn(|i| i as u8 + 1)) }

pub(crate) fn context(fixture: Fixture) -> Context<Fixture> {
    let config = Config {
        confirm_timeout_secs: 1,
        poll_interval_ms: 1,
        ..Config::default()
    };
    Context::new(SuiClient::new(fixture), config, Some(signer()))
}

pub(crate) fn id(s: &str) -> ObjectId { s.parse().unwrap() }

/// `sui_multiGetObjects` entry for a shared object
pub(crate) fn shared(id: ObjectId) -> Value {
    json!({ "data": { "objectId": id, "version": "10", "digest": DIGEST, "owner": { "Shared": { "initial_shared_version": 2 } } } })
}

/// `sui_multiGetObjects` entry for an address owned object
pub(crate) fn owned(id: ObjectId) -> Value {
    json!({ "data": { "objectId": id, "version": "4", "digest": DIGEST, "owner": { "AddressOwner": signer().address() } } })
}

/// Responses for one dev-inspected call
pub(crate) fn with_inspect(fixture: Fixture, objects: Value, values: &[Vec<u8>]) -> Fixture {
    let values: Vec<Value> = values.iter().map(|v| json!([v, "unused"])).collect();
    fixture.with("sui_multiGetObjects", objects).with(
        "sui_devInspectTransactionBlock",
        json!({ "effects": { "status": { "status": "success" } }, "results": [{ "returnValues": values }] }),
    )
}

/// Responses for one submitted transaction
pub(crate) fn with_execution(fixture: Fixture, objects: Value, confirmed: Value) -> Fixture {
    fixture
        .with("sui_multiGetObjects", objects)
        .with("suix_getReferenceGasPrice", json!("1000"))
        .with("suix_getCoins", json!({
            "data": [{ "coinObjectId": "0xc0", "version": "8", "digest": DIGEST, "balance": "100000000000" }],
            "nextCursor": null,
            "hasNextPage": false
        }))
        .with("sui_executeTransactionBlock", json!({ "digest": TX_DIGEST }))
        .with("sui_getTransactionBlock", confirmed)
}

pub(crate) fn confirmed() -> Value { json!({ "digest": TX_DIGEST, "effects": { "status": { "status": "success" }, "created": [] } }) }

fn programmable(bytes: &[u8]) -> ProgrammableTransaction {
    match bcs::from_bytes::<TransactionData>(bytes).unwrap().kind() {
        TransactionKind::ProgrammableTransaction(pt) => pt.clone(),
    }
}

/// Transactions sent for execution
pub(crate) fn executed(ctx: &Context<Fixture>) -> Vec<ProgrammableTransaction> {
    ctx.client
        .transport()
        .submitted("sui_executeTransactionBlock")
        .iter()
        .map(|b| programmable(b))
        .collect()
}

/// Transactions sent for dev-inspect
pub(crate) fn inspected(ctx: &Context<Fixture>) -> Vec<ProgrammableTransaction> {
    ctx.client
        .transport()
        .submitted("sui_devInspectTransactionBlock")
        .iter()
        .map(|b| match bcs::from_bytes::<TransactionKind>(b).unwrap() {
            TransactionKind::ProgrammableTransaction(pt) => pt,
        })
        .collect()
}

/// Move calls of a transaction, skipping coin splits
pub(crate) fn move_calls(pt: &ProgrammableTransaction) -> Vec<&ProgrammableMoveCall> {
    pt.commands
        .iter()
        .filter_map(|c| match c {
            Command::MoveCall(call) => Some(call.as_ref()),
            _ => None,
        })
        .collect()
}

/// BCS decoded pure input
pub(crate) fn pure<R: serde::de::DeserializeOwned>(pt: &ProgrammableTransaction, input: u16) -> R {
    match &pt.inputs[usize::from(input)] {
        CallArg::Pure(bytes) => bcs::from_bytes(bytes).unwrap(),
        other => panic!("input {input} is not pure: {other:?}"),
    }
}


#[derive(tunemint_derive::MoveCall)]
#[move_call(module = "marketplace", function = "take_profits_and_keep")]
struct TakeProfits {
    #[object]
    marketplace: ObjectId,
}

#[test]
fn executes_signed_transaction() {
    let ctx = context(with_execution(Fixture::new(), json!([shared(id("0xb9"))]), confirmed()));

    let outcome = ctx.call(id("0x08"), &TakeProfits { marketplace: id("0xb9") }).unwrap();

    assert_eq!(outcome.digest(), Some(TX_DIGEST));
    let params = &ctx.client.transport().calls("sui_executeTransactionBlock")[0];
    assert_eq!(params[1], json!([signer().sign_transaction(&ctx.client.transport().submitted("sui_executeTransactionBlock")[0])]));
    assert_eq!(params[3], json!("WaitForLocalExecution"));

    let bytes = &ctx.client.transport().submitted("sui_executeTransactionBlock")[0];
    let TransactionData::V1(data) = bcs::from_bytes::<TransactionData>(bytes).unwrap();
    assert_eq!(data.sender, signer().address());
    assert_eq!(data.gas_data.price, 1000);
    assert_eq!(data.gas_data.budget, ctx.config.gas_budget);
    assert_eq!(data.gas_data.payment[0].0, id("0xc0"));
}

#[test]
fn failed_effects_are_errors() {
    let failed = json!({ "digest": TX_DIGEST, "effects": { "status": { "status": "failure", "error": "MoveAbort(1)" } } });
    let ctx = context(with_execution(Fixture::new(), json!([shared(id("0xb9"))]), failed));

    let err = ctx.call(id("0x08"), &TakeProfits { marketplace: id("0xb9") }).unwrap_err();
    assert!(format!("{err:#}").contains("MoveAbort(1)"));
}

#[test]
fn dry_run_without_signer() {
    let fixture = with_execution(Fixture::new(), json!([shared(id("0xb9"))]), confirmed()).with("sui_dryRunTransactionBlock", json!({
        "effects": {
            "status": { "status": "success" },
            "created": [{ "owner": { "AddressOwner": "0x1" }, "reference": { "objectId": "0x77", "version": 1, "digest": DIGEST } }]
        }
    }));
    let config = Config {
        address: Some(id("0x1")),
        ..Config::default()
    };
    let ctx = Context::new(SuiClient::new(fixture), config, None).dry_run(true);

    let outcome = ctx.call(id("0x08"), &TakeProfits { marketplace: id("0xb9") }).unwrap();

    assert!(outcome.is_simulated());
    assert_eq!(outcome.digest(), None);
    assert_eq!(outcome.created_owned(), Some(id("0x77")));
    assert!(ctx.client.transport().calls("sui_executeTransactionBlock").is_empty());
    assert_eq!(ctx.client.transport().calls("suix_getCoins")[0][0], json!(id("0x1")));
}

#[test]
fn submit_requires_signer() {
    let ctx = Context::new(SuiClient::new(Fixture::new()), Config::default(), None);
    assert_eq!(ctx.account(), None);
    assert!(ctx.require_account().is_err());

    let err = ctx.call(id("0x08"), &TakeProfits { marketplace: id("0xb9") }).unwrap_err();
    assert_eq!(err.to_string(), "A signing key is required to submit transactions");
}

#[test]
fn inspect_uses_zero_sender_without_account() {
    let ctx = Context::new(
        SuiClient::new(with_inspect(Fixture::new(), json!([shared(id("0xb9"))]), &[vec![5, 0, 0, 0, 0, 0, 0, 0]])),
        Config::default(),
        None,
    );

    let values = ctx.inspect(id("0x08"), &TakeProfits { marketplace: id("0xb9") }).unwrap();

    assert_eq!(values.u64(0).unwrap(), 5);
    assert_eq!(ctx.client.transport().calls("sui_devInspectTransactionBlock")[0][0], json!(Address::ZERO));
    assert_eq!(move_calls(&inspected(&ctx)[0])[0].function, "take_profits_and_keep");
}

#[test]
fn form_validation() {
    assert!(require_filled(&["a", "b"]).is_ok());
    assert_eq!(require_filled(&["a", "  "]).unwrap_err().to_string(), "Please fill all fields");
}

#[test]
fn query_matching() {
    assert!(matches_query("", ["anything"]));
    assert!(matches_query("BEAT", ["Epic Beat #1", "desc"]));
    assert!(matches_query(" lofi ", ["x", "chill LoFi track"]));
    assert!(!matches_query("jazz", ["Epic Beat #1", "desc"]));
}
