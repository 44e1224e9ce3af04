use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use serde_with::{
    serde_as,
    DisplayFromStr,
};
use tunemint_core::{
    Address,
    ObjectId,
};

use super::Fields;
use crate::{
    de::{
        opt_u64_from_str_or_num,
        u64_from_str_or_num,
        vec_skip_errors,
    },
    Error,
};

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectOptions {
    pub show_type: bool,
    pub show_owner: bool,
    pub show_content: bool,
    pub show_display: bool,
}

impl ObjectOptions {
    pub fn content() -> Self {
        Self {
            show_type: true,
            show_content: true,
            ..Default::default()
        }
    }

    pub fn display() -> Self {
        Self {
            show_display: true,
            ..Self::content()
        }
    }

    pub fn owner() -> Self {
        Self {
            show_owner: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOptions {
    pub show_effects: bool,
    pub show_events: bool,
    pub show_object_changes: bool,
}

impl TransactionOptions {
    pub fn full() -> Self {
        Self {
            show_effects: true,
            show_events: true,
            show_object_changes: true,
        }
    }
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T, C> {
    #[serde(deserialize_with = "vec_skip_errors", bound(deserialize = "T: Deserialize<'de>"))]
    pub data: Vec<T>,
    pub next_cursor: Option<C>,
    #[serde(default)]
    pub has_next_page: bool,
}


#[derive(Debug, Clone, Deserialize)]
pub struct SuiObjectResponse {
    pub data: Option<SuiObjectData>,
    pub error: Option<Value>,
}

impl SuiObjectResponse {
    /// # Errors
    ///
    /// Returns the node's error for deleted or missing objects
    pub fn into_data(self) -> Result<SuiObjectData, Error> {
        match self {
            Self { data: Some(data), .. } => Ok(data),
            Self { error, .. } => Err(Error::Decode(error.map_or_else(|| "object has no data".to_owned(), |e| e.to_string()))),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiObjectData {
    pub object_id: ObjectId,
    #[serde_as(as = "DisplayFromStr")]
    pub version: u64,
    pub digest: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub owner: Option<Owner>,
    pub content: Option<ParsedData>,
    pub display: Option<DisplayFields>,
}

impl SuiObjectData {
    pub fn fields(&self) -> Option<Fields<'_>> {
        self.content.as_ref().filter(|c| c.is_move_object()).and_then(|c| Fields::of(&c.fields))
    }

    /// Object display metadata, if the type registered a `Display`
    pub fn display_str(&self, key: &str) -> Option<&str> {
        self.display
            .as_ref()
            .and_then(|d| d.data.as_ref())
            .and_then(|d| d.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum Owner {
    AddressOwner(Address),
    ObjectOwner(Address),
    Shared {
        #[serde(deserialize_with = "u64_from_str_or_num")]
        initial_shared_version: u64,
    },
    Immutable,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedData {
    pub data_type: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub fields: Value,
}

impl ParsedData {
    pub fn is_move_object(&self) -> bool { self.data_type == "moveObject" }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayFields {
    pub data: Option<serde_json::Map<String, Value>>,
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicFieldInfo {
    pub name: DynamicFieldName,
    pub object_id: ObjectId,
    pub object_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DynamicFieldName {
    #[serde(rename = "type")]
    pub type_: String,
    pub value: Value,
}

impl DynamicFieldName {
    /// The key as an object id, for tables and bags keyed by `ID`
    pub fn as_id(&self) -> Option<ObjectId> { self.value.as_str().and_then(|s| s.parse().ok()) }
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventId {
    pub tx_digest: String,
    pub event_seq: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiEvent {
    pub id: EventId,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub parsed_json: Value,
    #[serde(default, deserialize_with = "opt_u64_from_str_or_num")]
    pub timestamp_ms: Option<u64>,
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlockResponse {
    pub digest: String,
    pub effects: Option<TransactionEffects>,
    #[serde(default)]
    pub object_changes: Vec<ObjectChange>,
    #[serde(default)]
    pub events: Vec<SuiEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionEffects {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub created: Vec<OwnedObjectRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionStatus {
    pub status: String,
    pub error: Option<String>,
}

impl ExecutionStatus {
    /// # Errors
    ///
    /// Returns the abort message when the transaction failed
    pub fn check(&self) -> Result<(), Error> {
        if self.status == "success" {
            Ok(())
        } else {
            Err(Error::Execution(self.error.clone().unwrap_or_else(|| self.status.clone())))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnedObjectRef {
    pub owner: Owner,
    pub reference: ObjectRefView,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRefView {
    pub object_id: ObjectId,
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub version: u64,
    pub digest: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObjectChange {
    Created {
        #[serde(rename = "objectId")]
        object_id: ObjectId,
        #[serde(rename = "objectType")]
        object_type: String,
        owner: Option<Owner>,
    },
    #[serde(other)]
    Other,
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevInspectResults {
    pub effects: Option<TransactionEffects>,
    #[serde(default)]
    pub results: Vec<ExecutionResult>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    #[serde(default)]
    pub return_values: Vec<(Vec<u8>, String)>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunResponse {
    pub effects: TransactionEffects,
    #[serde(default)]
    pub events: Vec<SuiEvent>,
}


#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    pub coin_object_id: ObjectId,
    #[serde_as(as = "DisplayFromStr")]
    pub version: u64,
    pub digest: String,
    #[serde_as(as = "DisplayFromStr")]
    pub balance: u64,
}
