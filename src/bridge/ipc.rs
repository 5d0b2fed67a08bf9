use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Name of the function the render process exposes for script to host messages.
pub const IPC_SENDER: &str = "__postMessage";
/// Name of the script side runtime installed by the bootstrap script.
pub const BRIDGE_RUNTIME: &str = "__bridge";

pub const CALLBACK_KEY: &str = "$callback";
pub const HOST_CALLBACK_KEY: &str = "$host";

const BRIDGE_SCRIPT: &str = include_str!("bridge.js");

/// Messages posted by page script.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptMessage {
    Ready,
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    Method {
        object: String,
        method: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    HostCallback {
        id: u64,
        #[serde(default)]
        args: Vec<Value>,
    },
}

impl TryFrom<&str> for ScriptMessage {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        serde_json::from_str::<ScriptMessage>(value)
            .map_err(|e| format!("Failed to convert String to ScriptMessage: {e}"))
    }
}

#[derive(Serialize, Debug)]
struct Manifest<'a> {
    properties: &'a BTreeMap<String, Value>,
    functions: Vec<&'a str>,
    objects: BTreeMap<&'a str, Vec<&'a str>>,
}

pub fn bootstrap_script(
    properties: &BTreeMap<String, Value>,
    functions: Vec<&str>,
    objects: BTreeMap<&str, Vec<&str>>,
) -> String {
    let manifest = Manifest {
        properties,
        functions,
        objects,
    };
    let manifest =
        serde_json::to_string(&manifest).expect("Failed to convert bridge manifest to string");

    BRIDGE_SCRIPT
        .replace("IPC_SENDER", IPC_SENDER)
        .replace("BRIDGE_RUNTIME", BRIDGE_RUNTIME)
        .replace("BRIDGE_MANIFEST", &manifest)
}

pub fn callback_id(value: &Value) -> Option<u64> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(CALLBACK_KEY).and_then(Value::as_u64),
        _ => None,
    }
}

pub fn host_callback_marker(id: u64) -> Value {
    json!({ HOST_CALLBACK_KEY: id })
}

pub fn invoke_callback_script(id: u64, args: &[Value]) -> String {
    let args = serde_json::to_string(args).expect("Failed to convert callback arguments to string");
    format!("window.{BRIDGE_RUNTIME} && window.{BRIDGE_RUNTIME}.invokeCallback({id}, {args});")
}
