pub mod ipc;
mod printer;

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
    engine::{Browser, BrowserRef},
    shared::{BrowserId, Readiness},
};
use ipc::ScriptMessage;

pub use printer::{PagePrinter, PrintFunction};

#[derive(Debug, Error, PartialEq)]
pub enum BridgeError {
    #[error("Name {0} is bound more than once")]
    DuplicateName(String),
    #[error("Invalid bridge message: {0}")]
    InvalidMessage(String),
    #[error("Unknown function {0}")]
    UnknownFunction(String),
    #[error("Unknown object {0}")]
    UnknownObject(String),
    #[error("Unknown method {object}.{method}")]
    UnknownMethod { object: String, method: String },
    #[error("Unknown host callback {0}")]
    UnknownHostCallback(u64),
    #[error("Invalid argument {index} for {name}: {reason}")]
    InvalidArgument {
        name: String,
        index: usize,
        reason: &'static str,
    },
}

/// An argument received from script.
#[derive(Debug)]
pub enum Argument {
    Value(Value),
    Callback(ScriptCallback),
}

impl Argument {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Argument::Value(value) => Some(value),
            Argument::Callback(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn into_callback(self) -> Option<ScriptCallback> {
        match self {
            Argument::Callback(callback) => Some(callback),
            Argument::Value(_) => None,
        }
    }
}

pub struct CallContext {
    browser_id: BrowserId,
    browser: Weak<dyn Browser>,
}

impl CallContext {
    pub fn browser_id(&self) -> BrowserId {
        self.browser_id
    }

    pub fn browser(&self) -> Option<BrowserRef> {
        self.browser.upgrade()
    }
}

/// A host function callable from script.
///
/// Calls coming from script are one-way messages, so results are delivered
/// through a [`ScriptCallback`] argument rather than a return value.
pub trait HostFunction: Send + Sync {
    fn call(&self, context: &CallContext, args: Vec<Argument>) -> Result<(), BridgeError>;
}

impl<F> HostFunction for F
where
    F: Fn(&CallContext, Vec<Argument>) -> Result<(), BridgeError> + Send + Sync,
{
    fn call(&self, context: &CallContext, args: Vec<Argument>) -> Result<(), BridgeError> {
        self(context, args)
    }
}

/// A host object whose methods are callable from script.
pub trait HostObject: Send + Sync {
    fn methods(&self) -> &[&'static str];
    fn call(
        &self,
        method: &str,
        context: &CallContext,
        args: Vec<Argument>,
    ) -> Result<(), BridgeError>;
}

type HostCallbackFn = Box<dyn FnOnce(Vec<Value>) + Send>;

#[derive(Default)]
struct HostCallbacks {
    next: AtomicU64,
    pending: Mutex<HashMap<(BrowserId, u64), HostCallbackFn>>,
}

impl HostCallbacks {
    fn insert(&self, browser: BrowserId, callback: HostCallbackFn) -> u64 {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert((browser, id), callback);
        }
        id
    }

    fn take(&self, browser: BrowserId, id: u64) -> Option<HostCallbackFn> {
        self.pending.lock().ok()?.remove(&(browser, id))
    }

    fn release(&self, browser: BrowserId) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|(owner, _), _| *owner != browser);
        }
    }

    fn len(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }
}

/// Handle to a function passed from script to the host.
pub struct ScriptCallback {
    id: u64,
    browser_id: BrowserId,
    browser: Weak<dyn Browser>,
    host_callbacks: Arc<HostCallbacks>,
}

impl std::fmt::Debug for ScriptCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptCallback")
            .field("id", &self.id)
            .field("browser_id", &self.browser_id)
            .finish()
    }
}

impl ScriptCallback {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Invokes the script function once with the given values.
    pub fn call(self, args: Vec<Value>) {
        let Some(browser) = self.browser.upgrade() else {
            warn!(
                "Browser {} is gone, dropping script callback {}",
                self.browser_id, self.id
            );
            return;
        };

        browser.execute_script(&ipc::invoke_callback_script(self.id, &args));
    }

    /// Invokes the script function with an extra trailing argument: a function
    /// that, when called from script, runs `reply` on the host.
    pub fn call_with_reply<F>(self, mut args: Vec<Value>, reply: F)
    where
        F: FnOnce(Vec<Value>) + Send + 'static,
    {
        let id = self.host_callbacks.insert(self.browser_id, Box::new(reply));
        args.push(ipc::host_callback_marker(id));
        self.call(args);
    }
}

/// Named host functions, properties and objects exposed to page script.
pub struct BindingTable {
    functions: BTreeMap<String, Arc<dyn HostFunction>>,
    properties: BTreeMap<String, Value>,
    objects: BTreeMap<String, Arc<dyn HostObject>>,
    bind_to_frames: bool,
}

impl BindingTable {
    pub fn builder() -> BindingTableBuilder {
        BindingTableBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.properties.is_empty() && self.objects.is_empty()
    }
}

#[derive(Default)]
pub struct BindingTableBuilder {
    names: Vec<String>,
    functions: BTreeMap<String, Arc<dyn HostFunction>>,
    properties: BTreeMap<String, Value>,
    objects: BTreeMap<String, Arc<dyn HostObject>>,
    bind_to_frames: bool,
}

impl BindingTableBuilder {
    pub fn function<F: HostFunction + 'static>(mut self, name: &str, function: F) -> Self {
        self.names.push(name.to_owned());
        self.functions.insert(name.to_owned(), Arc::new(function));
        self
    }

    pub fn property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.names.push(name.to_owned());
        self.properties.insert(name.to_owned(), value.into());
        self
    }

    pub fn object<O: HostObject + 'static>(mut self, name: &str, object: O) -> Self {
        self.names.push(name.to_owned());
        self.objects.insert(name.to_owned(), Arc::new(object));
        self
    }

    /// Also install the bindings into sub frames, not only the main frame.
    pub fn bind_to_frames(mut self, enabled: bool) -> Self {
        self.bind_to_frames = enabled;
        self
    }

    pub fn build(mut self) -> Result<BindingTable, BridgeError> {
        self.names.sort();
        if let Some(duplicate) = self.names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(BridgeError::DuplicateName(duplicate[0].clone()));
        }

        Ok(BindingTable {
            functions: self.functions,
            properties: self.properties,
            objects: self.objects,
            bind_to_frames: self.bind_to_frames,
        })
    }
}

/// What a handled script message was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Ready,
    Call,
    HostCallback,
}

struct Inner {
    table: BindingTable,
    script: String,
    host_callbacks: Arc<HostCallbacks>,
    readiness: Mutex<HashMap<BrowserId, Readiness>>,
    released: Mutex<HashSet<BrowserId>>,
}

/// A binding table attached to browsers, fixed for their lifetime.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl Bridge {
    pub fn attach(table: BindingTable) -> Self {
        let objects = table
            .objects
            .iter()
            .map(|(name, object)| (name.as_str(), object.methods().to_vec()))
            .collect();
        let functions = table.functions.keys().map(String::as_str).collect();
        let script = ipc::bootstrap_script(&table.properties, functions, objects);

        Self {
            inner: Arc::new(Inner {
                table,
                script,
                host_callbacks: Arc::default(),
                readiness: Mutex::default(),
                released: Mutex::default(),
            }),
        }
    }

    pub fn bootstrap_script(&self) -> &str {
        &self.inner.script
    }

    pub fn binds_to_frames(&self) -> bool {
        self.inner.table.bind_to_frames
    }

    /// Signalled once the bootstrap script has run in the browser's main frame.
    ///
    /// Released browsers get a cancelled gate that is not tracked.
    pub fn readiness(&self, browser: BrowserId) -> Readiness {
        if self.is_released(browser) {
            let readiness = Readiness::new();
            readiness.cancel();
            return readiness;
        }

        match self.inner.readiness.lock() {
            Ok(mut readiness) => readiness.entry(browser).or_default().clone(),
            Err(e) => {
                error!("Failed to lock bridge readiness: {e}");
                Readiness::new()
            }
        }
    }

    pub fn pending_host_callbacks(&self) -> usize {
        self.inner.host_callbacks.len()
    }

    pub fn handle_message(
        &self,
        browser: &BrowserRef,
        payload: &str,
    ) -> Result<Handled, BridgeError> {
        let message = ScriptMessage::try_from(payload).map_err(BridgeError::InvalidMessage)?;
        let browser_id = browser.id();

        let context = CallContext {
            browser_id,
            browser: Arc::downgrade(browser),
        };

        match message {
            ScriptMessage::Ready => {
                let ran = self.readiness(browser_id).signal();
                debug!("Bridge ready in browser {browser_id}, ran {ran} deferred actions");
                Ok(Handled::Ready)
            }
            ScriptMessage::Call { name, args } => {
                let function = self
                    .inner
                    .table
                    .functions
                    .get(&name)
                    .ok_or_else(|| BridgeError::UnknownFunction(name.clone()))?;

                function.call(&context, self.decode(browser, args))?;
                Ok(Handled::Call)
            }
            ScriptMessage::Method {
                object,
                method,
                args,
            } => {
                let target = self
                    .inner
                    .table
                    .objects
                    .get(&object)
                    .ok_or_else(|| BridgeError::UnknownObject(object.clone()))?;

                if !target.methods().contains(&method.as_str()) {
                    return Err(BridgeError::UnknownMethod { object, method });
                }

                target.call(&method, &context, self.decode(browser, args))?;
                Ok(Handled::Call)
            }
            ScriptMessage::HostCallback { id, args } => {
                let callback = self
                    .inner
                    .host_callbacks
                    .take(browser_id, id)
                    .ok_or(BridgeError::UnknownHostCallback(id))?;

                callback(args);
                Ok(Handled::HostCallback)
            }
        }
    }

    /// Drops everything kept for a browser that is going away.
    pub fn release(&self, browser: BrowserId) {
        if let Ok(mut released) = self.inner.released.lock() {
            released.insert(browser);
        }

        self.inner.host_callbacks.release(browser);

        if let Ok(mut readiness) = self.inner.readiness.lock()
            && let Some(readiness) = readiness.remove(&browser)
        {
            readiness.cancel();
        }
    }

    fn is_released(&self, browser: BrowserId) -> bool {
        self.inner
            .released
            .lock()
            .map(|released| released.contains(&browser))
            .unwrap_or(false)
    }

    fn decode(&self, browser: &BrowserRef, args: Vec<Value>) -> Vec<Argument> {
        args.into_iter()
            .map(|arg| match ipc::callback_id(&arg) {
                Some(id) => Argument::Callback(ScriptCallback {
                    id,
                    browser_id: browser.id(),
                    browser: Arc::downgrade(browser),
                    host_callbacks: self.inner.host_callbacks.clone(),
                }),
                None => Argument::Value(arg),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::testing::FakeBrowser;

    fn echo(_: &CallContext, args: Vec<Argument>) -> Result<(), BridgeError> {
        let mut args = args.into_iter();
        let text = args
            .next()
            .and_then(|arg| arg.as_str().map(str::to_owned))
            .ok_or(BridgeError::InvalidArgument {
                name: "echo".to_owned(),
                index: 0,
                reason: "expected a string",
            })?;
        let callback = args
            .next()
            .and_then(Argument::into_callback)
            .ok_or(BridgeError::InvalidArgument {
                name: "echo".to_owned(),
                index: 1,
                reason: "expected a callback",
            })?;

        callback.call(vec![Value::String(text)]);
        Ok(())
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl HostObject for Arc<Recorder> {
        fn methods(&self) -> &[&'static str] {
            &["record"]
        }

        fn call(
            &self,
            method: &str,
            _context: &CallContext,
            args: Vec<Argument>,
        ) -> Result<(), BridgeError> {
            self.calls.lock().unwrap().push((method.to_owned(), args.len()));
            Ok(())
        }
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = BindingTable::builder()
            .function("shared", echo)
            .property("shared", 1)
            .build();

        assert_eq!(
            result.err(),
            Some(BridgeError::DuplicateName("shared".to_owned()))
        );
    }

    #[test]
    fn script_callback_is_invoked_once_with_exact_value() {
        let table = BindingTable::builder().function("echo", echo).build().unwrap();
        let bridge = Bridge::attach(table);
        let fake = FakeBrowser::new(1);
        let browser: BrowserRef = fake.clone();

        let handled = bridge
            .handle_message(
                &browser,
                r#"{"kind":"call","name":"echo","args":["héllo \"world\"",{"$callback":9}]}"#,
            )
            .unwrap();

        assert_eq!(handled, Handled::Call);
        let scripts = fake.scripts();
        assert_eq!(scripts.len(), 1);
        assert_eq!(
            scripts[0],
            ipc::invoke_callback_script(9, &[json!("héllo \"world\"")])
        );
    }

    #[test]
    fn host_callback_round_trip() {
        let received = Arc::new(Mutex::new(None));
        let sink = received.clone();
        let table = BindingTable::builder()
            .function(
                "ask",
                move |_: &CallContext, args: Vec<Argument>| -> Result<(), BridgeError> {
                    let sink = sink.clone();
                    if let Some(callback) = args.into_iter().find_map(Argument::into_callback) {
                        callback.call_with_reply(vec![json!("question")], move |reply| {
                            *sink.lock().unwrap() = reply.into_iter().next();
                        });
                    }
                    Ok(())
                },
            )
            .build()
            .unwrap();
        let bridge = Bridge::attach(table);
        let fake = FakeBrowser::new(2);
        let browser: BrowserRef = fake.clone();

        bridge
            .handle_message(&browser, r#"{"kind":"call","name":"ask","args":[{"$callback":1}]}"#)
            .unwrap();
        assert_eq!(bridge.pending_host_callbacks(), 1);
        assert_eq!(
            fake.scripts()[0],
            ipc::invoke_callback_script(1, &[json!("question"), json!({"$host": 1})])
        );

        let handled = bridge
            .handle_message(&browser, r#"{"kind":"host_callback","id":1,"args":["answer"]}"#)
            .unwrap();

        assert_eq!(handled, Handled::HostCallback);
        assert_eq!(*received.lock().unwrap(), Some(json!("answer")));
        assert_eq!(bridge.pending_host_callbacks(), 0);
        assert_eq!(
            bridge.handle_message(&browser, r#"{"kind":"host_callback","id":1}"#),
            Err(BridgeError::UnknownHostCallback(1))
        );
    }

    #[test]
    fn object_methods_are_checked() {
        let recorder = Arc::new(Recorder::default());
        let table = BindingTable::builder()
            .object("external", recorder.clone())
            .build()
            .unwrap();
        let bridge = Bridge::attach(table);
        let browser: BrowserRef = FakeBrowser::new(3);

        bridge
            .handle_message(
                &browser,
                r#"{"kind":"method","object":"external","method":"record","args":[1,2]}"#,
            )
            .unwrap();
        let missing = bridge.handle_message(
            &browser,
            r#"{"kind":"method","object":"external","method":"erase"}"#,
        );
        let unknown = bridge.handle_message(
            &browser,
            r#"{"kind":"method","object":"internal","method":"record"}"#,
        );

        assert_eq!(*recorder.calls.lock().unwrap(), vec![("record".to_owned(), 2)]);
        assert_eq!(
            missing,
            Err(BridgeError::UnknownMethod {
                object: "external".to_owned(),
                method: "erase".to_owned(),
            })
        );
        assert_eq!(unknown, Err(BridgeError::UnknownObject("internal".to_owned())));
    }

    #[test]
    fn ready_message_signals_readiness() {
        let bridge = Bridge::attach(BindingTable::builder().build().unwrap());
        let browser: BrowserRef = FakeBrowser::new(4);
        let readiness = bridge.readiness(browser.id());

        assert!(!readiness.is_ready());
        assert_eq!(
            bridge.handle_message(&browser, r#"{"kind":"ready"}"#),
            Ok(Handled::Ready)
        );
        assert!(readiness.is_ready());
    }

    #[test]
    fn release_forgets_browser_state() {
        let table = BindingTable::builder()
            .function(
                "ask",
                |_: &CallContext, args: Vec<Argument>| -> Result<(), BridgeError> {
                    if let Some(callback) = args.into_iter().find_map(Argument::into_callback) {
                        callback.call_with_reply(vec![], |_| {});
                    }
                    Ok(())
                },
            )
            .build()
            .unwrap();
        let bridge = Bridge::attach(table);
        let browser: BrowserRef = FakeBrowser::new(5);

        bridge
            .handle_message(&browser, r#"{"kind":"call","name":"ask","args":[{"$callback":1}]}"#)
            .unwrap();
        let readiness = bridge.readiness(browser.id());
        bridge.release(browser.id());

        assert_eq!(bridge.pending_host_callbacks(), 0);
        assert!(!futures::executor::block_on(readiness.wait()));
    }

    #[test]
    fn late_work_for_released_browser_is_not_kept() {
        let bridge = Bridge::attach(BindingTable::builder().build().unwrap());
        let browser: BrowserRef = FakeBrowser::new(7);
        let ran = Arc::new(AtomicU64::new(0));

        bridge.release(browser.id());

        let counter = ran.clone();
        bridge.readiness(browser.id()).when_ready(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        bridge
            .handle_message(&browser, r#"{"kind":"ready"}"#)
            .unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(bridge.inner.readiness.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_function_is_an_error() {
        let bridge = Bridge::attach(BindingTable::builder().build().unwrap());
        let browser: BrowserRef = FakeBrowser::new(6);

        assert_eq!(
            bridge.handle_message(&browser, r#"{"kind":"call","name":"missing"}"#),
            Err(BridgeError::UnknownFunction("missing".to_owned()))
        );
    }
}
