//! Coercion and asynchronous invocation of remote callables.
//!
//! The [`Dispatcher`] turns a bound value vector into [`CallValue`]s using the
//! subcommand's declared types and hands the call to the [`ScriptRuntime`].
//! Submission is synchronous and returns a [`DispatchHandle`]; the runtime
//! answers later, from any thread, through the [`ReplySlot`] it was given.
//!
//! ```text
//! bound values ──coerce──▶ RemoteCall ──invoke──▶ ScriptRuntime
//!                                                      │
//! DispatchHandle ◀──────────── ReplySlot::resolve ◀────┘
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{Level, debug, span};

use crate::error::{DispatchError, DispatchResult, RemoteError};
use crate::host::ConsoleHost;
use crate::schema::{ArgType, Argument, Subcommand};
use crate::value::{CallValue, ObjectHandle, ObjectRef, ReturnValue, Target};

/// Literal that coerces to [`CallValue::None`] whatever the declared type.
pub const NONE_LITERAL: &str = "none";

// =============================================================================
// Collaborators
// =============================================================================

/// One call to a remote callable.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub namespace: String,
    pub callable: String,
    pub args: Vec<CallValue>,
}

/// The remote scripting runtime.
pub trait ScriptRuntime: Send + Sync {
    /// Submits a call without waiting for it to run.
    ///
    /// On `Ok`, the runtime must eventually consume `reply` exactly once
    /// (dropping it counts as abandoning the call). On `Err` the call was not
    /// made and `reply` is dropped unused.
    fn invoke(&self, call: RemoteCall, reply: ReplySlot) -> Result<(), RemoteError>;
}

/// Resolves textual object references to live host objects.
pub trait ObjectResolver: Send + Sync {
    /// Returns `None` if no object of type `type_tag` matches.
    fn resolve(&self, reference: ObjectRef<'_>, type_tag: &str) -> Option<ObjectHandle>;
}

/// Resolver for hosts without objects; everything degrades to none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObjects;

impl ObjectResolver for NoObjects {
    fn resolve(&self, _reference: ObjectRef<'_>, _type_tag: &str) -> Option<ObjectHandle> {
        None
    }
}

// =============================================================================
// Reply plumbing
// =============================================================================

type Reply = Result<ReturnValue, RemoteError>;

/// Single-use answer channel for one dispatched call.
#[derive(Debug)]
pub struct ReplySlot(oneshot::Sender<Reply>);

impl ReplySlot {
    /// Delivers the callable's return value.
    pub fn resolve(self, value: ReturnValue) {
        let _ = self.0.send(Ok(value));
    }

    /// Reports that the call failed on the remote side.
    pub fn reject(self, error: RemoteError) {
        let _ = self.0.send(Err(error));
    }

    /// Returns `true` if nobody is waiting for the answer any more.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Resolves once with the rendered result of a dispatched call.
#[derive(Debug)]
#[must_use = "the call result is only observable through the handle"]
pub struct DispatchHandle {
    rx: oneshot::Receiver<Reply>,
}

impl DispatchHandle {
    /// Creates a connected slot/handle pair.
    pub fn channel() -> (ReplySlot, DispatchHandle) {
        let (tx, rx) = oneshot::channel();
        (ReplySlot(tx), DispatchHandle { rx })
    }

    /// Waits for the raw return value instead of its text.
    pub async fn value(self) -> DispatchResult<ReturnValue> {
        match self.rx.await {
            Ok(reply) => reply.map_err(DispatchError::from),
            Err(_) => Err(DispatchError::Abandoned),
        }
    }
}

impl Future for DispatchHandle {
    type Output = DispatchResult<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.rx.poll_unpin(cx).map(|received| match received {
            Ok(Ok(value)) => Ok(value.render()),
            Ok(Err(e)) => Err(DispatchError::Remote(e)),
            Err(_) => Err(DispatchError::Abandoned),
        })
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Coerces bound values and submits calls to the script runtime.
#[derive(Clone)]
pub struct Dispatcher {
    runtime: Arc<dyn ScriptRuntime>,
    resolver: Arc<dyn ObjectResolver>,
    host: Arc<dyn ConsoleHost>,
}

impl Dispatcher {
    pub fn new(
        runtime: Arc<dyn ScriptRuntime>,
        resolver: Arc<dyn ObjectResolver>,
        host: Arc<dyn ConsoleHost>,
    ) -> Self {
        Self {
            runtime,
            resolver,
            host,
        }
    }

    /// The host this dispatcher signals.
    pub fn host(&self) -> &Arc<dyn ConsoleHost> {
        &self.host
    }

    /// Converts one bound string into a typed call value.
    ///
    /// Object references that cannot be resolved become [`CallValue::None`].
    pub fn coerce(
        &self,
        arg: &Argument,
        value: &str,
        target: Option<&Target>,
    ) -> DispatchResult<CallValue> {
        if value == NONE_LITERAL {
            return Ok(CallValue::None);
        }

        let coerced = match arg.kind {
            ArgType::Int => value
                .trim()
                .parse::<i32>()
                .map(CallValue::Int)
                .map_err(|_| DispatchError::coercion(arg.display_name(), value, arg.kind))?,
            ArgType::Float => value
                .trim()
                .parse::<f32>()
                .map(CallValue::Float)
                .map_err(|_| DispatchError::coercion(arg.display_name(), value, arg.kind))?,
            ArgType::Bool => CallValue::Bool(matches!(value, "1" | "true" | "TRUE")),
            ArgType::String => CallValue::String(value.to_string()),
            ArgType::Object => self.resolve_object(arg, value, target),
        };
        Ok(coerced)
    }

    fn resolve_object(&self, arg: &Argument, value: &str, target: Option<&Target>) -> CallValue {
        let reference = match target {
            Some(target) if arg.selected && target.identifier == value => {
                Some(ObjectRef::Selected(target))
            }
            _ => ObjectRef::parse(value),
        };

        match reference.and_then(|r| self.resolver.resolve(r, &arg.raw_type)) {
            Some(handle) => CallValue::Object(handle),
            None => {
                debug!(argument = %arg.name, value = %value, type_tag = %arg.raw_type, "Object not resolved, passing none");
                CallValue::None
            }
        }
    }

    /// Coerces every slot, failing on the first malformed literal.
    ///
    /// `values` must hold exactly one entry per argument slot.
    pub fn coerce_all(
        &self,
        args: &[Argument],
        values: &[String],
        target: Option<&Target>,
    ) -> DispatchResult<Vec<CallValue>> {
        if values.len() != args.len() {
            return Err(DispatchError::Arity {
                expected: args.len(),
                actual: values.len(),
            });
        }
        args.iter()
            .zip(values)
            .map(|(arg, value)| self.coerce(arg, value, target))
            .collect()
    }

    /// Submits `sub`'s callable in `namespace` with the bound `values`.
    ///
    /// Returns once the call is handed over; the result arrives through the
    /// returned handle. If the subcommand closes the input surface, the host
    /// is told so before the call is submitted.
    pub fn dispatch(
        &self,
        namespace: &str,
        sub: &Subcommand,
        values: &[String],
        target: Option<&Target>,
    ) -> DispatchResult<DispatchHandle> {
        let span = span!(Level::DEBUG, "dispatch", namespace = %namespace, callable = %sub.func);
        let _enter = span.enter();

        let args = self.coerce_all(sub.args(), values, target)?;
        let call = RemoteCall {
            namespace: namespace.to_string(),
            callable: sub.func.clone(),
            args,
        };

        if sub.close {
            self.host.close_input();
        }

        debug!(args = ?call.args, "Invoking remote callable");
        let (reply, handle) = DispatchHandle::channel();
        self.runtime.invoke(call, reply)?;
        Ok(handle)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::schema::tests::{arg, sub};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records calls and answers them on a separate thread.
    #[derive(Default)]
    pub(crate) struct MockRuntime {
        pub calls: Mutex<Vec<RemoteCall>>,
        pub answer: Mutex<Option<Reply>>,
    }

    impl MockRuntime {
        pub(crate) fn answering(reply: Reply) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                answer: Mutex::new(Some(reply)),
            }
        }
    }

    impl ScriptRuntime for MockRuntime {
        fn invoke(&self, call: RemoteCall, reply: ReplySlot) -> Result<(), RemoteError> {
            if call.callable == "Missing" {
                return Err(RemoteError::NotFound {
                    namespace: call.namespace,
                    callable: call.callable,
                });
            }
            self.calls.lock().push(call);
            let answer = self.answer.lock().clone();
            std::thread::spawn(move || match answer {
                Some(Ok(value)) => reply.resolve(value),
                Some(Err(e)) => reply.reject(e),
                None => drop(reply),
            });
            Ok(())
        }
    }

    /// Knows one actor by name and one by qualified id; the selection is id 0x14.
    pub(crate) struct MockResolver;

    impl ObjectResolver for MockResolver {
        fn resolve(&self, reference: ObjectRef<'_>, type_tag: &str) -> Option<ObjectHandle> {
            match reference {
                ObjectRef::Selected(_) => Some(ObjectHandle::new(0x14, type_tag)),
                ObjectRef::Symbol("Lydia") => Some(ObjectHandle::new(0xA2C94, type_tag)),
                ObjectRef::Qualified { id, origin: "Skyrim.esm" } => {
                    Some(ObjectHandle::new(id, type_tag))
                }
                _ => None,
            }
        }
    }

    #[derive(Default)]
    pub(crate) struct MockHost {
        pub printed: Mutex<Vec<String>>,
        pub closed: AtomicUsize,
    }

    impl ConsoleHost for MockHost {
        fn print(&self, text: String) {
            self.printed.lock().push(text);
        }

        fn close_input(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn dispatcher(runtime: Arc<MockRuntime>, host: Arc<MockHost>) -> Dispatcher {
        Dispatcher::new(runtime, Arc::new(MockResolver), host)
    }

    fn simple() -> Dispatcher {
        dispatcher(
            Arc::new(MockRuntime::default()),
            Arc::new(MockHost::default()),
        )
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_none_literal_for_every_type() {
        let d = simple();
        for kind in [
            ArgType::Int,
            ArgType::Bool,
            ArgType::Float,
            ArgType::String,
            ArgType::Object,
        ] {
            assert_eq!(d.coerce(&arg("x", kind), "none", None), Ok(CallValue::None));
        }
    }

    #[test]
    fn test_coerce_primitives() {
        let d = simple();
        assert_eq!(d.coerce(&arg("n", ArgType::Int), "-7", None), Ok(CallValue::Int(-7)));
        assert_eq!(
            d.coerce(&arg("f", ArgType::Float), "-.5", None),
            Ok(CallValue::Float(-0.5))
        );
        assert_eq!(
            d.coerce(&arg("s", ArgType::String), "a b", None),
            Ok(CallValue::String("a b".into()))
        );
    }

    #[test]
    fn test_coerce_bool_literals() {
        let d = simple();
        let b = arg("b", ArgType::Bool);
        for truthy in ["1", "true", "TRUE"] {
            assert_eq!(d.coerce(&b, truthy, None), Ok(CallValue::Bool(true)));
        }
        for falsy in ["0", "false", "True", "yes", ""] {
            assert_eq!(d.coerce(&b, falsy, None), Ok(CallValue::Bool(false)));
        }
    }

    #[test]
    fn test_malformed_int_fails() {
        let d = simple();
        assert_eq!(
            d.coerce(&arg("--count", ArgType::Int), "three", None),
            Err(DispatchError::Coercion {
                argument: "count".into(),
                value: "three".into(),
                kind: ArgType::Int,
            })
        );
    }

    #[test]
    fn test_object_resolution() {
        let d = simple();
        let mut who = arg("--who", ArgType::Object);
        who.raw_type = "actor".into();

        assert_eq!(
            d.coerce(&who, "Lydia", None),
            Ok(CallValue::Object(ObjectHandle::new(0xA2C94, "actor")))
        );
        assert_eq!(
            d.coerce(&who, "1A|Skyrim.esm", None),
            Ok(CallValue::Object(ObjectHandle::new(0x1A, "actor")))
        );
        assert_eq!(d.coerce(&who, "Nobody", None), Ok(CallValue::None));
        assert_eq!(d.coerce(&who, "xyz|Skyrim.esm", None), Ok(CallValue::None));
    }

    #[test]
    fn test_selected_object_uses_target() {
        let d = simple();
        let mut who = arg("--who", ArgType::Object);
        who.selected = true;
        who.raw_type = "actor".into();
        let target = Target::new("14|Skyrim.esm");

        assert_eq!(
            d.coerce(&who, "14|Skyrim.esm", Some(&target)),
            Ok(CallValue::Object(ObjectHandle::new(0x14, "actor")))
        );
        // An explicit value overrides the selection.
        assert_eq!(
            d.coerce(&who, "Lydia", Some(&target)),
            Ok(CallValue::Object(ObjectHandle::new(0xA2C94, "actor")))
        );
    }

    #[tokio::test]
    async fn test_dispatch_resolves_once() {
        let runtime = Arc::new(MockRuntime::answering(Ok(ReturnValue::Int(42))));
        let host = Arc::new(MockHost::default());
        let d = dispatcher(Arc::clone(&runtime), Arc::clone(&host));
        let s = sub(vec![arg("amount", ArgType::Int), arg("--msg", ArgType::String)]);

        let handle = d
            .dispatch("C3Script", &s, &strings(&["5", "hi"]), None)
            .unwrap();
        assert_eq!(handle.await, Ok("42".to_string()));

        let calls = runtime.calls.lock();
        assert_eq!(
            calls.as_slice(),
            &[RemoteCall {
                namespace: "C3Script".into(),
                callable: "Func".into(),
                args: vec![CallValue::Int(5), CallValue::String("hi".into())],
            }]
        );
        assert_eq!(host.closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_close_signalled_on_dispatch() {
        let runtime = Arc::new(MockRuntime::answering(Ok(ReturnValue::None)));
        let host = Arc::new(MockHost::default());
        let d = dispatcher(runtime, Arc::clone(&host));
        let mut s = sub(vec![]);
        s.close = true;

        let handle = d.dispatch("C3Script", &s, &[], None).unwrap();
        assert_eq!(host.closed.load(Ordering::SeqCst), 1);
        assert_eq!(handle.await, Ok("none".to_string()));
    }

    #[test]
    fn test_coercion_failure_makes_no_call() {
        let runtime = Arc::new(MockRuntime::default());
        let host = Arc::new(MockHost::default());
        let d = dispatcher(Arc::clone(&runtime), Arc::clone(&host));
        let mut s = sub(vec![arg("amount", ArgType::Int)]);
        s.close = true;

        let result = d.dispatch("C3Script", &s, &strings(&["lots"]), None);
        assert!(matches!(result, Err(DispatchError::Coercion { .. })));
        assert!(runtime.calls.lock().is_empty());
        assert_eq!(host.closed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_value_count_must_match_slots() {
        let runtime = Arc::new(MockRuntime::default());
        let d = dispatcher(Arc::clone(&runtime), Arc::new(MockHost::default()));
        let s = sub(vec![arg("a", ArgType::Int), arg("--b", ArgType::Int)]);

        let result = d.dispatch("NS", &s, &strings(&["5"]), None);
        assert!(matches!(
            result,
            Err(DispatchError::Arity { expected: 2, actual: 1 })
        ));
        let result = d.dispatch("NS", &s, &strings(&["5", "6", "7"]), None);
        assert!(matches!(
            result,
            Err(DispatchError::Arity { expected: 2, actual: 3 })
        ));
        assert!(runtime.calls.lock().is_empty());
    }

    #[test]
    fn test_synchronous_remote_failure() {
        let d = simple();
        let mut s = sub(vec![]);
        s.func = "Missing".into();
        assert_eq!(
            d.dispatch("C3Script", &s, &[], None).unwrap_err(),
            DispatchError::Remote(RemoteError::NotFound {
                namespace: "C3Script".into(),
                callable: "Missing".into(),
            })
        );
    }

    #[tokio::test]
    async fn test_remote_rejection_and_abandonment() {
        let s = sub(vec![]);

        let rejecting = dispatcher(
            Arc::new(MockRuntime::answering(Err(RemoteError::rejected("stack overflow")))),
            Arc::new(MockHost::default()),
        );
        let handle = rejecting.dispatch("C3Script", &s, &[], None).unwrap();
        assert_eq!(
            handle.await,
            Err(DispatchError::Remote(RemoteError::rejected("stack overflow")))
        );

        let silent = simple();
        let handle = silent.dispatch("C3Script", &s, &[], None).unwrap();
        assert_eq!(handle.await, Err(DispatchError::Abandoned));
    }

    #[test]
    fn test_handle_pending_until_reply() {
        let (slot, handle) = DispatchHandle::channel();
        let mut task = tokio_test::task::spawn(handle);
        tokio_test::assert_pending!(task.poll());

        slot.resolve(ReturnValue::String("done".into()));
        assert!(task.is_woken());
        tokio_test::assert_ready_eq!(task.poll(), Ok("done".to_string()));
    }

    #[test]
    fn test_raw_value() {
        let (slot, handle) = DispatchHandle::channel();
        slot.resolve(ReturnValue::Float(2.5));
        assert_eq!(
            tokio_test::block_on(handle.value()),
            Ok(ReturnValue::Float(2.5))
        );
    }
}
