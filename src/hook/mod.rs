//! Behavior-preserving hooks around named host operations.
//!
//! A host that does not emit lifecycle events exposes its operations through
//! an [`OperationTable`]. Installing a hook swaps the named entry for a wrapper
//! that:
//! 1. runs the instrumentation with the same arguments and read access to the host,
//! 2. logs and swallows any instrumentation error or panic,
//! 3. calls the original with the same arguments and the same `&mut` host,
//! 4. returns the original's result untouched, errors included.
//!
//! Installing twice chains wrappers. [`attach`] installs each hook exactly once.

pub mod ops;

pub use ops::{attach, AttachSummary, HookPoint};

use crate::model::error::{HookError, HostError, InstrumentError};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, warn};

/// A host operation. `H` is the host state every call runs against.
pub type Operation<H> = Box<dyn FnMut(&mut H, &[Value]) -> Result<Value, HostError>>;

/// Named, replaceable host operations.
pub struct OperationTable<H> {
    ops: HashMap<String, Operation<H>>,
}

impl<H> Default for OperationTable<H> {
    fn default() -> Self {
        Self {
            ops: HashMap::new(),
        }
    }
}

impl<H> fmt::Debug for OperationTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.ops.keys().collect();
        names.sort();
        f.debug_struct("OperationTable")
            .field("operations", &names)
            .finish()
    }
}

impl<H: 'static> OperationTable<H> {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an operation.
    pub fn register<F>(&mut self, name: impl Into<String>, op: F)
    where
        F: FnMut(&mut H, &[Value]) -> Result<Value, HostError> + 'static,
    {
        self.ops.insert(name.into(), Box::new(op));
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Invoke `name` against `host`.
    ///
    /// # Errors
    ///
    /// `HostError::UnknownOperation` if nothing is registered under `name`,
    /// otherwise whatever the operation itself returns.
    pub fn call(&mut self, host: &mut H, name: &str, args: &[Value]) -> Result<Value, HostError> {
        let op = self
            .ops
            .get_mut(name)
            .ok_or_else(|| HostError::UnknownOperation(name.to_string()))?;
        op(host, args)
    }

    /// Replace `name` with an instrumented wrapper around the current entry.
    ///
    /// # Errors
    ///
    /// `HookError::OperationMissing` if the host never registered `name`; the
    /// table is left unchanged.
    pub fn install_hook<I>(&mut self, name: &str, instrument: I) -> Result<(), HookError>
    where
        I: FnMut(&H, &[Value]) -> Result<(), InstrumentError> + 'static,
    {
        let original = self
            .ops
            .remove(name)
            .ok_or_else(|| HookError::OperationMissing(name.to_string()))?;
        self.ops
            .insert(name.to_string(), wrap(name, original, instrument));
        Ok(())
    }
}

/// Wrap `original` so `instrument` runs first and can never stop it from running.
pub fn wrap<H, I>(name: &str, mut original: Operation<H>, mut instrument: I) -> Operation<H>
where
    H: 'static,
    I: FnMut(&H, &[Value]) -> Result<(), InstrumentError> + 'static,
{
    let name = name.to_string();
    Box::new(move |host: &mut H, args: &[Value]| {
        run_isolated(&name, || instrument(&*host, args));
        original(host, args)
    })
}

/// Run instrumentation, containing errors and panics.
fn run_isolated<F>(operation: &str, f: F)
where
    F: FnOnce() -> Result<(), InstrumentError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            warn!(operation, error = %err, "Instrumentation failed; original operation unaffected");
        }
        Err(payload) => {
            error!(
                operation,
                panic = panic_message(payload.as_ref()),
                "Instrumentation panicked; original operation unaffected"
            );
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counter {
        calls: u32,
        last_args: Vec<Value>,
    }

    fn table() -> OperationTable<Counter> {
        let mut table = OperationTable::new();
        table.register("bump", |host: &mut Counter, args: &[Value]| {
            host.calls += 1;
            host.last_args = args.to_vec();
            Ok(json!(host.calls * 10))
        });
        table.register("explode", |_host: &mut Counter, _args: &[Value]| {
            Err(HostError::Failed {
                operation: "explode".to_string(),
                reason: "boom".to_string(),
            })
        });
        table
    }

    #[test]
    fn unknown_operation_is_a_host_error() {
        let mut table = table();
        let mut host = Counter::default();

        let result = table.call(&mut host, "missing", &[]);

        assert_eq!(result, Err(HostError::UnknownOperation("missing".to_string())));
    }

    #[test]
    fn hook_sees_args_and_host_before_original() {
        let mut table = table();
        let mut host = Counter::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in_hook = seen.clone();

        table
            .install_hook("bump", move |host: &Counter, args: &[Value]| {
                seen_in_hook
                    .borrow_mut()
                    .push((host.calls, args.to_vec()));
                Ok(())
            })
            .unwrap();

        let result = table.call(&mut host, "bump", &[json!(7)]).unwrap();

        assert_eq!(result, json!(10));
        assert_eq!(host.last_args, vec![json!(7)]);
        assert_eq!(*seen.borrow(), vec![(0, vec![json!(7)])]);
    }

    #[test]
    fn failing_instrumentation_does_not_suppress_original() {
        let mut table = table();
        let mut host = Counter::default();

        table
            .install_hook("bump", |_host: &Counter, _args: &[Value]| {
                Err(InstrumentError::MissingHostState { what: "moves" })
            })
            .unwrap();

        let result = table.call(&mut host, "bump", &[]);

        assert_eq!(result, Ok(json!(10)));
        assert_eq!(host.calls, 1);
    }

    #[test]
    fn panicking_instrumentation_does_not_suppress_original() {
        let mut table = table();
        let mut host = Counter::default();

        table
            .install_hook("bump", |_host: &Counter, _args: &[Value]| {
                panic!("instrumentation bug")
            })
            .unwrap();

        let result = table.call(&mut host, "bump", &[]);

        assert_eq!(result, Ok(json!(10)));
        assert_eq!(host.calls, 1);
    }

    #[test]
    fn host_errors_propagate_unchanged() {
        let mut table = table();
        let mut host = Counter::default();
        table
            .install_hook("explode", |_host: &Counter, _args: &[Value]| Ok(()))
            .unwrap();

        let result = table.call(&mut host, "explode", &[]);

        assert_eq!(
            result,
            Err(HostError::Failed {
                operation: "explode".to_string(),
                reason: "boom".to_string(),
            })
        );
    }

    #[test]
    fn installing_on_missing_operation_fails_softly() {
        let mut table = table();

        let result = table.install_hook("begin_reflex", |_host: &Counter, _args: &[Value]| Ok(()));

        assert_eq!(
            result,
            Err(HookError::OperationMissing("begin_reflex".to_string()))
        );
        assert!(!table.contains("begin_reflex"));
    }

    #[test]
    fn installing_twice_chains_wrappers() {
        let mut table = table();
        let mut host = Counter::default();
        let hits = Rc::new(RefCell::new(0));

        for _ in 0..2 {
            let hits = hits.clone();
            table
                .install_hook("bump", move |_host: &Counter, _args: &[Value]| {
                    *hits.borrow_mut() += 1;
                    Ok(())
                })
                .unwrap();
        }
        table.call(&mut host, "bump", &[]).unwrap();

        assert_eq!(*hits.borrow(), 2);
        assert_eq!(host.calls, 1);
    }
}
