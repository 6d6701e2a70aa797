//! Page-level event plumbing.
//!
//! The `PageBus` maps a container selector or a dynamic element kind to the
//! ordered list of handlers interested in it, and carries page-wide signals.
//! It only dispatches; scheduling belongs to whoever awaits the returned
//! tasks.

use crate::view::{PopupHandle, RowHandle};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

/// Unit of work produced by a handler, awaited on the local task set.
pub type LocalTask = Pin<Box<dyn Future<Output = ()>>>;

/// User-activated control (retry, compute PP, deep info...).
pub type Action = Rc<dyn Fn() -> LocalTask>;

/// Receives rows added under a watched container.
pub type RowsHandler = Rc<dyn Fn(Vec<RowHandle>) -> LocalTask>;

/// Receives a freshly mounted dynamic element.
pub type PopupHandler = Rc<dyn Fn(PopupHandle) -> LocalTask>;

/// Receives the raw beatmap id of an activated difficulty selector.
pub type SwitchHandler = Rc<dyn Fn(String) -> LocalTask>;

pub type SignalListener = Rc<dyn Fn(PageSignal)>;

/// Page-wide signals without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageSignal {
    /// Asks the host to reinitialize provider state.
    ReloadExtensionRequested,
}

impl PageSignal {
    pub fn name(self) -> &'static str {
        match self {
            PageSignal::ReloadExtensionRequested => "reloadExtensionRequested",
        }
    }
}

/// Wraps a future into a [`LocalTask`].
pub fn task(future: impl Future<Output = ()> + 'static) -> LocalTask {
    Box::pin(future)
}

#[derive(Default)]
pub struct PageBus {
    additions: RefCell<HashMap<String, Vec<RowsHandler>>>,
    elements: RefCell<HashMap<String, Vec<PopupHandler>>>,
    listeners: RefCell<Vec<SignalListener>>,
}

impl PageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watches direct child additions of `selector`.
    pub fn subscribe_additions(&self, selector: &str, handler: RowsHandler) {
        self.additions
            .borrow_mut()
            .entry(selector.to_string())
            .or_default()
            .push(handler);
    }

    /// Watches mounts of elements matching `kind`.
    pub fn subscribe_element(&self, kind: &str, handler: PopupHandler) {
        self.elements
            .borrow_mut()
            .entry(kind.to_string())
            .or_default()
            .push(handler);
    }

    pub fn listen(&self, listener: SignalListener) {
        self.listeners.borrow_mut().push(listener);
    }

    /// Runs every addition handler for `selector`, in subscription order.
    pub fn notify_additions(&self, selector: &str, rows: Vec<RowHandle>) -> LocalTask {
        let handlers = self
            .additions
            .borrow()
            .get(selector)
            .cloned()
            .unwrap_or_default();
        task(async move {
            for handler in handlers {
                handler(rows.clone()).await;
            }
        })
    }

    pub fn notify_element(&self, kind: &str, popup: PopupHandle) -> LocalTask {
        let handlers = self.elements.borrow().get(kind).cloned().unwrap_or_default();
        task(async move {
            for handler in handlers {
                handler(popup).await;
            }
        })
    }

    pub fn dispatch(&self, signal: PageSignal) {
        log::debug!("BUS: dispatching {}", signal.name());
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(signal);
        }
    }

    #[cfg(test)]
    /// Number of standing subscriptions (additions and elements).
    pub fn subscription_count(&self) -> usize {
        self.additions.borrow().values().map(Vec::len).sum::<usize>()
            + self.elements.borrow().values().map(Vec::len).sum::<usize>()
    }
}
