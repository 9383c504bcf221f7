use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use once_cell::unsync::OnceCell;

use super::Registration;
use crate::container::Container;
use crate::descriptors::Instance;
use crate::internal::ResolutionPath;
use crate::key::ServiceKey;
use crate::DiResult;

pub(crate) type Render = Box<dyn Fn() -> String>;

/// Returns a pre-built object.
pub(crate) struct InstanceRegistration {
    key: ServiceKey,
    instance: Instance,
    render: Render,
    text: OnceCell<String>,
}

impl InstanceRegistration {
    pub(crate) fn new(key: ServiceKey, instance: Instance, render: Render) -> Self {
        Self {
            key,
            instance,
            render,
            text: OnceCell::new(),
        }
    }
}

/// Runs `render` with the panic hook silenced, turning a panic into its message.
fn render_quietly(render: &Render) -> String {
    let silenced = !thread::panicking();
    let hook = if silenced {
        let hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        Some(hook)
    } else {
        None
    };
    let result = panic::catch_unwind(AssertUnwindSafe(|| render()));
    if let Some(hook) = hook {
        panic::set_hook(hook);
    }

    match result {
        Ok(text) => text,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<rendering failed>".to_string()),
    }
}

impl Registration for InstanceRegistration {
    fn key(&self) -> &ServiceKey {
        &self.key
    }

    fn resolve(&self, _: &Container, _: &ServiceKey, _: &ResolutionPath) -> DiResult<Instance> {
        Ok(self.instance.clone())
    }
}

impl fmt::Display for InstanceRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.text.get_or_init(|| render_quietly(&self.render));
        write!(f, "Instance: {text}")
    }
}
