//! Named actions and the registry that dispatches to them
//!
//! Rules refer to actions by string name. An action registered from an instance or a
//! type is stored under its type's own name (see [`action_name`]), which is also the name
//! [`Rule::on_success_action`](crate::Rule::on_success_action) and friends write into the
//! rule, so the two sides always agree.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::error::DuplicateActionError;
use crate::rule::Context;

/// A side-effecting handler triggered by a rule outcome
///
/// Actions receive the input mutably; later rules in the same workflow see whatever an
/// action changed.
pub trait Action<T: ?Sized>: Send + Sync {
    fn handle(&self, input: &mut T, context: &Context);
}

/// Adapts a closure into an [`Action`]
struct FnAction<F>(F);

impl<T: ?Sized, F> Action<T> for FnAction<F>
where
    F: Fn(&mut T, &Context) + Send + Sync,
{
    fn handle(&self, input: &mut T, context: &Context) {
        (self.0)(input, context)
    }
}

/// The name an action type is registered under: its own type name without module path
/// or generic arguments (`my_app::actions::AddDiscount<Cart>` becomes `AddDiscount`).
pub fn action_name<A: ?Sized>() -> &'static str {
    let full = std::any::type_name::<A>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Name-to-handler mapping, filled by the host before evaluation
pub struct ActionRegistry<T: ?Sized> {
    actions: HashMap<String, Box<dyn Action<T>>>,
}

impl<T: ?Sized> ActionRegistry<T> {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Register `action` under `name`; an existing registration is never replaced
    pub fn register(
        &mut self,
        name: impl Into<String>,
        action: impl Action<T> + 'static,
    ) -> Result<(), DuplicateActionError> {
        self.register_boxed(name.into(), Box::new(action))
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, handler: F) -> Result<(), DuplicateActionError>
    where
        F: Fn(&mut T, &Context) + Send + Sync + 'static,
    {
        self.register_boxed(name.into(), Box::new(FnAction(handler)))
    }

    fn register_boxed(&mut self, name: String, action: Box<dyn Action<T>>) -> Result<(), DuplicateActionError> {
        use std::collections::hash_map::Entry;

        match self.actions.entry(name) {
            Entry::Occupied(entry) => Err(DuplicateActionError {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                trace!(action = %entry.key(), "registered action");
                entry.insert(action);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Action<T>> {
        self.actions.get(name).map(|action| action.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Invoke the action registered under `name`, if any. Returns whether one ran.
    pub fn dispatch(&self, name: &str, input: &mut T, context: &Context) -> bool {
        match self.get(name) {
            Some(action) => {
                action.handle(input, context);
                true
            }
            None => {
                trace!(action = name, "action not registered, skipping");
                false
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<T: ?Sized> Default for ActionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for ActionRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ActionRegistry").field("actions", &names).finish()
    }
}
