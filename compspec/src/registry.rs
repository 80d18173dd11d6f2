//! Named functions callable from `@cand` and `@go_call`.
//!
//! Every function has the same shape: it receives the completion context
//! and the literal arguments from the spec line. A generator returns a
//! [`CandidateList`]; an action returns nothing and exists for its side
//! effects. Wrap plain closures with [`generator`] or [`action`] before
//! registering them.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::candidate::CandidateList;
use crate::error::{Error, Result};
use crate::functions;
use crate::interpreter::CompleteContext;

/// A registered function.
pub type Callback =
    Box<dyn Fn(&dyn CompleteContext, &[String]) -> Option<CandidateList> + Send + Sync>;

/// Wrap a candidate generator.
pub fn generator<F>(f: F) -> Callback
where
    F: Fn(&dyn CompleteContext, &[String]) -> CandidateList + Send + Sync + 'static,
{
    Box::new(move |ctx: &dyn CompleteContext, args: &[String]| Some(f(ctx, args)))
}

/// Wrap a side-effect-only function.
pub fn action<F>(f: F) -> Callback
where
    F: Fn(&dyn CompleteContext, &[String]) + Send + Sync + 'static,
{
    Box::new(move |ctx: &dyn CompleteContext, args: &[String]| {
        f(ctx, args);
        None
    })
}

/// Function table keyed by lowercased name.
#[derive(Default)]
pub struct Registry {
    functions: HashMap<String, Callback>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in functions (`takeFile`, `takeDir`,
    /// `takeAny`, `takeInteger`, `takeLines`, `takeCommandOutput`).
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        functions::register_builtins(&mut registry);
        registry
    }

    /// Register `f` under `name`. Names are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Registry`] if `name` is empty or already taken.
    pub fn register(&mut self, name: &str, f: Callback) -> Result<()> {
        if name.is_empty() {
            return Err(Error::Registry("function name must not be empty".to_string()));
        }
        let key = name.to_lowercase();
        if self.functions.contains_key(&key) {
            return Err(Error::Registry(format!("function \"{name}\" already defined")));
        }
        debug!(name, "registering function");
        self.functions.insert(key, f);
        Ok(())
    }

    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }

    /// Registered names (lowercased), sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Call the function registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Registry`] if no such function exists.
    pub fn invoke(
        &self,
        name: &str,
        ctx: &dyn CompleteContext,
        args: &[String],
    ) -> Result<Option<CandidateList>> {
        let f = self
            .functions
            .get(&name.to_lowercase())
            .ok_or_else(|| Error::Registry(format!("function \"{name}\" not defined")))?;
        debug!(name, ?args, "invoking function");
        Ok(f(ctx, args))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("functions", &self.names())
            .finish()
    }
}
