//! Template Registry - Type name → blueprint, resolved along a type chain.
//!
//! Populate a registry once, then share it as `Rc<TemplateRegistry>`; the
//! shared handle is read-only, so no registration can race a lookup.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use super::Blueprint;
use crate::error::{BindError, Result};

#[derive(Debug, Default, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, Rc<Blueprint>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the blueprint for `type_name`.
    pub fn register(&mut self, type_name: &str, blueprint: Blueprint) -> &mut Self {
        self.templates.insert(type_name.to_string(), Rc::new(blueprint));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, type_name: &str, blueprint: Blueprint) -> Self {
        self.register(type_name, blueprint);
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.templates.contains_key(type_name)
    }

    pub fn get(&self, type_name: &str) -> Option<Rc<Blueprint>> {
        self.templates.get(type_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Walk `chain` most-derived first; the first registered name wins.
    ///
    /// Repeated calls with the same chain return the same `Rc`.
    pub fn resolve<S: AsRef<str>>(&self, chain: &[S]) -> Result<Rc<Blueprint>> {
        for name in chain {
            if let Some(blueprint) = self.templates.get(name.as_ref()) {
                trace!(template = name.as_ref(), "template resolved");
                return Ok(blueprint.clone());
            }
        }
        Err(BindError::TemplateNotFound {
            chain: chain.iter().map(|s| s.as_ref().to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TemplateRegistry {
        TemplateRegistry::new()
            .with("Message", Blueprint::new("div").class("message"))
            .with("Widget", Blueprint::new("div").class("widget"))
    }

    #[test]
    fn test_nearest_type_wins() {
        let registry = registry();

        let resolved = registry.resolve(&["MyMessage", "Message", "Widget"]).unwrap();
        assert_eq!(resolved.classes, vec!["message"]);

        let resolved = registry.resolve(&["User", "Widget"]).unwrap();
        assert_eq!(resolved.classes, vec!["widget"]);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let registry = registry();
        let chain = ["SysMessage", "Message", "Widget"];

        let first = registry.resolve(&chain).unwrap();
        let second = registry.resolve(&chain).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_exhausted_chain_fails() {
        let registry = registry();

        match registry.resolve(&["Ghost"]) {
            Err(BindError::TemplateNotFound { chain }) => assert_eq!(chain, vec!["Ghost"]),
            other => panic!("expected TemplateNotFound, got {other:?}"),
        }
        assert!(TemplateRegistry::new().resolve::<&str>(&[]).is_err());
    }
}
