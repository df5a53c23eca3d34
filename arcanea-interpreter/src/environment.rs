//! Scoped variable environment
//!
//! Scopes live in an arena owned by the [`Environment`] and refer to their
//! enclosing scope by index. Children point at parents, never the reverse.

use arcanea_core::InterpreterError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Index of a scope inside its [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Built-in functions bound in the global scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Builtin {
    Cast,
    Summon,
    Transform,
    Envision,
    Manifest,
}

impl Builtin {
    pub const ALL: [Builtin; 5] = [
        Builtin::Cast,
        Builtin::Summon,
        Builtin::Transform,
        Builtin::Envision,
        Builtin::Manifest,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Cast => "cast",
            Builtin::Summon => "summon",
            Builtin::Transform => "transform",
            Builtin::Envision => "envision",
            Builtin::Manifest => "manifest",
        }
    }
}

/// A value bound to a name.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Value(Value),
    Builtin(Builtin),
}

impl Binding {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Binding::Value(v) => Some(v),
            Binding::Builtin(_) => None,
        }
    }
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        Binding::Value(value)
    }
}

#[derive(Debug, Clone, Default)]
struct Scope {
    values: HashMap<String, Binding>,
    parent: Option<ScopeId>,
}

/// Arena of scopes. Scope 0 is the global scope and always exists.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Environment with every [`Builtin`] bound in the global scope.
    pub fn with_builtins() -> Self {
        let mut env = Self::new();
        let global = env.global();
        for builtin in Builtin::ALL {
            env.define(global, builtin.name(), Binding::Builtin(builtin));
        }
        env
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Open a child scope enclosed by `parent`.
    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            values: HashMap::new(),
            parent: Some(parent),
        });
        id
    }

    pub fn parent_of(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.get(scope.0).and_then(|s| s.parent)
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Bind `name` in `scope` only, replacing any existing binding there.
    pub fn define(&mut self, scope: ScopeId, name: impl Into<String>, binding: impl Into<Binding>) {
        if let Some(s) = self.scopes.get_mut(scope.0) {
            s.values.insert(name.into(), binding.into());
        }
    }

    /// Resolve `name`, walking outward from `scope`.
    pub fn get(&self, scope: ScopeId, name: &str) -> Result<&Binding, InterpreterError> {
        let owner = self.resolve(scope, name).ok_or_else(|| undefined(name))?;
        self.scopes[owner.0]
            .values
            .get(name)
            .ok_or_else(|| undefined(name))
    }

    /// Rebind an existing name in the nearest scope that holds it.
    pub fn assign(
        &mut self,
        scope: ScopeId,
        name: &str,
        binding: impl Into<Binding>,
    ) -> Result<(), InterpreterError> {
        let owner = self.resolve(scope, name).ok_or_else(|| undefined(name))?;
        if let Some(slot) = self.scopes[owner.0].values.get_mut(name) {
            *slot = binding.into();
        }
        Ok(())
    }

    pub fn contains(&self, scope: ScopeId, name: &str) -> bool {
        self.resolve(scope, name).is_some()
    }

    fn resolve(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scopes.get(id.0)?;
            if s.values.contains_key(name) {
                return Some(id);
            }
            current = s.parent;
        }
        None
    }
}

fn undefined(name: &str) -> InterpreterError {
    InterpreterError::UndefinedVariable {
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_walks_outward() -> Result<(), InterpreterError> {
        let mut env = Environment::new();
        let global = env.global();
        env.define(global, "element", json!("fire"));
        let inner = env.push_scope(global);
        let innermost = env.push_scope(inner);

        assert_eq!(env.get(innermost, "element")?, &Binding::Value(json!("fire")));
        assert_eq!(env.parent_of(innermost), Some(inner));
        assert_eq!(env.parent_of(global), None);
        Ok(())
    }

    #[test]
    fn test_define_shadows_in_current_scope_only() -> Result<(), InterpreterError> {
        let mut env = Environment::new();
        let global = env.global();
        env.define(global, "mood", json!("calm"));
        let inner = env.push_scope(global);
        env.define(inner, "mood", json!("storm"));

        assert_eq!(env.get(inner, "mood")?.as_value(), Some(&json!("storm")));
        assert_eq!(env.get(global, "mood")?.as_value(), Some(&json!("calm")));
        Ok(())
    }

    #[test]
    fn test_assign_updates_enclosing_scope() -> Result<(), InterpreterError> {
        let mut env = Environment::new();
        let global = env.global();
        env.define(global, "count", json!(1));
        let inner = env.push_scope(global);

        env.assign(inner, "count", json!(2))?;
        assert_eq!(env.get(global, "count")?.as_value(), Some(&json!(2)));
        assert_eq!(env.scope_count(), 2);
        Ok(())
    }

    #[test]
    fn test_assign_undefined_fails() {
        let mut env = Environment::new();
        let global = env.global();
        let err = env.assign(global, "ghost", json!(null)).unwrap_err();
        assert_eq!(
            err,
            InterpreterError::UndefinedVariable {
                name: "ghost".to_string()
            }
        );
        assert!(!env.contains(global, "ghost"));
    }

    #[test]
    fn test_get_undefined_fails() {
        let env = Environment::new();
        assert!(matches!(
            env.get(env.global(), "nothing"),
            Err(InterpreterError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn test_builtins_bound_globally() -> Result<(), InterpreterError> {
        let mut env = Environment::with_builtins();
        let child = env.push_scope(env.global());
        assert_eq!(env.get(child, "summon")?, &Binding::Builtin(Builtin::Summon));
        assert!(env.get(child, "summon")?.as_value().is_none());
        Ok(())
    }
}
