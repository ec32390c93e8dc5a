use crate::language::ast::Rule;
use crate::runtime::{error::LookupError, value::Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

struct Scope {
    variables: RefCell<HashMap<String, Value>>,
    functions: RefCell<HashMap<String, Rc<Rule>>>,
    parent: Option<Environment>,
}

impl Scope {
    fn new(parent: Option<Environment>) -> Self {
        Self {
            variables: RefCell::new(HashMap::new()),
            functions: RefCell::new(HashMap::new()),
            parent,
        }
    }
}

/// Handle to one scope frame. Cloning the handle shares the frame; `fork`
/// creates a new child frame. Parent links only point outward, so frames
/// never form cycles.
#[derive(Clone)]
pub struct Environment {
    scope: Rc<Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Creates a root environment with no parent.
    pub fn new() -> Self {
        Self {
            scope: Rc::new(Scope::new(None)),
        }
    }

    pub fn fork(&self) -> Environment {
        Environment {
            scope: Rc::new(Scope::new(Some(self.clone()))),
        }
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.scope.parent.as_ref()
    }

    /// Number of parents between this frame and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(env) = current {
            depth += 1;
            current = env.parent();
        }
        depth
    }

    /// Binds `name` in this frame only, replacing any previous binding here.
    pub fn set_var(&self, name: impl Into<String>, value: Value) {
        self.scope.variables.borrow_mut().insert(name.into(), value);
    }

    pub fn get_var(&self, name: &str) -> Result<Value, LookupError> {
        let mut current = Some(self);
        while let Some(env) = current {
            if let Some(value) = env.scope.variables.borrow().get(name) {
                return Ok(value.clone());
            }
            current = env.parent();
        }
        Err(LookupError::UnboundVariable(name.to_string()))
    }

    /// Registers `rule` in this frame. Fails with the existing rule when the
    /// name is already taken in this same frame; parent frames may be shadowed.
    pub fn set_fn(&self, rule: Rc<Rule>) -> Result<(), Rc<Rule>> {
        let mut functions = self.scope.functions.borrow_mut();
        if let Some(existing) = functions.get(rule.name()) {
            return Err(Rc::clone(existing));
        }
        functions.insert(rule.name().to_string(), rule);
        Ok(())
    }

    /// Finds a rule and the environment it was defined in.
    pub fn get_fn(&self, name: &str) -> Result<(Rc<Rule>, Environment), LookupError> {
        let mut current = Some(self);
        while let Some(env) = current {
            if let Some(rule) = env.scope.functions.borrow().get(name) {
                return Ok((Rc::clone(rule), env.clone()));
            }
            current = env.parent();
        }
        Err(LookupError::UnboundFunction {
            name: name.to_string(),
            is_variable: self.get_var(name).is_ok(),
        })
    }

    pub fn same_scope(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.scope, &other.scope)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut variables: Vec<String> = self.scope.variables.borrow().keys().cloned().collect();
        variables.sort();
        let mut functions: Vec<String> = self.scope.functions.borrow().keys().cloned().collect();
        functions.sort();
        f.debug_struct("Environment")
            .field("depth", &self.depth())
            .field("variables", &variables)
            .field("functions", &functions)
            .finish()
    }
}
