//! Lexical scopes. Each scope is shared (`Rc<RefCell<_>>`) so a closure can
//! keep its defining scope alive after the block or call that created it exits.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runtime::value::Value;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    parent: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// The outermost scope.
    pub fn global() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn child_of(parent: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self { values: HashMap::new(), parent: Some(parent) }))
    }

    /// Binds `name` in this scope. Redeclaring simply rebinds.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks `name` up from this scope outwards.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.values.get(name) {
            Some(v) => Some(v.clone()),
            None => self.parent.as_ref()?.borrow().get(name),
        }
    }

    /// Overwrites `name` in the nearest scope that declares it. Returns false
    /// when no scope does; assignment never declares.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            return true;
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => false,
        }
    }
}
