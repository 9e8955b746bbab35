use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single binding in the symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbol {
    Int(i32),
    Str(String),
    /// Line index in the cleaned instruction stream.
    Label(usize),
}

/// Identifier bindings: data constants, labels, and variables created at run time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    entries: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.entries.get(name)
    }

    /// Binds `name`, returning the previous binding if there was one.
    pub fn bind(&mut self, name: impl Into<String>, sym: Symbol) -> Option<Symbol> {
        self.entries.insert(name.into(), sym)
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        match self.entries.get_mut(name) {
            Some(slot) => *slot = Symbol::Int(value),
            None => {
                self.entries.insert(name.to_string(), Symbol::Int(value));
            }
        }
    }

    pub fn label(&self, name: &str) -> Option<usize> {
        match self.entries.get(name) {
            Some(Symbol::Label(line)) => Some(*line),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
