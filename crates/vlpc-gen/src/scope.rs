//! Lexical scoping for stack-allocated locals during code generation.

use std::collections::HashMap;

/// Where a local variable lives and what LLVM type its slot holds.
#[derive(Clone, Debug)]
pub struct VariableInfo {
    pub address: String,
    pub ty: String,
}

#[derive(Default)]
struct Scope {
    variables: HashMap<String, VariableInfo>,
}

/// A stack of scopes searched innermost-first, mirroring the reference
/// generator's `std::vector<Scope>`.
#[derive(Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Binds into the innermost scope. No-op if there is no open scope.
    pub fn bind(&mut self, name: impl Into<String>, info: VariableInfo) {
        if let Some(top) = self.scopes.last_mut() {
            top.variables.insert(name.into(), info);
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&VariableInfo> {
        self.scopes.iter().rev().find_map(|s| s.variables.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut scopes = ScopeStack::default();
        scopes.push();
        scopes.bind("x", VariableInfo { address: "%t1".into(), ty: "i32".into() });
        scopes.push();
        scopes.bind("x", VariableInfo { address: "%t2".into(), ty: "i32".into() });
        assert_eq!(scopes.resolve("x").unwrap().address, "%t2");
        scopes.pop();
        assert_eq!(scopes.resolve("x").unwrap().address, "%t1");
    }

    #[test]
    fn unresolved_name_is_none() {
        let mut scopes = ScopeStack::default();
        scopes.push();
        assert!(scopes.resolve("missing").is_none());
    }
}
