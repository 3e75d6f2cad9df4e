//! Function store (component D): the insertion-ordered table of named
//! macros plus the textual placeholder-substitution pass applied when a
//! function is invoked (`=name a,b,c`).

use std::collections::HashMap;

use crate::model::Function;

/// Holds the set of functions currently known to the compiler, in
/// insertion order (iteration order matters for `functions.json` export).
#[derive(Debug, Clone, Default)]
pub struct FunctionStore {
    order: Vec<String>,
    functions: HashMap<String, Function>,
}

impl FunctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace a function. Name collisions overwrite silently,
    /// keeping the original insertion position.
    pub fn define(&mut self, function: Function) {
        if !self.functions.contains_key(&function.name) {
            self.order.push(function.name.clone());
        }
        self.functions.insert(function.name.clone(), function);
    }

    /// Remove a function, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<Function> {
        self.order.retain(|n| n != name);
        self.functions.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Functions flagged persistent (`:fon`), in insertion order, for
    /// `functions.json` export.
    pub fn persistent(&self) -> impl Iterator<Item = &Function> {
        self.order
            .iter()
            .filter_map(|n| self.functions.get(n))
            .filter(|f| f.persistent)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Maximum nesting depth for macro expansion, guarding against a function
/// that (directly or transitively) invokes itself.
const MAX_EXPANSION_DEPTH: usize = 16;

/// Error produced while expanding a function invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpansionError {
    #[error("function `{0}` is not defined")]
    Undefined(String),
    #[error("function expansion nested too deeply (limit {MAX_EXPANSION_DEPTH})")]
    TooDeep,
}

/// Textually substitute `@`, `@1`, `@2`, ... placeholders in `name`'s body
/// with `args`, returning the expanded token stream. The result is *not*
/// recursively expanded here: if the body itself invokes another function,
/// that invocation token is left in place for the compiler to expand on a
/// subsequent pass, with `depth` threaded through to bound recursion.
pub fn expand(
    store: &FunctionStore,
    name: &str,
    args: &[String],
    depth: usize,
) -> Result<Vec<String>, ExpansionError> {
    if depth >= MAX_EXPANSION_DEPTH {
        return Err(ExpansionError::TooDeep);
    }
    let function = store
        .get(name)
        .ok_or_else(|| ExpansionError::Undefined(name.to_string()))?;

    Ok(function
        .tokens
        .iter()
        .map(|tok| match placeholder_slot(tok) {
            Some(slot) => args.get(slot).cloned().unwrap_or_else(|| tok.clone()),
            None => tok.clone(),
        })
        .collect())
}

/// Parse a token of the form `@`, `@1`, `@2`, ... into a zero-based argument
/// slot. Bare `@` is slot 0.
fn placeholder_slot(token: &str) -> Option<usize> {
    let rest = token.strip_prefix('@')?;
    if rest.is_empty() {
        return Some(0);
    }
    rest.parse::<usize>().ok().map(|n| n.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &[&str]) -> Vec<String> {
        s.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn expands_bare_placeholder_to_first_argument() {
        let mut store = FunctionStore::new();
        store.define(Function::new("osc", "", tokens(&["mul", "@"])));
        let args = tokens(&["330hz"]);
        let expanded = expand(&store, "osc", &args, 0).expect("expand");
        assert_eq!(expanded, tokens(&["mul", "330hz"]));
    }

    #[test]
    fn expands_numbered_placeholders_independently() {
        let mut store = FunctionStore::new();
        store.define(Function::new(
            "mix2",
            "",
            tokens(&["push", "@1", "push", "@2"]),
        ));
        let args = tokens(&["0.1", "0.2"]);
        let expanded = expand(&store, "mix2", &args, 0).expect("expand");
        assert_eq!(expanded, tokens(&["push", "0.1", "push", "0.2"]));
    }

    #[test]
    fn undefined_function_is_rejected() {
        let store = FunctionStore::new();
        assert_eq!(
            expand(&store, "missing", &[], 0),
            Err(ExpansionError::Undefined("missing".to_string()))
        );
    }

    #[test]
    fn expansion_depth_is_bounded() {
        let store = FunctionStore::new();
        let err = expand(&store, "whatever", &[], MAX_EXPANSION_DEPTH).unwrap_err();
        assert_eq!(err, ExpansionError::TooDeep);
    }

    #[test]
    fn store_define_and_remove() {
        let mut store = FunctionStore::new();
        store.define(Function::new("f", "", tokens(&["@"])));
        assert_eq!(store.len(), 1);
        assert!(store.remove("f").is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn name_collision_overwrites_silently_in_place() {
        let mut store = FunctionStore::new();
        store.define(Function::new("a", "first", tokens(&["@"])));
        store.define(Function::new("b", "", tokens(&["@"])));
        store.define(Function::new("a", "second", tokens(&["@"])));
        assert_eq!(store.get("a").unwrap().comment, "second");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn persistent_filters_to_fon_functions_in_insertion_order() {
        let mut store = FunctionStore::new();
        let mut a = Function::new("a", "", tokens(&["@"]));
        a.persistent = true;
        store.define(a);
        store.define(Function::new("b", "", tokens(&["@"])));
        let mut c = Function::new("c", "", tokens(&["@"]));
        c.persistent = true;
        store.define(c);
        let names: Vec<&str> = store.persistent().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
