use crate::error::StoreError;
use crate::plan::Plan;
use crate::store::ValueStore;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_KEY: &str = "session";
pub const SNAPSHOT_TAG: &str = "gocell.Session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
    Import,
    Func,
    Type,
}

/// A package-level declaration accumulated from earlier turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclKind,
    /// Identity used for replacement: the name, `Recv.Name` for methods,
    /// or the source itself for imports and grouped forms.
    pub key: String,
    pub source: String,
}

/// State carried from one turn to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Live variable names in first-definition order.
    pub captured_names: Vec<String>,
    /// Verbatim source of function values, replayed instead of decoded.
    pub function_literals: IndexMap<String, String>,
    pub declarations: Vec<Declaration>,
}

impl Session {
    /// Captured names plus function-literal names, without duplicates.
    pub fn tracked_names(&self) -> Vec<String> {
        let mut names = self.captured_names.clone();
        for name in self.function_literals.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    pub fn literal(&self, name: &str) -> Option<&str> {
        self.function_literals.get(name).map(|s| s.as_str())
    }

    pub fn evict(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        debug!("evict {:?}", names);
        self.captured_names.retain(|n| !names.contains(n));
        self.function_literals.retain(|n, _| !names.contains(n));
    }

    /// Replaces the variable state with what a successful run persisted.
    pub fn commit(&mut self, plan: &Plan) {
        self.captured_names = plan.captured_names.clone();
        // Replayed literals are rediscovered by the planner, so the plan's map is complete.
        self.function_literals = plan.function_literals.clone();
        let live = &self.captured_names;
        self.function_literals.retain(|name, _| live.contains(name));
    }

    pub fn add_declarations(&mut self, pending: &[Declaration]) {
        self.declarations = merge_declarations(&self.declarations, pending);
    }

    pub fn reset(&mut self) {
        *self = Session::default();
    }

    pub fn save(&self, store: &ValueStore) -> Result<(), StoreError> {
        store.encode(SNAPSHOT_KEY, SNAPSHOT_TAG, self)
    }

    /// Loads the snapshot of an earlier process; a missing one yields `None`.
    pub fn load(store: &ValueStore) -> Result<Option<Session>, StoreError> {
        match store.decode(SNAPSHOT_KEY, SNAPSHOT_TAG) {
            Ok(session) => Ok(Some(session)),
            Err(StoreError::Missing { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Later declarations replace earlier ones with the same kind and key.
pub fn merge_declarations(existing: &[Declaration], pending: &[Declaration]) -> Vec<Declaration> {
    let mut merged = existing.to_vec();
    for decl in pending {
        match merged
            .iter_mut()
            .find(|d| d.kind == decl.kind && d.key == decl.key)
        {
            Some(slot) => *slot = decl.clone(),
            None => merged.push(decl.clone()),
        }
    }
    merged
}

/// Package-level source for a set of declarations, imports first.
pub fn render_declarations(decls: &[Declaration]) -> String {
    let imports = decls.iter().filter(|d| d.kind == DeclKind::Import);
    let others = decls.iter().filter(|d| d.kind != DeclKind::Import);
    let mut out = String::new();
    for decl in imports.chain(others) {
        out.push_str(decl.source.trim());
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn decl(kind: DeclKind, key: &str, source: &str) -> Declaration {
        Declaration {
            kind,
            key: key.to_string(),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_evict() {
        let mut session = Session {
            captured_names: vec!["a".into(), "b".into(), "f".into()],
            ..Session::default()
        };
        session
            .function_literals
            .insert("f".into(), "func() int { return a }".into());
        session.evict(&["a".to_string(), "f".to_string()]);
        assert_eq!(session.captured_names, vec!["b"]);
        assert!(session.function_literals.is_empty());
    }

    #[test]
    fn test_commit_drops_stale_literals() {
        let mut session = Session::default();
        session.function_literals.insert("old".into(), "func() {}".into());
        let mut plan = Plan::default();
        plan.captured_names = vec!["x".into(), "g".into()];
        plan.function_literals
            .insert("g".into(), "func() int { return x }".into());
        session.commit(&plan);
        assert_eq!(session.captured_names, vec!["x", "g"]);
        assert_eq!(
            session.function_literals.keys().collect::<Vec<_>>(),
            vec!["g"]
        );
    }

    #[test]
    fn test_merge_and_render() {
        let existing = vec![
            decl(DeclKind::Func, "f", "func f() int { return 1 }"),
            decl(DeclKind::Type, "P", "type P struct{ X int }"),
        ];
        let pending = vec![
            decl(DeclKind::Func, "f", "func f() int { return 2 }"),
            decl(DeclKind::Import, "\"strings\"", "import \"strings\""),
        ];
        let merged = merge_declarations(&existing, &pending);
        assert_eq!(merged.len(), 3);
        assert_eq!(
            render_declarations(&merged),
            "import \"strings\"\n\nfunc f() int { return 2 }\n\ntype P struct{ X int }\n\n"
        );
    }

    #[test]
    fn test_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = ValueStore::new(dir.path());
        assert_eq!(Session::load(&store).unwrap(), None);
        let mut session = Session::default();
        session.captured_names.push("a".into());
        session.function_literals.insert("f".into(), "func() {}".into());
        session.add_declarations(&[decl(DeclKind::Type, "T", "type T int")]);
        session.save(&store).unwrap();
        assert_eq!(Session::load(&store).unwrap(), Some(session));
    }
}
