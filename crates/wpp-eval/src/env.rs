//! The evaluation environment.
//!
//! Two layered structures live here:
//!
//! - a stack of [`Frame`]s, pushed on block entry and argument binding and
//!   popped on exit. Functions are keyed by `(name, arity)` and each key
//!   holds a LIFO list of definitions, so redefinition shadows and `drop`
//!   un-shadows. Variables hold a LIFO value stack per name.
//! - a stack of prefix segments. A `prefix` block pushes a segment and
//!   pops it on exit — it pushes *no* frame, which is what makes a
//!   definition inside `prefix p { … }` identical to defining `p·name`
//!   outside.
//!
//! Definitions qualify their name with the full prefix stack once, at
//! definition time. Lookup of an unqualified name walks prefix combinations
//! from deepest to empty and, within each combination, walks frames newest
//! first. A name already containing `/` is treated as fully qualified and
//! skips the prefix walk.

use rustc_hash::FxHashMap;
use wpp_par::NodeId;
use wpp_util::Symbol;

/// One environment layer.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    /// `(qualified name, arity)` → definitions, newest last.
    functions: FxHashMap<(Symbol, usize), Vec<NodeId>>,
    /// qualified name → values, newest last.
    variables: FxHashMap<Symbol, Vec<Vec<u8>>>,
}

/// The full environment: frame stack plus prefix stack.
///
/// Cloning an `Env` snapshots it; the REPL uses that to roll back after an
/// error.
#[derive(Clone, Debug)]
pub struct Env {
    frames: Vec<Frame>,
    prefixes: Vec<Vec<u8>>,
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl Env {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            prefixes: Vec::new(),
        }
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    // ------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------

    pub fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    // ------------------------------------------------------------------
    // Prefixes
    // ------------------------------------------------------------------

    pub fn push_prefix(&mut self, segment: Vec<u8>) {
        self.prefixes.push(segment);
    }

    pub fn pop_prefix(&mut self) {
        self.prefixes.pop();
    }

    /// Qualify `name` with the concatenation of the whole prefix stack.
    /// This happens once, at definition time.
    pub fn qualify(&self, name: Symbol) -> Symbol {
        if self.prefixes.is_empty() {
            return name;
        }
        let mut bytes = Vec::new();
        for segment in &self.prefixes {
            bytes.extend_from_slice(segment);
        }
        bytes.extend_from_slice(name.as_bytes());
        Symbol::intern(&bytes)
    }

    /// Lookup candidates for `name`, deepest prefix combination first and
    /// the bare name last. A qualified name is its own only candidate.
    fn candidates(&self, name: Symbol) -> Vec<Symbol> {
        if name.as_bytes().contains(&b'/') {
            return vec![name];
        }

        let mut out = Vec::with_capacity(self.prefixes.len() + 1);
        for depth in (1..=self.prefixes.len()).rev() {
            let mut bytes = Vec::new();
            for segment in &self.prefixes[..depth] {
                bytes.extend_from_slice(segment);
            }
            bytes.extend_from_slice(name.as_bytes());
            out.push(Symbol::intern(&bytes));
        }
        out.push(name);
        out
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    /// Record a definition for `(name, arity)` in the innermost frame.
    /// `name` must already be qualified.
    pub fn define_fn(&mut self, name: Symbol, arity: usize, def: NodeId) {
        self.top_mut()
            .functions
            .entry((name, arity))
            .or_default()
            .push(def);
    }

    /// Newest visible definition for `name` at `arity`.
    pub fn lookup_fn(&self, name: Symbol, arity: usize) -> Option<NodeId> {
        for candidate in self.candidates(name) {
            for frame in self.frames.iter().rev() {
                if let Some(defs) = frame.functions.get(&(candidate, arity)) {
                    if let Some(&newest) = defs.last() {
                        return Some(newest);
                    }
                }
            }
        }
        None
    }

    /// Pop the newest visible definition for `name` at `arity`. Returns
    /// false when nothing matched.
    pub fn drop_fn(&mut self, name: Symbol, arity: usize) -> bool {
        for candidate in self.candidates(name) {
            for frame in self.frames.iter_mut().rev() {
                if let Some(defs) = frame.functions.get_mut(&(candidate, arity)) {
                    if defs.pop().is_some() {
                        return true;
                    }
                }
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// Bind `name` to `value` in the innermost frame. `name` must already
    /// be qualified (parameters bind under their bare name).
    pub fn define_var(&mut self, name: Symbol, value: Vec<u8>) {
        self.top_mut()
            .variables
            .entry(name)
            .or_default()
            .push(value);
    }

    /// Newest visible value for `name`.
    pub fn lookup_var(&self, name: Symbol) -> Option<&[u8]> {
        for candidate in self.candidates(name) {
            for frame in self.frames.iter().rev() {
                if let Some(values) = frame.variables.get(&candidate) {
                    if let Some(value) = values.last() {
                        return Some(value);
                    }
                }
            }
        }
        None
    }

    /// Pop the newest visible value for `name`. Returns false when nothing
    /// matched.
    pub fn drop_var(&mut self, name: Symbol) -> bool {
        for candidate in self.candidates(name) {
            for frame in self.frames.iter_mut().rev() {
                if let Some(values) = frame.variables.get_mut(&candidate) {
                    if values.pop().is_some() {
                        return true;
                    }
                }
            }
        }
        false
    }
}
