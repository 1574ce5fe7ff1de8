//! Byte-string interning.
//!
//! A [`Symbol`] is a 4-byte handle into a process-global table of byte
//! strings. Interning the same bytes twice yields the same handle, so name
//! comparison and hashing are O(1) integer operations.
//!
//! The table is keyed on raw bytes rather than `str`: Wot++ builds names at
//! runtime by concatenating prefix values (arbitrary byte strings) with
//! identifiers, and those names never need to be valid UTF-8.
//!
//! Interned bytes are leaked to obtain `'static` references. The table lives
//! for the whole process and entries are never removed, so this costs memory
//! proportional to the set of distinct names only.

use std::fmt;
use std::sync::{Mutex, OnceLock};

use rustc_hash::FxHashMap;

/// An interned byte string.
///
/// # Example
///
/// ```
/// use wpp_util::Symbol;
///
/// let a = Symbol::intern(b"greet");
/// let b = Symbol::intern(b"greet");
/// let c = Symbol::intern(b"a/greet");
///
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(a.as_bytes(), b"greet");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    index: u32,
}

struct Interner {
    map: FxHashMap<&'static [u8], u32>,
    strings: Vec<&'static [u8]>,
}

impl Interner {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            strings: Vec::new(),
        }
    }

    fn intern(&mut self, bytes: &[u8]) -> u32 {
        if let Some(&index) = self.map.get(bytes) {
            return index;
        }

        let owned: &'static [u8] = Box::leak(bytes.to_vec().into_boxed_slice());
        let index = self.strings.len() as u32;
        self.strings.push(owned);
        self.map.insert(owned, index);
        index
    }

    fn get(&self, index: u32) -> &'static [u8] {
        self.strings[index as usize]
    }
}

fn interner() -> &'static Mutex<Interner> {
    static INTERNER: OnceLock<Mutex<Interner>> = OnceLock::new();
    INTERNER.get_or_init(|| Mutex::new(Interner::new()))
}

impl Symbol {
    /// Intern a byte string, returning its symbol.
    pub fn intern(bytes: &[u8]) -> Symbol {
        // A poisoned lock still guards a structurally sound table (entries
        // are append-only), so recover rather than propagate the panic.
        let index = interner()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .intern(bytes);
        Symbol { index }
    }

    /// The interned bytes for this symbol.
    pub fn as_bytes(self) -> &'static [u8] {
        interner()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(self.index)
    }

    /// Lossy UTF-8 rendering, for diagnostics.
    pub fn display(self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.display())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
