//! Process-wide symbol interning.
//!
//! Every distinct name is registered once and handed out as a [`Symbol`]
//! handle; comparing two symbols is comparing their handles.

use bimap::BiMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(usize);

lazy_static! {
    static ref SYMBOLS: Mutex<BiMap<String, Symbol>> = Mutex::new(BiMap::new());
}

/// Returns the symbol registered for `name`, creating it on first use.
pub fn intern(name: &str) -> Symbol {
    let mut table = SYMBOLS.lock().unwrap_or_else(PoisonError::into_inner);
    let name = name.to_owned();
    if let Some(&symbol) = table.get_by_left(&name) {
        return symbol;
    }
    let symbol = Symbol(table.len());
    log::trace!("intern {} as #{}", name, symbol.0);
    table.insert(name, symbol);
    symbol
}

impl Symbol {
    pub fn name(self) -> String {
        let table = SYMBOLS.lock().unwrap_or_else(PoisonError::into_inner);
        table.get_by_right(&self).cloned().unwrap_or_default()
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        intern(name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
