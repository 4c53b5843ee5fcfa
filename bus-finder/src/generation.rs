//! Latest-wins bookkeeping for asynchronous results.
//!
//! Superseded requests are never killed mid-flight. Each one carries the
//! [`Generation`] it was issued under and its result is dropped on arrival
//! if something newer has been applied or the stream was invalidated.

/// Tag handed out when a request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Gate deciding which results of one logical stream may be applied.
///
/// ```
/// use bus_finder::generation::GenerationGate;
///
/// let mut gate = GenerationGate::default();
/// let first = gate.issue();
/// let second = gate.issue();
///
/// assert!(gate.accept(second));
/// // The older response arrived late
/// assert!(!gate.accept(first));
/// ```
#[derive(Debug, Default)]
pub struct GenerationGate {
    issued: u64,
    floor: u64,
}

impl GenerationGate {
    /// Tag a new request.
    pub fn issue(&mut self) -> Generation {
        self.issued += 1;
        Generation(self.issued)
    }

    /// Supersede every request issued so far.
    pub fn invalidate(&mut self) {
        self.floor = self.issued;
    }

    /// Admit a result if it is newer than anything applied or invalidated.
    pub fn accept(&mut self, generation: Generation) -> bool {
        if generation.0 > self.floor {
            self.floor = generation.0;
            true
        } else {
            false
        }
    }

    /// Whether a result for `generation` would still be admitted.
    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 > self.floor
    }

    /// Whether a request is outstanding that could still be applied.
    pub fn has_pending(&self) -> bool {
        self.issued > self.floor
    }
}
