//! Scope frames for declared variables.
//!
//! A frame maps names to storage slots. Frames are pushed on entry to a
//! function body or a branch arm and popped on exit; the top of the stack is
//! the active frame. Lookup either stays in the active frame (`Flat`) or walks
//! outward, stopping at the frame that opened the current function
//! (`Lexical`). Slots from an enclosing function are never visible: they
//! live in another function's stack frame.

use rustc_hash::FxHashMap;

/// How identifier lookup treats enclosing frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScopeLookup {
    /// Walk from the active frame outward to the enclosing function's root frame.
    #[default]
    Lexical,
    /// Consult the active frame only.
    Flat,
}

/// What opened a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// The body of a function, including the top-level entry.
    Function,
    /// A branch arm.
    Arm,
}

#[derive(Debug)]
struct Frame<S> {
    kind: FrameKind,
    bindings: FxHashMap<String, S>,
}

/// The stack of active frames.
#[derive(Debug)]
pub struct ScopeStack<S> {
    frames: Vec<Frame<S>>,
}

impl<S> Default for ScopeStack<S> {
    fn default() -> Self {
        Self { frames: Vec::new() }
    }
}

impl<S: Copy> ScopeStack<S> {
    pub fn push(&mut self, kind: FrameKind) {
        self.frames.push(Frame {
            kind,
            bindings: FxHashMap::default(),
        });
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind `name` in the active frame, returning the binding it replaced.
    ///
    /// Redeclaring a name in the same frame silently rebinds it.
    /// Returns `None` without binding when no frame is active.
    pub fn declare(&mut self, name: &str, slot: S) -> Option<S> {
        let frame = self.frames.last_mut()?;
        frame.bindings.insert(name.to_string(), slot)
    }

    pub fn lookup(&self, name: &str, mode: ScopeLookup) -> Option<S> {
        for frame in self.frames.iter().rev() {
            if let Some(slot) = frame.bindings.get(name) {
                return Some(*slot);
            }
            if mode == ScopeLookup::Flat || frame.kind == FrameKind::Function {
                break;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_depth() {
        let mut scopes: ScopeStack<u32> = ScopeStack::default();
        assert_eq!(scopes.depth(), 0);
        scopes.push(FrameKind::Function);
        scopes.push(FrameKind::Arm);
        assert_eq!(scopes.depth(), 2);
        scopes.pop();
        assert_eq!(scopes.depth(), 1);
    }

    #[test]
    fn test_declare_without_frame_is_rejected() {
        let mut scopes: ScopeStack<u32> = ScopeStack::default();
        assert_eq!(scopes.declare("x", 1), None);
        assert_eq!(scopes.lookup("x", ScopeLookup::Lexical), None);
    }

    #[test]
    fn test_redeclaration_rebinds() {
        let mut scopes = ScopeStack::default();
        scopes.push(FrameKind::Function);
        assert_eq!(scopes.declare("x", 1), None);
        assert_eq!(scopes.declare("x", 2), Some(1));
        assert_eq!(scopes.lookup("x", ScopeLookup::Flat), Some(2));
    }

    #[test]
    fn test_flat_lookup_ignores_enclosing_frames() {
        let mut scopes = ScopeStack::default();
        scopes.push(FrameKind::Function);
        scopes.declare("x", 1);
        scopes.push(FrameKind::Arm);
        assert_eq!(scopes.lookup("x", ScopeLookup::Flat), None);
        assert_eq!(scopes.lookup("x", ScopeLookup::Lexical), Some(1));
    }

    #[test]
    fn test_lexical_lookup_stops_at_function_boundary() {
        let mut scopes = ScopeStack::default();
        scopes.push(FrameKind::Function);
        scopes.declare("outer", 1);
        scopes.push(FrameKind::Function);
        scopes.push(FrameKind::Arm);
        assert_eq!(scopes.lookup("outer", ScopeLookup::Lexical), None);
    }

    #[test]
    fn test_inner_frame_shadows_and_pop_restores() {
        let mut scopes = ScopeStack::default();
        scopes.push(FrameKind::Function);
        scopes.declare("x", 1);
        scopes.push(FrameKind::Arm);
        scopes.declare("x", 2);
        assert_eq!(scopes.lookup("x", ScopeLookup::Lexical), Some(2));
        scopes.pop();
        assert_eq!(scopes.lookup("x", ScopeLookup::Lexical), Some(1));
    }
}
