//! Compile-time model of one method body's frame.
//!
//! [`OperandEnvironment`] tracks:
//! - local variables with slot allocation, nested block scopes and
//!   shadowing; slots of a closed block are reused by later blocks
//! - a simulated operand stack of [`Type`]s, used only for depth and width
//!   so the method's max-stack can be declared
//! - label allocation
//! - a diagnostics sink for errors raised outside an expression result
//! - the [`Frame`] tail-call rewriting consults
//!
//! One environment is created per compiled method body and is never shared.

use crate::bytecode::Label;
use crate::options::CompilerOptions;
use kiln_core::{CompilationError, Signature, Span, Type};
use rustc_hash::FxHashMap;

// ============================================================================
// Types
// ============================================================================

/// A declared local variable or parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
    pub name: String,
    pub ty: Type,
    pub slot: u16,
    /// Scope depth where declared.
    pub depth: u32,
    pub span: Span,
}

/// What the enclosing method looks like, for self tail-call detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub signature: Signature,
    /// Label emitted at the first instruction of the body.
    pub entry: Label,
    /// Slot of each parameter, in positional order.
    pub parameter_slots: Vec<u16>,
    pub is_static: bool,
}

// ============================================================================
// OperandEnvironment
// ============================================================================

#[derive(Debug)]
pub struct OperandEnvironment {
    locals: FxHashMap<String, Local>,
    /// `(depth at which shadowing happened, name, hidden local)`.
    shadowed: Vec<(u32, String, Local)>,
    /// First free slot at each open scope.
    scope_starts: Vec<u16>,
    depth: u32,
    next_slot: u16,
    max_locals: u16,

    stack: Vec<Type>,
    stack_width: u16,
    max_stack: u16,

    next_label: u32,
    diagnostics: Vec<CompilationError>,

    class_type: Type,
    is_static: bool,
    frame: Option<Frame>,
    options: CompilerOptions,
}

impl OperandEnvironment {
    /// Environment for a body of `class_type`. Instance bodies reserve slot
    /// 0 for `this`.
    pub fn new(class_type: Type, is_static: bool, options: CompilerOptions) -> Self {
        let first = if is_static { 0 } else { 1 };
        Self {
            locals: FxHashMap::default(),
            shadowed: Vec::new(),
            scope_starts: Vec::new(),
            depth: 0,
            next_slot: first,
            max_locals: first,
            stack: Vec::new(),
            stack_width: 0,
            max_stack: 0,
            next_label: 0,
            diagnostics: Vec::new(),
            class_type,
            is_static,
            frame: None,
            options,
        }
    }

    #[inline]
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// The class whose member is being compiled.
    #[inline]
    pub fn class_type(&self) -> &Type {
        &self.class_type
    }

    /// Type of `this`, `None` in static context.
    pub fn this_type(&self) -> Option<&Type> {
        (!self.is_static).then_some(&self.class_type)
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    // ==========================================================================
    // Scopes and locals
    // ==========================================================================

    pub fn push_scope(&mut self) {
        self.depth += 1;
        self.scope_starts.push(self.next_slot);
    }

    /// Closes the innermost scope: its locals go away, anything they
    /// shadowed comes back, and their slots become free again.
    pub fn pop_scope(&mut self) {
        let depth = self.depth;
        self.locals.retain(|_, local| local.depth < depth);
        while let Some((shadow_depth, _, _)) = self.shadowed.last() {
            if *shadow_depth != depth {
                break;
            }
            if let Some((_, name, local)) = self.shadowed.pop() {
                self.locals.insert(name, local);
            }
        }
        if let Some(start) = self.scope_starts.pop() {
            self.next_slot = start;
        }
        self.depth = depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Declares a local in the current scope.
    ///
    /// Redeclaring a name in the same scope is a structural error; the
    /// original keeps its slot and the error is returned for reporting.
    pub fn declare(&mut self, name: &str, ty: Type, span: Span) -> Result<u16, CompilationError> {
        if let Some(existing) = self.locals.get(name) {
            if existing.depth == self.depth {
                return Err(CompilationError::structural(
                    span,
                    format!("variable `{name}` is already defined"),
                ));
            }
            self.shadowed.push((self.depth, name.to_string(), existing.clone()));
        }
        let slot = self.allocate(ty.width());
        self.locals.insert(
            name.to_string(),
            Local { name: name.to_string(), ty, slot, depth: self.depth, span },
        );
        Ok(slot)
    }

    /// Reserves an anonymous slot for a value of `ty` in the current scope.
    pub fn allocate_temp(&mut self, ty: &Type) -> u16 {
        self.allocate(ty.width().max(1))
    }

    fn allocate(&mut self, width: u8) -> u16 {
        let slot = self.next_slot;
        self.next_slot += u16::from(width);
        self.max_locals = self.max_locals.max(self.next_slot);
        slot
    }

    pub fn lookup(&self, name: &str) -> Option<&Local> {
        self.locals.get(name)
    }

    /// Local-slot high-water mark.
    #[inline]
    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    // ==========================================================================
    // Operand stack
    // ==========================================================================

    /// Records a value pushed onto the operand stack. Void pushes nothing.
    pub fn push(&mut self, ty: Type) {
        if ty.is_void() {
            return;
        }
        self.stack_width += u16::from(ty.width());
        self.max_stack = self.max_stack.max(self.stack_width);
        self.stack.push(ty);
    }

    /// Records a value popped off the operand stack.
    pub fn pop(&mut self) -> Option<Type> {
        let ty = self.stack.pop()?;
        self.stack_width -= u16::from(ty.width());
        Some(ty)
    }

    pub fn pop_n(&mut self, count: usize) {
        for _ in 0..count {
            self.pop();
        }
    }

    pub fn peek(&self) -> Option<&Type> {
        self.stack.last()
    }

    #[inline]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Current operand-stack width in slots.
    #[inline]
    pub fn stack_width(&self) -> u16 {
        self.stack_width
    }

    #[inline]
    pub fn max_stack(&self) -> u16 {
        self.max_stack
    }

    /// The stack contents, bottom first.
    pub fn snapshot(&self) -> Vec<Type> {
        self.stack.clone()
    }

    /// Resets the simulated stack to a snapshot, e.g. at a join point
    /// reached from a path with a different linear history.
    pub fn restore(&mut self, snapshot: Vec<Type>) {
        self.stack_width = snapshot.iter().map(|t| u16::from(t.width())).sum();
        self.max_stack = self.max_stack.max(self.stack_width);
        self.stack = snapshot;
    }

    // ==========================================================================
    // Labels, diagnostics and the tail-call frame
    // ==========================================================================

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    pub fn report(&mut self, error: CompilationError) {
        self.diagnostics.push(error);
    }

    pub fn take_diagnostics(&mut self) -> Vec<CompilationError> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn set_frame(&mut self, frame: Frame) {
        self.frame = Some(frame);
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }
}
