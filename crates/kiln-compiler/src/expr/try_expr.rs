//! Try-expressions.
//!
//! `try e` protects the code of `e` with an exception-table region. How
//! the handler continues depends on the consumption context:
//! - as a value, the caught exception becomes the result, so the type is
//!   the intersection of the body type and the caught class
//! - for effect, the exception is dropped
//! - as a condition, a caught exception takes the false branch
//!
//! The virtual machine empties the operand stack when it enters a handler.
//! Values already on the stack below a try-expression are spilled to
//! temporaries first and reloaded after the join.

use super::ExprCompiler;
use crate::ast::Expression;
use crate::bytecode::{Code, ExceptionEntry, Instruction, Label};
use kiln_core::{CompilationError, Span, Type, names};

/// The labels bounding one protected region.
struct Region {
    start: Label,
    end: Label,
    handler: Label,
    after: Label,
}

impl<'a> ExprCompiler<'a> {
    fn catch_class(&self, catch_type: Option<&Type>) -> Type {
        catch_type
            .cloned()
            .unwrap_or_else(|| Type::reference(self.env.options().default_catch_type.as_str()))
    }

    pub(super) fn try_type(&self, body: &Expression, catch_type: Option<&Type>) -> Type {
        let body = self.type_of(body);
        if body.is_void() {
            return Type::VOID;
        }
        let catch = self.catch_class(catch_type);
        self.types.intersect(&self.types.boxed(&body), &catch)
    }

    /// Checks the caught class, returning it when it can head a handler.
    fn checked_catch(&self, catch_type: Option<&Type>, span: Span, code: &mut Code) -> Option<Type> {
        let catch = self.catch_class(catch_type);
        if self.types.is_throwable(&catch) {
            return Some(catch);
        }
        code.diagnostic(CompilationError::type_mismatch(
            span,
            format!("incompatible types: `{catch}` cannot be caught"),
        ));
        None
    }

    fn open_region(&mut self) -> Region {
        Region {
            start: self.env.new_label(),
            end: self.env.new_label(),
            handler: self.env.new_label(),
            after: self.env.new_label(),
        }
    }

    fn close_region(&self, code: &mut Code, region: &Region, catch: &Type) {
        code.exception_entry(ExceptionEntry {
            start: region.start,
            end: region.end,
            handler: region.handler,
            catch_type: names::internal(catch.class_name().unwrap_or(names::THROWABLE)),
        });
    }

    /// Stores every operand value into fresh temporaries, returning them
    /// bottom-first.
    fn spill(&mut self, code: &mut Code) -> Vec<(Type, u16)> {
        let mut spilled = Vec::new();
        while let Some(ty) = self.env.pop() {
            let slot = self.env.allocate_temp(&ty);
            code.push(Instruction::store(&ty, slot));
            spilled.push((ty, slot));
        }
        spilled.reverse();
        spilled
    }

    pub(super) fn compile_try(
        &mut self,
        body: &Expression,
        catch_type: Option<&Type>,
        span: Span,
    ) -> Code {
        let result = self.try_type(body, catch_type);
        let mut code = Code::new();
        let Some(catch) = self.checked_catch(catch_type, span, &mut code) else {
            code.append(self.compile_to(body, &result));
            return code;
        };

        let spilled = self.spill(&mut code);
        if !spilled.is_empty() {
            tracing::trace!(count = spilled.len(), "spilling operands around a try region");
        }

        let region = self.open_region();
        code.label(region.start);
        if result.is_void() {
            code.append(self.compile_discard(body));
        } else {
            code.append(self.compile_to(body, &result));
        }
        code.label(region.end).push(Instruction::goto(region.after));

        let joined = self.env.snapshot();
        self.env.restore(Vec::new());
        self.env.push(catch.clone());
        code.label(region.handler);
        if result.is_void() {
            self.env.pop();
            code.push(Instruction::Pop);
        } else {
            code.append(self.coerce(&catch, &result, span));
        }
        self.env.restore(joined);
        code.label(region.after);
        self.close_region(&mut code, &region, &catch);

        if !spilled.is_empty() {
            let saved = (!result.is_void()).then(|| {
                let slot = self.env.allocate_temp(&result);
                self.env.pop();
                code.push(Instruction::store(&result, slot));
                slot
            });
            for (ty, slot) in spilled {
                code.push(Instruction::load(&ty, slot));
                self.env.push(ty);
            }
            if let Some(slot) = saved {
                code.push(Instruction::load(&result, slot));
                self.env.push(result);
            }
        }
        code
    }

    pub(super) fn try_discard(
        &mut self,
        body: &Expression,
        catch_type: Option<&Type>,
        span: Span,
    ) -> Code {
        let depth = self.env.stack_depth();
        if depth > 0 {
            let code = self.compile_try(body, catch_type, span);
            return self.discard_to(code, depth);
        }
        let mut code = Code::new();
        let Some(catch) = self.checked_catch(catch_type, span, &mut code) else {
            code.append(self.compile_discard(body));
            return code;
        };

        let region = self.open_region();
        code.label(region.start);
        code.append(self.compile_discard(body));
        code.label(region.end)
            .push(Instruction::goto(region.after))
            .label(region.handler)
            .push(Instruction::Pop)
            .label(region.after);
        self.close_region(&mut code, &region, &catch);
        code
    }

    /// Condition form. A caught exception takes the false branch.
    pub(super) fn try_condition(
        &mut self,
        body: &Expression,
        catch_type: Option<&Type>,
        on_true: Label,
        on_false: Label,
        span: Span,
    ) -> Code {
        let mut code = Code::new();
        let Some(catch) = self.checked_catch(catch_type, span, &mut code) else {
            code.append(self.compile_condition(body, on_true, on_false));
            return code;
        };
        if self.env.stack_depth() > 0 {
            code.append(self.spilled_try_condition(body, &catch, on_true, on_false));
            return code;
        }

        let region = self.open_region();
        code.label(region.start);
        code.append(self.compile_condition(body, on_true, on_false));
        code.label(region.end)
            .label(region.handler)
            .push(Instruction::Pop)
            .push(Instruction::goto(on_false));
        self.close_region(&mut code, &region, &catch);
        code
    }

    /// Condition form over a non-empty operand stack.
    ///
    /// The branch targets expect the operands below the try, which the
    /// handler loses, so the region computes a primitive `0`/`1` truth on
    /// an empty stack. The operands are reloaded before branching on it.
    fn spilled_try_condition(
        &mut self,
        body: &Expression,
        catch: &Type,
        on_true: Label,
        on_false: Label,
    ) -> Code {
        let mut code = Code::new();
        let spilled = self.spill(&mut code);
        tracing::trace!(count = spilled.len(), "spilling operands around a try condition");

        let region = self.open_region();
        let (body_true, body_false) = (self.env.new_label(), self.env.new_label());
        code.label(region.start);
        code.append(self.compile_condition(body, body_true, body_false));
        code.label(region.end).label(region.handler);
        self.env.push(catch.clone());
        self.env.pop();
        self.env.push(Type::BOOLEAN);
        self.env.pop();
        code.push(Instruction::Pop)
            .push(Instruction::IConst(0))
            .push(Instruction::goto(region.after))
            .label(body_true)
            .push(Instruction::IConst(1))
            .push(Instruction::goto(region.after))
            .label(body_false)
            .push(Instruction::IConst(0))
            .label(region.after);
        self.env.push(Type::BOOLEAN);
        self.close_region(&mut code, &region, catch);

        let truth = self.env.allocate_temp(&Type::BOOLEAN);
        self.env.pop();
        code.push(Instruction::store(&Type::BOOLEAN, truth));
        for (ty, slot) in spilled {
            code.push(Instruction::load(&ty, slot));
            self.env.push(ty);
        }
        code.push(Instruction::load(&Type::BOOLEAN, truth));
        self.env.push(Type::BOOLEAN);
        code.append(self.truth_jump(&Type::BOOLEAN, true, on_true));
        code.push(Instruction::goto(on_false));
        code
    }
}
