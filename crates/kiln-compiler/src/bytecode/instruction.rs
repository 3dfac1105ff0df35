//! The abstract instruction sequence handed to the class-file writer.
//!
//! Instructions are symbolic: constants are inline, members are named by
//! owner, name and descriptor, and branch targets are [`Label`] handles.
//! Label positions are fixed by emitting [`Instruction::Label`] markers, so
//! no offset patching ever happens here.

use super::Opcode;
use kiln_core::{PrimitiveKind, Type, names};
use ordered_float::OrderedFloat;

/// A forward-declarable branch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

/// The computational category an instruction operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `boolean`, `char` and `int`.
    Int,
    Long,
    Double,
    Reference,
}

impl ValueKind {
    /// Category of a non-void type.
    pub fn of(ty: &Type) -> ValueKind {
        match ty.primitive() {
            Some(PrimitiveKind::Long) => ValueKind::Long,
            Some(PrimitiveKind::Double) => ValueKind::Double,
            Some(_) => ValueKind::Int,
            None => ValueKind::Reference,
        }
    }

    pub fn of_primitive(kind: PrimitiveKind) -> ValueKind {
        ValueKind::of(&Type::Primitive(kind))
    }

    #[inline]
    pub fn width(self) -> u8 {
        match self {
            ValueKind::Long | ValueKind::Double => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
}

/// Branch condition of a [`Instruction::Jump`].
///
/// The `ICmp*`/`ACmp*` forms compare the two topmost values; the
/// single-operand forms compare the top value against zero or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Always,
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
    ICmpEq,
    ICmpNe,
    ICmpLt,
    ICmpGe,
    ICmpGt,
    ICmpLe,
    ACmpEq,
    ACmpNe,
    Null,
    NonNull,
}

impl Condition {
    /// The condition that holds exactly when `self` does not.
    pub fn negate(self) -> Condition {
        match self {
            Condition::Always => Condition::Always,
            Condition::Eq => Condition::Ne,
            Condition::Ne => Condition::Eq,
            Condition::Lt => Condition::Ge,
            Condition::Ge => Condition::Lt,
            Condition::Gt => Condition::Le,
            Condition::Le => Condition::Gt,
            Condition::ICmpEq => Condition::ICmpNe,
            Condition::ICmpNe => Condition::ICmpEq,
            Condition::ICmpLt => Condition::ICmpGe,
            Condition::ICmpGe => Condition::ICmpLt,
            Condition::ICmpGt => Condition::ICmpLe,
            Condition::ICmpLe => Condition::ICmpGt,
            Condition::ACmpEq => Condition::ACmpNe,
            Condition::ACmpNe => Condition::ACmpEq,
            Condition::Null => Condition::NonNull,
            Condition::NonNull => Condition::Null,
        }
    }

    /// Operand slots the branch consumes.
    pub fn operand_width(self) -> u8 {
        match self {
            Condition::Always => 0,
            Condition::ICmpEq
            | Condition::ICmpNe
            | Condition::ICmpLt
            | Condition::ICmpGe
            | Condition::ICmpGt
            | Condition::ICmpLe
            | Condition::ACmpEq
            | Condition::ACmpNe => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

/// A member reference: owner class, member name and descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MemberRef {
    pub fn new(owner: &str, name: &str, descriptor: impl Into<String>) -> Self {
        Self {
            owner: names::internal(owner),
            name: name.to_string(),
            descriptor: descriptor.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Position marker for a label; emits no bytes.
    Label(Label),
    Nop,
    AConstNull,
    IConst(i32),
    LConst(i64),
    DConst(OrderedFloat<f64>),
    SConst(String),
    Load { kind: ValueKind, slot: u16 },
    Store { kind: ValueKind, slot: u16 },
    IInc { slot: u16, delta: i16 },
    Pop,
    Pop2,
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Swap,
    Arith { op: ArithOp, kind: ValueKind },
    Convert { from: ValueKind, to: ValueKind },
    LCmp,
    DCmpL,
    DCmpG,
    Jump { condition: Condition, target: Label },
    Invoke { kind: InvokeKind, member: MemberRef },
    /// An indirect call site resolved at first invocation by the runtime
    /// dispatch cache; `bootstrap` names the linkage method.
    InvokeDynamic { name: String, descriptor: String, bootstrap: MemberRef },
    New(String),
    GetField(MemberRef),
    PutField(MemberRef),
    GetStatic(MemberRef),
    PutStatic(MemberRef),
    Return(ValueKind),
    ReturnVoid,
    Throw,
    CheckCast(String),
    InstanceOf(String),
}

impl Instruction {
    pub fn goto(target: Label) -> Self {
        Instruction::Jump { condition: Condition::Always, target }
    }

    pub fn jump(condition: Condition, target: Label) -> Self {
        Instruction::Jump { condition, target }
    }

    pub fn load(ty: &Type, slot: u16) -> Self {
        Instruction::Load { kind: ValueKind::of(ty), slot }
    }

    pub fn store(ty: &Type, slot: u16) -> Self {
        Instruction::Store { kind: ValueKind::of(ty), slot }
    }

    pub fn invoke(kind: InvokeKind, owner: &str, name: &str, descriptor: impl Into<String>) -> Self {
        Instruction::Invoke { kind, member: MemberRef::new(owner, name, descriptor) }
    }

    pub fn check_cast(class: &str) -> Self {
        Instruction::CheckCast(names::internal(class))
    }

    pub fn new_object(class: &str) -> Self {
        Instruction::New(names::internal(class))
    }

    /// Discards a value of the given width.
    pub fn pop(width: u8) -> Option<Self> {
        match width {
            0 => None,
            1 => Some(Instruction::Pop),
            _ => Some(Instruction::Pop2),
        }
    }

    /// Duplicates a value of the given width.
    pub fn dup(width: u8) -> Option<Self> {
        match width {
            0 => None,
            1 => Some(Instruction::Dup),
            _ => Some(Instruction::Dup2),
        }
    }

    /// Pushes the zero value of a type: `0`, `0L`, `0.0` or `null`.
    pub fn zero(ty: &Type) -> Option<Self> {
        if ty.is_void() {
            return None;
        }
        Some(match ValueKind::of(ty) {
            ValueKind::Int => Instruction::IConst(0),
            ValueKind::Long => Instruction::LConst(0),
            ValueKind::Double => Instruction::DConst(OrderedFloat(0.0)),
            ValueKind::Reference => Instruction::AConstNull,
        })
    }

    /// The typed return for a value of `ty`.
    pub fn ret(ty: &Type) -> Self {
        if ty.is_void() {
            Instruction::ReturnVoid
        } else {
            Instruction::Return(ValueKind::of(ty))
        }
    }

    /// The opcode this instruction encodes as; `None` for label markers.
    pub fn opcode(&self) -> Option<Opcode> {
        use Instruction as I;
        let op = match self {
            I::Label(_) => return None,
            I::Nop => Opcode::Nop,
            I::AConstNull => Opcode::AConstNull,
            I::IConst(value) => match *value {
                -1 => Opcode::IConstM1,
                0 => Opcode::IConst0,
                1 => Opcode::IConst1,
                2 => Opcode::IConst2,
                3 => Opcode::IConst3,
                4 => Opcode::IConst4,
                5 => Opcode::IConst5,
                v if i8::try_from(v).is_ok() => Opcode::BiPush,
                v if i16::try_from(v).is_ok() => Opcode::SiPush,
                _ => Opcode::Ldc,
            },
            I::LConst(0) => Opcode::LConst0,
            I::LConst(1) => Opcode::LConst1,
            I::LConst(_) => Opcode::Ldc2W,
            I::DConst(value) if value.0 == 0.0 && value.0.is_sign_positive() => Opcode::DConst0,
            I::DConst(value) if value.0 == 1.0 => Opcode::DConst1,
            I::DConst(_) => Opcode::Ldc2W,
            I::SConst(_) => Opcode::Ldc,
            I::Load { kind, .. } => match kind {
                ValueKind::Int => Opcode::ILoad,
                ValueKind::Long => Opcode::LLoad,
                ValueKind::Double => Opcode::DLoad,
                ValueKind::Reference => Opcode::ALoad,
            },
            I::Store { kind, .. } => match kind {
                ValueKind::Int => Opcode::IStore,
                ValueKind::Long => Opcode::LStore,
                ValueKind::Double => Opcode::DStore,
                ValueKind::Reference => Opcode::AStore,
            },
            I::IInc { .. } => Opcode::IInc,
            I::Pop => Opcode::Pop,
            I::Pop2 => Opcode::Pop2,
            I::Dup => Opcode::Dup,
            I::DupX1 => Opcode::DupX1,
            I::DupX2 => Opcode::DupX2,
            I::Dup2 => Opcode::Dup2,
            I::Dup2X1 => Opcode::Dup2X1,
            I::Dup2X2 => Opcode::Dup2X2,
            I::Swap => Opcode::Swap,
            I::Arith { op, kind } => arith_opcode(*op, *kind),
            I::Convert { from, to } => match (from, to) {
                (ValueKind::Int, ValueKind::Long) => Opcode::I2L,
                (ValueKind::Int, ValueKind::Double) => Opcode::I2D,
                (ValueKind::Long, ValueKind::Int) => Opcode::L2I,
                (ValueKind::Long, ValueKind::Double) => Opcode::L2D,
                (ValueKind::Double, ValueKind::Int) => Opcode::D2I,
                (ValueKind::Double, ValueKind::Long) => Opcode::D2L,
                _ => Opcode::Nop,
            },
            I::LCmp => Opcode::LCmp,
            I::DCmpL => Opcode::DCmpL,
            I::DCmpG => Opcode::DCmpG,
            I::Jump { condition, .. } => match condition {
                Condition::Always => Opcode::Goto,
                Condition::Eq => Opcode::IfEq,
                Condition::Ne => Opcode::IfNe,
                Condition::Lt => Opcode::IfLt,
                Condition::Ge => Opcode::IfGe,
                Condition::Gt => Opcode::IfGt,
                Condition::Le => Opcode::IfLe,
                Condition::ICmpEq => Opcode::IfICmpEq,
                Condition::ICmpNe => Opcode::IfICmpNe,
                Condition::ICmpLt => Opcode::IfICmpLt,
                Condition::ICmpGe => Opcode::IfICmpGe,
                Condition::ICmpGt => Opcode::IfICmpGt,
                Condition::ICmpLe => Opcode::IfICmpLe,
                Condition::ACmpEq => Opcode::IfACmpEq,
                Condition::ACmpNe => Opcode::IfACmpNe,
                Condition::Null => Opcode::IfNull,
                Condition::NonNull => Opcode::IfNonNull,
            },
            I::Invoke { kind, .. } => match kind {
                InvokeKind::Virtual => Opcode::InvokeVirtual,
                InvokeKind::Special => Opcode::InvokeSpecial,
                InvokeKind::Static => Opcode::InvokeStatic,
                InvokeKind::Interface => Opcode::InvokeInterface,
            },
            I::InvokeDynamic { .. } => Opcode::InvokeDynamic,
            I::New(_) => Opcode::New,
            I::GetField(_) => Opcode::GetField,
            I::PutField(_) => Opcode::PutField,
            I::GetStatic(_) => Opcode::GetStatic,
            I::PutStatic(_) => Opcode::PutStatic,
            I::Return(kind) => match kind {
                ValueKind::Int => Opcode::IReturn,
                ValueKind::Long => Opcode::LReturn,
                ValueKind::Double => Opcode::DReturn,
                ValueKind::Reference => Opcode::AReturn,
            },
            I::ReturnVoid => Opcode::Return,
            I::Throw => Opcode::AThrow,
            I::CheckCast(_) => Opcode::CheckCast,
            I::InstanceOf(_) => Opcode::InstanceOf,
        };
        Some(op)
    }

    /// Branch target, if this instruction can transfer control to a label.
    pub fn target(&self) -> Option<Label> {
        match self {
            Instruction::Jump { target, .. } => Some(*target),
            _ => None,
        }
    }
}

fn arith_opcode(op: ArithOp, kind: ValueKind) -> Opcode {
    use ArithOp::*;
    use ValueKind::*;
    match (op, kind) {
        (Add, Long) => Opcode::LAdd,
        (Add, Double) => Opcode::DAdd,
        (Add, _) => Opcode::IAdd,
        (Sub, Long) => Opcode::LSub,
        (Sub, Double) => Opcode::DSub,
        (Sub, _) => Opcode::ISub,
        (Mul, Long) => Opcode::LMul,
        (Mul, Double) => Opcode::DMul,
        (Mul, _) => Opcode::IMul,
        (Div, Long) => Opcode::LDiv,
        (Div, Double) => Opcode::DDiv,
        (Div, _) => Opcode::IDiv,
        (Rem, Long) => Opcode::LRem,
        (Rem, Double) => Opcode::DRem,
        (Rem, _) => Opcode::IRem,
        (Neg, Long) => Opcode::LNeg,
        (Neg, Double) => Opcode::DNeg,
        (Neg, _) => Opcode::INeg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_int_constants_use_short_forms() {
        assert_eq!(Instruction::IConst(3).opcode(), Some(Opcode::IConst3));
        assert_eq!(Instruction::IConst(100).opcode(), Some(Opcode::BiPush));
        assert_eq!(Instruction::IConst(1000).opcode(), Some(Opcode::SiPush));
        assert_eq!(Instruction::IConst(100_000).opcode(), Some(Opcode::Ldc));
    }

    #[test]
    fn arithmetic_follows_value_kind() {
        let add = |kind| Instruction::Arith { op: ArithOp::Add, kind }.opcode();
        assert_eq!(add(ValueKind::Int), Some(Opcode::IAdd));
        assert_eq!(add(ValueKind::Long), Some(Opcode::LAdd));
        assert_eq!(add(ValueKind::Double), Some(Opcode::DAdd));
    }

    #[test]
    fn labels_have_no_opcode() {
        assert_eq!(Instruction::Label(Label(0)).opcode(), None);
    }

    #[test]
    fn negated_conditions_are_involutive() {
        for c in [Condition::Eq, Condition::ICmpLt, Condition::ACmpEq, Condition::Null] {
            assert_eq!(c.negate().negate(), c);
        }
    }

    #[test]
    fn value_kinds() {
        assert_eq!(ValueKind::of(&Type::BOOLEAN), ValueKind::Int);
        assert_eq!(ValueKind::of(&Type::CHAR), ValueKind::Int);
        assert_eq!(ValueKind::of(&Type::DOUBLE), ValueKind::Double);
        assert_eq!(ValueKind::of(&Type::string()), ValueKind::Reference);
        assert_eq!(ValueKind::of(&Type::Null), ValueKind::Reference);
    }

    #[test]
    fn member_refs_use_internal_names() {
        let member = MemberRef::new("java.lang.String", "length", "()I");
        assert_eq!(member.owner, "java/lang/String");
    }
}
