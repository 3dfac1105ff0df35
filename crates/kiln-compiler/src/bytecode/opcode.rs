//! Platform operation codes.
//!
//! The numbering is the class-file instruction set's; the serializer writes
//! `u8::from(opcode)` directly. Only the opcodes the compiler emits are
//! listed.

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    // =========================================================================
    // Constants
    // =========================================================================
    Nop = 0,
    AConstNull = 1,
    IConstM1 = 2,
    IConst0 = 3,
    IConst1 = 4,
    IConst2 = 5,
    IConst3 = 6,
    IConst4 = 7,
    IConst5 = 8,
    LConst0 = 9,
    LConst1 = 10,
    DConst0 = 14,
    DConst1 = 15,
    BiPush = 16,
    SiPush = 17,
    Ldc = 18,
    Ldc2W = 20,

    // =========================================================================
    // Locals
    // =========================================================================
    ILoad = 21,
    LLoad = 22,
    DLoad = 24,
    ALoad = 25,
    IStore = 54,
    LStore = 55,
    DStore = 57,
    AStore = 58,
    IInc = 132,

    // =========================================================================
    // Stack
    // =========================================================================
    Pop = 87,
    Pop2 = 88,
    Dup = 89,
    DupX1 = 90,
    DupX2 = 91,
    Dup2 = 92,
    Dup2X1 = 93,
    Dup2X2 = 94,
    Swap = 95,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    IAdd = 96,
    LAdd = 97,
    DAdd = 99,
    ISub = 100,
    LSub = 101,
    DSub = 103,
    IMul = 104,
    LMul = 105,
    DMul = 107,
    IDiv = 108,
    LDiv = 109,
    DDiv = 111,
    IRem = 112,
    LRem = 113,
    DRem = 115,
    INeg = 116,
    LNeg = 117,
    DNeg = 119,

    // =========================================================================
    // Conversions and comparisons
    // =========================================================================
    I2L = 133,
    I2D = 135,
    L2I = 136,
    L2D = 138,
    D2I = 142,
    D2L = 143,
    I2C = 146,
    LCmp = 148,
    DCmpL = 151,
    DCmpG = 152,

    // =========================================================================
    // Control flow
    // =========================================================================
    IfEq = 153,
    IfNe = 154,
    IfLt = 155,
    IfGe = 156,
    IfGt = 157,
    IfLe = 158,
    IfICmpEq = 159,
    IfICmpNe = 160,
    IfICmpLt = 161,
    IfICmpGe = 162,
    IfICmpGt = 163,
    IfICmpLe = 164,
    IfACmpEq = 165,
    IfACmpNe = 166,
    Goto = 167,
    IReturn = 172,
    LReturn = 173,
    DReturn = 175,
    AReturn = 176,
    Return = 177,
    IfNull = 198,
    IfNonNull = 199,

    // =========================================================================
    // Objects and calls
    // =========================================================================
    GetStatic = 178,
    PutStatic = 179,
    GetField = 180,
    PutField = 181,
    InvokeVirtual = 182,
    InvokeSpecial = 183,
    InvokeStatic = 184,
    InvokeInterface = 185,
    InvokeDynamic = 186,
    New = 187,
    AThrow = 191,
    CheckCast = 192,
    InstanceOf = 193,
}

impl Opcode {
    /// Whether this opcode transfers control to another method.
    pub fn is_invoke(self) -> bool {
        matches!(
            self,
            Opcode::InvokeVirtual
                | Opcode::InvokeSpecial
                | Opcode::InvokeStatic
                | Opcode::InvokeInterface
                | Opcode::InvokeDynamic
        )
    }

    /// Whether execution never falls through to the next instruction.
    pub fn ends_block(self) -> bool {
        matches!(
            self,
            Opcode::Goto
                | Opcode::IReturn
                | Opcode::LReturn
                | Opcode::DReturn
                | Opcode::AReturn
                | Opcode::Return
                | Opcode::AThrow
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_matches_the_platform() {
        assert_eq!(u8::from(Opcode::IAdd), 0x60);
        assert_eq!(u8::from(Opcode::Goto), 0xa7);
        assert_eq!(u8::from(Opcode::InvokeDynamic), 0xba);
        assert_eq!(Opcode::try_from(0xb1u8).ok(), Some(Opcode::Return));
    }

    #[test]
    fn unknown_bytes_are_rejected() {
        assert!(Opcode::try_from(0xffu8).is_err());
    }

    #[test]
    fn classification() {
        assert!(Opcode::InvokeStatic.is_invoke());
        assert!(!Opcode::Goto.is_invoke());
        assert!(Opcode::AThrow.ends_block());
        assert!(!Opcode::IfEq.ends_block());
    }
}
