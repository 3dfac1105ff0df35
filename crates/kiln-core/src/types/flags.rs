use bitflags::bitflags;

bitflags! {
    /// Modifiers of a declared method, constructor or field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const ABSTRACT = 0x0400;
        /// Generated by the compiler rather than declared in source.
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Modifiers of a class-like declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const ENUM = 0x4000;
    }
}

bitflags! {
    /// Capabilities an enumeration declares.
    ///
    /// Dynamically-keyed constant lookups need a value to produce when the
    /// key names no constant; only enumerations declaring `DEFAULT` have one.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EnumCapabilities: u8 {
        /// Declares a `defaultValue()` accessor.
        const DEFAULT = 0x01;
        /// Constants are comparable in declaration order.
        const ORDERED = 0x02;
    }
}
