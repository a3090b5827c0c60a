use crate::ir::op::OpId;

/// An opaque, index-based reference to an SSA value within a function.
///
/// Invariant: `ValueId(n)` is only valid within the `IrFunction` that produced
/// it. Do not store `ValueId`s across function boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(pub u32);

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// The definition site of an SSA value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDef {
    /// The `index`-th function argument.
    Argument { index: usize },
    /// The `index`-th result of operation `op`.
    OpResult { op: OpId, index: usize },
}

/// One operand slot reading a value: operand number `operand` of `user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Use {
    pub user: OpId,
    pub operand: u32,
}
