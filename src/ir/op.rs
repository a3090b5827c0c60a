use crate::ir::types::IrType;
use crate::ir::value::ValueId;

/// Stable handle to an operation within an `IrFunction`.
///
/// Handles are never reused: erasing an operation leaves a tombstone, so a
/// stale `OpId` is detected rather than silently aliasing a newer op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(pub u32);

impl std::fmt::Display for OpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op{}", self.0)
    }
}

/// A single element of a constant tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Float(f64),
    Int(i64),
    Bool(bool),
    Str(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Float(v) => write!(f, "{:?}", v),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Dense tensor payload of a `const` operation.
///
/// Invariant: when `ty` has a static shape, `values.len()` equals its
/// element count.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementsAttr {
    pub ty: IrType,
    pub values: Vec<Literal>,
}

impl ElementsAttr {
    pub fn new(ty: IrType, values: Vec<Literal>) -> Self {
        Self { ty, values }
    }

    /// A 1-D string tensor holding `values` in order.
    pub fn strings<S: AsRef<str>>(values: &[S]) -> Self {
        let ty = IrType::vector(crate::ir::types::DType::Str, values.len() as u64);
        let values = values
            .iter()
            .map(|s| Literal::Str(s.as_ref().to_owned()))
            .collect();
        Self { ty, values }
    }

    /// A rank-0 float tensor.
    pub fn scalar_f32(value: f32) -> Self {
        Self {
            ty: IrType::scalar(crate::ir::types::DType::F32),
            values: vec![Literal::Float(value as f64)],
        }
    }

    /// Returns the string elements, or `None` if any element is not a string.
    pub fn as_strings(&self) -> Option<Vec<&str>> {
        self.values
            .iter()
            .map(|v| match v {
                Literal::Str(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl std::fmt::Display for ElementsAttr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dense<")?;
        let is_scalar = self.ty.shape().map_or(false, |s| s.rank() == 0);
        if is_scalar && self.values.len() == 1 {
            write!(f, "{}", self.values[0])?;
        } else {
            write!(f, "[")?;
            for (i, v) in self.values.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", v)?;
            }
            write!(f, "]")?;
        }
        write!(f, ">")
    }
}

/// The closed set of operation kinds this IR distinguishes.
///
/// Only the kinds the restore rewrite needs to recognise or produce get their
/// own variant; everything else is carried as `Generic`.
#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    /// Declares a checkpoint-addressable variable. One result: `resource<T>`.
    VarHandle { shared_name: String },
    /// `assign_variable(resource, value)`. Two operands, no results.
    AssignVariable,
    /// Literal tensor. No operands, one result.
    Const { value: ElementsAttr },
    /// Bulk restore: `(prefix, tensor_names, shape_and_slices)` operands,
    /// one result per restored tensor.
    RestoreV2,
    /// Function terminator; operands are the returned values.
    Return,
    /// Any other operation, identified by name.
    Generic { name: String },
}

impl OpKind {
    pub fn mnemonic(&self) -> &str {
        match self {
            OpKind::VarHandle { .. } => "var_handle",
            OpKind::AssignVariable => "assign_variable",
            OpKind::Const { .. } => "const",
            OpKind::RestoreV2 => "restore_v2",
            OpKind::Return => "return",
            OpKind::Generic { name } => name,
        }
    }
}

/// A node in a function body.
#[derive(Debug, Clone)]
pub struct Op {
    pub id: OpId,
    pub kind: OpKind,
    pub operands: Vec<ValueId>,
    pub results: Vec<ValueId>,
    /// Optional location name, e.g. `tensor_names`.
    pub loc: Option<String>,
}

impl Op {
    pub fn is_terminator(&self) -> bool {
        matches!(self.kind, OpKind::Return)
    }

    pub fn is_var_handle(&self) -> bool {
        matches!(self.kind, OpKind::VarHandle { .. })
    }

    pub fn is_assign_variable(&self) -> bool {
        matches!(self.kind, OpKind::AssignVariable)
    }

    pub fn is_const(&self) -> bool {
        matches!(self.kind, OpKind::Const { .. })
    }

    pub fn is_restore(&self) -> bool {
        matches!(self.kind, OpKind::RestoreV2)
    }

    /// Shared name of a `var_handle`; `None` for every other kind.
    pub fn shared_name(&self) -> Option<&str> {
        match &self.kind {
            OpKind::VarHandle { shared_name } => Some(shared_name),
            _ => None,
        }
    }

    pub fn const_value(&self) -> Option<&ElementsAttr> {
        match &self.kind {
            OpKind::Const { value } => Some(value),
            _ => None,
        }
    }
}
