use crate::error::IrError;
use crate::ir::op::{Op, OpId, OpKind};
use crate::ir::types::IrType;
use crate::ir::value::{Use, ValueDef, ValueId};

/// Uniquely identifies a function within an `IrModule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(pub u32);

/// Per-argument metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgAttrs {
    /// Names this argument as an externally fed input, e.g. `["file_prefix"]`.
    pub index_path: Option<Vec<String>>,
}

/// A function argument: the SSA value it binds plus its metadata.
#[derive(Debug, Clone)]
pub struct Argument {
    pub value: ValueId,
    pub name: Option<String>,
    pub attrs: ArgAttrs,
}

/// Declared signature of a function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionType {
    pub inputs: Vec<IrType>,
    pub results: Vec<IrType>,
}

/// Type, definition site and use list of one SSA value.
#[derive(Debug, Clone)]
pub(crate) struct ValueInfo {
    pub(crate) ty: IrType,
    pub(crate) def: ValueDef,
    pub(crate) uses: Vec<Use>,
}

/// A function with a single flat body.
///
/// Operations and values live in arenas indexed by `OpId` / `ValueId`; erased
/// entries become `None` and their ids are never handed out again. `body`
/// holds the program order of the live operations.
///
/// Invariants maintained by the mutation methods:
/// - every operand slot of a live op appears exactly once in the use list of
///   the value it reads;
/// - `ty.inputs[i]` is the type of `args[i]`;
/// - an op is only erased once none of its results has a remaining use.
#[derive(Debug, Clone)]
pub struct IrFunction {
    pub id: FunctionId,
    pub name: String,
    /// `initializer_type` attribute (`"restore_op"`, `"init_op"`, ...).
    pub initializer_type: Option<String>,
    pub exported_names: Vec<String>,
    pub(crate) ty: FunctionType,
    pub(crate) args: Vec<Argument>,
    pub(crate) ops: Vec<Option<Op>>,
    pub(crate) body: Vec<OpId>,
    pub(crate) values: Vec<Option<ValueInfo>>,
}

impl IrFunction {
    pub(crate) fn new(name: impl Into<String>, results: Vec<IrType>) -> Self {
        Self {
            id: FunctionId(0),
            name: name.into(),
            initializer_type: None,
            exported_names: Vec::new(),
            ty: FunctionType {
                inputs: Vec::new(),
                results,
            },
            args: Vec::new(),
            ops: Vec::new(),
            body: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn function_type(&self) -> &FunctionType {
        &self.ty
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    pub fn num_args(&self) -> usize {
        self.args.len()
    }

    pub fn arg_value(&self, index: usize) -> Option<ValueId> {
        self.args.get(index).map(|a| a.value)
    }

    /// Live operation ids in program order.
    pub fn body(&self) -> &[OpId] {
        &self.body
    }

    /// Live operations in program order.
    pub fn ops(&self) -> impl Iterator<Item = &Op> + '_ {
        self.body.iter().filter_map(move |id| self.op(*id))
    }

    pub fn num_ops(&self) -> usize {
        self.body.len()
    }

    pub fn op(&self, id: OpId) -> Option<&Op> {
        self.ops.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Snapshot of the ids of every op matching `pred`, in program order.
    ///
    /// The returned list is detached from the body, so callers may erase ops
    /// while walking it.
    pub fn ops_where(&self, pred: impl Fn(&Op) -> bool) -> Vec<OpId> {
        self.ops().filter(|op| pred(op)).map(|op| op.id).collect()
    }

    /// The trailing `return`, if the body has one.
    pub fn terminator(&self) -> Option<OpId> {
        let last = *self.body.last()?;
        self.op(last).filter(|op| op.is_terminator()).map(|op| op.id)
    }

    /// Index of `op` within the body.
    pub fn position(&self, op: OpId) -> Option<usize> {
        self.body.iter().position(|id| *id == op)
    }

    pub fn value_type(&self, v: ValueId) -> Option<&IrType> {
        self.value_info(v).map(|info| &info.ty)
    }

    pub fn value_def(&self, v: ValueId) -> Option<ValueDef> {
        self.value_info(v).map(|info| info.def)
    }

    /// Every operand slot currently reading `v`.
    pub fn uses(&self, v: ValueId) -> &[Use] {
        match self.value_info(v) {
            Some(info) => &info.uses,
            None => &[],
        }
    }

    pub fn use_empty(&self, v: ValueId) -> bool {
        self.uses(v).is_empty()
    }

    /// The operation producing `v`, or `None` for arguments.
    pub fn defining_op(&self, v: ValueId) -> Option<&Op> {
        match self.value_def(v)? {
            ValueDef::OpResult { op, .. } => self.op(op),
            ValueDef::Argument { .. } => None,
        }
    }

    /// Content type of a `var_handle` op: the `T` of its `resource<T>` result.
    pub fn var_content_type(&self, var: OpId) -> Option<&IrType> {
        let op = self.op(var).filter(|op| op.is_var_handle())?;
        let handle = *op.results.first()?;
        self.value_type(handle)?.resource_subtype()
    }

    pub(crate) fn value_info(&self, v: ValueId) -> Option<&ValueInfo> {
        self.values.get(v.0 as usize).and_then(Option::as_ref)
    }

    fn fresh_value(&mut self, ty: IrType, def: ValueDef) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(Some(ValueInfo {
            ty,
            def,
            uses: Vec::new(),
        }));
        id
    }

    /// Appends an argument, extending the declared input signature.
    ///
    /// Existing argument indices are unaffected; the new argument's index is
    /// the previous argument count.
    pub fn append_argument(
        &mut self,
        ty: IrType,
        name: Option<&str>,
        attrs: ArgAttrs,
    ) -> ValueId {
        let index = self.args.len();
        let value = self.fresh_value(ty.clone(), ValueDef::Argument { index });
        self.args.push(Argument {
            value,
            name: name.map(str::to_owned),
            attrs,
        });
        self.ty.inputs.push(ty);
        value
    }

    /// Creates an operation and places it at `index` in the body.
    ///
    /// Registers one use per operand slot and allocates one result value per
    /// entry of `result_types`.
    pub(crate) fn insert_op_at(
        &mut self,
        index: usize,
        kind: OpKind,
        operands: Vec<ValueId>,
        result_types: Vec<IrType>,
        loc: Option<String>,
    ) -> Result<OpId, IrError> {
        for &v in &operands {
            if self.value_info(v).is_none() {
                return Err(IrError::UnknownValue {
                    func: self.name.clone(),
                    value: v.to_string(),
                });
            }
        }

        let id = OpId(self.ops.len() as u32);
        let results: Vec<ValueId> = result_types
            .into_iter()
            .enumerate()
            .map(|(i, ty)| self.fresh_value(ty, ValueDef::OpResult { op: id, index: i }))
            .collect();

        for (slot, &v) in operands.iter().enumerate() {
            if let Some(Some(info)) = self.values.get_mut(v.0 as usize) {
                info.uses.push(Use {
                    user: id,
                    operand: slot as u32,
                });
            }
        }

        self.ops.push(Some(Op {
            id,
            kind,
            operands,
            results,
            loc,
        }));
        let index = index.min(self.body.len());
        self.body.insert(index, id);
        Ok(id)
    }

    /// Removes `op` from the function.
    ///
    /// Fails with `IrError::ValueInUse` (leaving the function untouched) if any
    /// result of `op` is still read somewhere. On success the op's operand
    /// uses are detached, so the values it read may become use-empty.
    pub fn erase_op(&mut self, op: OpId) -> Result<(), IrError> {
        let (operands, results) = match self.op(op) {
            Some(o) => (o.operands.clone(), o.results.clone()),
            None => {
                return Err(IrError::UnknownOp {
                    func: self.name.clone(),
                    op: op.to_string(),
                })
            }
        };

        for &r in &results {
            let uses = self.uses(r).len();
            if uses > 0 {
                return Err(IrError::ValueInUse {
                    op: op.to_string(),
                    value: r.to_string(),
                    uses,
                });
            }
        }

        for v in operands {
            if let Some(Some(info)) = self.values.get_mut(v.0 as usize) {
                info.uses.retain(|u| u.user != op);
            }
        }
        for r in results {
            self.values[r.0 as usize] = None;
        }
        self.body.retain(|id| *id != op);
        self.ops[op.0 as usize] = None;
        Ok(())
    }
}
