//! Cursor-based op construction inside an existing function.
//!
//! `IrFunctionBuilder` (in `module.rs`) assembles a function from scratch;
//! `OpBuilder` edits one that already exists, inserting new operations at a
//! movable insertion point.

use crate::error::IrError;
use crate::ir::function::IrFunction;
use crate::ir::op::{ElementsAttr, OpId, OpKind};
use crate::ir::types::IrType;
use crate::ir::value::ValueId;

/// Where the next created op goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPoint {
    /// Immediately before the anchor. Successive ops keep creation order.
    Before(OpId),
    /// Immediately after the anchor. The cursor then moves past the new op,
    /// so successive ops also keep creation order.
    After(OpId),
    /// At the end of the body.
    End,
}

pub struct OpBuilder<'f> {
    func: &'f mut IrFunction,
    point: InsertPoint,
}

impl<'f> OpBuilder<'f> {
    pub fn new(func: &'f mut IrFunction, point: InsertPoint) -> Self {
        Self { func, point }
    }

    /// Positions the cursor right before the function's terminator, or at the
    /// end of the body when there is none.
    pub fn at_block_terminator(func: &'f mut IrFunction) -> Self {
        let point = func.terminator().map_or(InsertPoint::End, InsertPoint::Before);
        Self { func, point }
    }

    pub fn insertion_point(&self) -> InsertPoint {
        self.point
    }

    pub fn set_insertion_point(&mut self, point: InsertPoint) {
        self.point = point;
    }

    pub fn func(&self) -> &IrFunction {
        &*self.func
    }

    pub fn func_mut(&mut self) -> &mut IrFunction {
        &mut *self.func
    }

    /// Creates an op at the cursor and returns its id.
    pub fn create(
        &mut self,
        kind: OpKind,
        operands: Vec<ValueId>,
        result_types: Vec<IrType>,
        loc: Option<&str>,
    ) -> Result<OpId, IrError> {
        let index = match self.point {
            InsertPoint::Before(anchor) => self.anchor_position(anchor)?,
            InsertPoint::After(anchor) => self.anchor_position(anchor)? + 1,
            InsertPoint::End => self.func.body.len(),
        };
        let id = self
            .func
            .insert_op_at(index, kind, operands, result_types, loc.map(str::to_owned))?;
        if let InsertPoint::After(_) = self.point {
            self.point = InsertPoint::After(id);
        }
        log::trace!("{}: created {} at body index {}", self.func.name, id, index);
        Ok(id)
    }

    /// Creates a `const` op and returns its single result.
    pub fn create_const(
        &mut self,
        value: ElementsAttr,
        loc: Option<&str>,
    ) -> Result<ValueId, IrError> {
        let ty = value.ty.clone();
        let id = self.create(OpKind::Const { value }, vec![], vec![ty], loc)?;
        self.func
            .op(id)
            .and_then(|op| op.results.first().copied())
            .ok_or_else(|| IrError::UnknownOp {
                func: self.func.name.clone(),
                op: id.to_string(),
            })
    }

    /// Creates `assign_variable(resource, value)`.
    pub fn create_assign(&mut self, resource: ValueId, value: ValueId) -> Result<OpId, IrError> {
        self.create(OpKind::AssignVariable, vec![resource, value], vec![], None)
    }

    fn anchor_position(&self, anchor: OpId) -> Result<usize, IrError> {
        self.func
            .position(anchor)
            .ok_or_else(|| IrError::BadInsertPoint {
                func: self.func.name.clone(),
                op: anchor.to_string(),
            })
    }
}
