//! Rewrites constant variable initialization into a bulk checkpoint restore.
//!
//! The `restore_op` initializer of a module typically looks like
//!
//! ```text
//! %0 = var_handle {shared_name = "w"} : resource<tensor<2xf32>>
//! %1 = const dense<[1.0, 2.0]> : tensor<2xf32>
//! assign_variable %0, %1
//! ```
//!
//! `InsertRestoreOpPass` removes every `assign_variable(var_handle, const)`
//! triple it finds and instead loads all of those variables with one
//! `restore_v2` op fed by a new `file_prefix` argument:
//!
//! ```text
//! %5 = const dense<["w"]> : tensor<1xstr> loc("tensor_names")
//! %6 = const dense<[""]> : tensor<1xstr> loc("shape_and_slices")
//! %7 = restore_v2(%4, %5, %6) : tensor<2xf32>
//! assign_variable %0, %7
//! ```
//!
//! An existing `restore_v2` op is not reused. Running the pass again after new
//! `assign_variable(var_handle, const)` ops were added creates a second restore
//! op and a second `file_prefix` argument.

use crate::error::{IrError, PassError};
use crate::ir::builder::OpBuilder;
use crate::ir::function::{ArgAttrs, IrFunction};
use crate::ir::module::{IrModule, INITIALIZER_TYPE_RESTORE_OP};
use crate::ir::op::{ElementsAttr, OpId, OpKind};
use crate::ir::types::{DType, IrType};
use crate::ir::value::ValueId;
use crate::pass::Pass;

pub const PASS_NAME: &str = "quant-insert-restore-op";

/// Name and `index_path` of the checkpoint path-prefix argument.
pub const FILE_PREFIX: &str = "file_prefix";
pub const TENSOR_NAMES_LOC: &str = "tensor_names";
pub const SHAPE_AND_SLICES_LOC: &str = "shape_and_slices";

pub struct InsertRestoreOpPass;

impl Pass for InsertRestoreOpPass {
    fn name(&self) -> &'static str {
        PASS_NAME
    }

    fn description(&self) -> &'static str {
        "Creates a restore_v2 op in the 'restore_op' initializer function and \
         replaces each assign_variable(var_handle, const) with \
         assign_variable(var_handle, restore_v2#N)"
    }

    fn run(&mut self, module: &mut IrModule) -> Result<(), PassError> {
        let Some(init_id) = module.find_initializer(INITIALIZER_TYPE_RESTORE_OP) else {
            log::info!(
                "No session initializer function with type '{}'. restore_v2 op will not be created.",
                INITIALIZER_TYPE_RESTORE_OP
            );
            return Ok(());
        };
        let Some(init_func) = module.function_mut(init_id) else {
            return Ok(());
        };

        let targets = remove_assign_and_const_ops(init_func)?;
        if targets.is_empty() {
            log::info!(
                "There are no var_handle ops to restore in '{}'. restore_v2 op will not be created.",
                init_func.name
            );
            return Ok(());
        }

        create_restore_op(init_func, &targets)?;
        Ok(())
    }
}

/// One matched `assign_variable(var_handle, const)`: the variable to restore.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreTarget {
    pub var_handle: OpId,
    /// The handle value the erased assign wrote through.
    pub resource: ValueId,
    /// `T` of the handle's `resource<T>` type; the restored tensor's type.
    pub content: IrType,
}

/// Finds `assign_variable(var_handle, const)` patterns and removes the
/// `assign_variable` ops, plus each `const` that is left without uses.
///
/// Returns the matched variables in body order. A variable assigned by
/// several matching ops appears once per match. A handle whose type is not
/// `resource<T>` does not match, so nothing is erased for it.
pub fn remove_assign_and_const_ops(func: &mut IrFunction) -> Result<Vec<RestoreTarget>, IrError> {
    let mut targets = Vec::new();

    for assign in func.ops_where(|op| op.is_assign_variable()) {
        let Some(op) = func.op(assign) else { continue };
        let (Some(&resource), Some(&value)) = (op.operands.first(), op.operands.get(1)) else {
            continue;
        };

        let Some(var_handle) = func.defining_op(resource).filter(|d| d.is_var_handle()) else {
            continue;
        };
        let var_handle = var_handle.id;
        let Some(const_op) = func.defining_op(value).filter(|d| d.is_const()) else {
            continue;
        };
        let const_op = const_op.id;
        let Some(content) = func.value_type(resource).and_then(|t| t.resource_subtype()).cloned()
        else {
            log::debug!(
                "{}: {} is not a resource handle; leaving its assign in place",
                func.name,
                resource
            );
            continue;
        };

        log::debug!(
            "{}: restoring variable '{}' instead of its constant initializer",
            func.name,
            func.op(var_handle).and_then(|o| o.shared_name()).unwrap_or_default()
        );
        targets.push(RestoreTarget {
            var_handle,
            resource,
            content,
        });

        func.erase_op(assign)?;
        if func.use_empty(value) {
            func.erase_op(const_op)?;
        }
    }

    Ok(targets)
}

/// Appends a `tensor<str>` argument carrying the checkpoint file prefix.
pub fn insert_file_prefix_argument(func: &mut IrFunction) -> ValueId {
    let attrs = ArgAttrs {
        index_path: Some(vec![FILE_PREFIX.to_owned()]),
    };
    func.append_argument(IrType::scalar(DType::Str), Some(FILE_PREFIX), attrs)
}

/// Creates the 1-D string const feeding `tensor_names` at the builder's cursor.
pub fn create_tensor_names_const(
    builder: &mut OpBuilder<'_>,
    tensor_names: &[String],
) -> Result<ValueId, IrError> {
    builder.create_const(ElementsAttr::strings(tensor_names), Some(TENSOR_NAMES_LOC))
}

/// Creates the 1-D string const feeding `shape_and_slices`: `size` empty
/// strings, i.e. every tensor is restored whole.
pub fn create_shape_and_slices_const(
    builder: &mut OpBuilder<'_>,
    size: usize,
) -> Result<ValueId, IrError> {
    let values = vec![String::new(); size];
    builder.create_const(ElementsAttr::strings(&values), Some(SHAPE_AND_SLICES_LOC))
}

/// Inserts the `restore_v2` op before the terminator, followed by one
/// `assign_variable` per target, wiring the i-th variable to the i-th
/// restored tensor.
pub fn create_restore_op(func: &mut IrFunction, targets: &[RestoreTarget]) -> Result<OpId, IrError> {
    let tensor_names: Vec<String> = targets
        .iter()
        .map(|t| {
            func.op(t.var_handle)
                .and_then(|op| op.shared_name())
                .unwrap_or_default()
                .to_owned()
        })
        .collect();
    let tensor_types: Vec<IrType> = targets.iter().map(|t| t.content.clone()).collect();

    let prefix = insert_file_prefix_argument(func);

    let mut builder = OpBuilder::at_block_terminator(func);
    let names = create_tensor_names_const(&mut builder, &tensor_names)?;
    let shape_and_slices = create_shape_and_slices_const(&mut builder, tensor_names.len())?;

    let restore = builder.create(
        OpKind::RestoreV2,
        vec![prefix, names, shape_and_slices],
        tensor_types,
        None,
    )?;
    let restored: Vec<ValueId> = builder
        .func()
        .op(restore)
        .map(|op| op.results.clone())
        .unwrap_or_default();

    for (target, tensor) in targets.iter().zip(restored) {
        builder.create_assign(target.resource, tensor)?;
    }

    log::info!(
        "{}: created {} restoring {} variable(s)",
        builder.func().name,
        restore,
        tensor_names.len()
    );
    Ok(restore)
}
