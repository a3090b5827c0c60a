//! Tensor IR for model initializer functions, and the pass that turns
//! constant variable initialization into a bulk checkpoint restore.
//!
//! ```text
//! IrFunctionBuilder → [IrModule] → PassManager → printer
//! ```
//!
//! Passes:
//! 1. `InsertRestoreOpPass` (`quant-insert-restore-op`) — replaces
//!    `assign_variable(var_handle, const)` in the `restore_op` initializer
//!    with a single `restore_v2` op fed by a `file_prefix` argument
//! 2. `ValidatePass` (`validate`) — structural and use-list consistency

pub mod codegen;
pub mod error;
pub mod ir;
pub mod pass;

pub use error::Error;
pub use pass::{InsertRestoreOpPass, Pass, PassManager, ValidatePass};

use crate::ir::module::IrModule;

/// Runs `InsertRestoreOpPass` on `module`.
///
/// Leaves the module unchanged when it has no `restore_op` initializer or
/// that initializer assigns no constants to variables.
pub fn insert_restore_op(module: &mut IrModule) -> Result<(), Error> {
    InsertRestoreOpPass.run(module)?;
    Ok(())
}

/// Runs the rewrite followed by validation, returning the printed result.
pub fn insert_restore_op_and_print(module: &mut IrModule) -> Result<String, Error> {
    let mut pm = PassManager::new();
    pm.add_pass(InsertRestoreOpPass);
    pm.add_pass(ValidatePass);
    pm.run(module).map_err(|(_, e)| Error::Pass(e))?;
    Ok(codegen::emit_ir_text(module)?)
}
