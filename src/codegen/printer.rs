//! IR pretty-printer.
//!
//! Emits a human-readable text representation of an `IrModule`.
//! Output is deterministic: functions are printed in `FunctionId` order and
//! operations in body order, so two structurally identical modules print to
//! the same text.

use std::fmt::Write;

use crate::error::CodegenError;
use crate::ir::function::IrFunction;
use crate::ir::module::IrModule;
use crate::ir::op::{Op, OpKind};

/// Emits a full text dump of the IR module.
pub fn emit_ir_text(module: &IrModule) -> Result<String, CodegenError> {
    let mut out = String::new();
    writeln!(out, "// module: {}", module.name)?;
    if let Some(session_init) = module.session_initializer() {
        let names: Vec<String> = session_init
            .initializers
            .iter()
            .map(|n| format!("@{}", n))
            .collect();
        writeln!(out, "// session_initializer: [{}]", names.join(", "))?;
    }

    for func in module.functions() {
        writeln!(out)?;
        emit_function(&mut out, func)?;
    }
    Ok(out)
}

/// Emits a single function.
pub fn emit_function_text(func: &IrFunction) -> Result<String, CodegenError> {
    let mut out = String::new();
    emit_function(&mut out, func)?;
    Ok(out)
}

fn emit_function(out: &mut String, func: &IrFunction) -> Result<(), CodegenError> {
    write!(out, "def @{}(", func.name)?;
    for (i, arg) in func.args().iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        let ty = func
            .value_type(arg.value)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "<erased>".into());
        write!(out, "{}: {}", arg.value, ty)?;
        if let Some(path) = &arg.attrs.index_path {
            write!(out, " {{index_path = [{}]}}", quoted_list(path))?;
        }
        if let Some(name) = &arg.name {
            write!(out, " loc({:?})", name)?;
        }
    }
    write!(out, ") -> (")?;
    for (i, ty) in func.function_type().results.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        write!(out, "{}", ty)?;
    }
    write!(out, ")")?;

    let mut attrs = Vec::new();
    if let Some(kind) = &func.initializer_type {
        attrs.push(format!("initializer_type = {:?}", kind));
    }
    if !func.exported_names.is_empty() {
        attrs.push(format!("exported_names = [{}]", quoted_list(&func.exported_names)));
    }
    if !attrs.is_empty() {
        write!(out, " attributes {{{}}}", attrs.join(", "))?;
    }
    writeln!(out, " {{")?;

    for op in func.ops() {
        write!(out, "    ")?;
        emit_op(out, func, op)?;
        writeln!(out)?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

fn emit_op(out: &mut String, func: &IrFunction, op: &Op) -> Result<(), CodegenError> {
    if !op.results.is_empty() {
        let results: Vec<String> = op.results.iter().map(|r| r.to_string()).collect();
        write!(out, "{} = ", results.join(", "))?;
    }

    match &op.kind {
        OpKind::VarHandle { shared_name } => {
            write!(out, "var_handle {{shared_name = {:?}}}", shared_name)?;
        }
        OpKind::Const { value } => {
            write!(out, "const {}", value)?;
        }
        OpKind::Return => {
            write!(out, "return")?;
            if !op.operands.is_empty() {
                write!(out, " {}", operand_list(op))?;
            }
        }
        OpKind::AssignVariable => {
            write!(out, "assign_variable {}", operand_list(op))?;
        }
        OpKind::RestoreV2 | OpKind::Generic { .. } => {
            write!(out, "{}({})", op.kind.mnemonic(), operand_list(op))?;
        }
    }

    if !op.results.is_empty() {
        let tys: Vec<String> = op
            .results
            .iter()
            .map(|r| {
                func.value_type(*r)
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "<erased>".into())
            })
            .collect();
        write!(out, " : {}", tys.join(", "))?;
    }
    if let Some(loc) = &op.loc {
        write!(out, " loc({:?})", loc)?;
    }
    Ok(())
}

fn operand_list(op: &Op) -> String {
    let parts: Vec<String> = op.operands.iter().map(|v| v.to_string()).collect();
    parts.join(", ")
}

fn quoted_list(items: &[String]) -> String {
    let parts: Vec<String> = items.iter().map(|s| format!("{:?}", s)).collect();
    parts.join(", ")
}
