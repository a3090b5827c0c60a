//! Structural validation pass.
//!
//! Checks the invariants every other pass relies on. It never mutates the
//! module; running it after a rewrite is how tests confirm that no dangling
//! uses or signature drift were left behind.

use std::collections::{HashMap, HashSet};

use crate::error::PassError;
use crate::ir::function::IrFunction;
use crate::ir::module::IrModule;
use crate::ir::op::OpKind;
use crate::ir::value::{Use, ValueDef, ValueId};
use crate::pass::Pass;

pub const PASS_NAME: &str = "validate";

/// Validates every function of the module.
///
/// Checks:
/// 1. Every operand is an argument or a result of an op placed earlier in the body.
/// 2. Every value's use list mirrors exactly the operand slots that read it.
/// 3. The body ends with exactly one `return`, and nothing follows it.
/// 4. Arguments and `return` operands agree with the declared signature.
/// 5. `assign_variable` stores a value of the variable's content type.
pub struct ValidatePass;

impl Pass for ValidatePass {
    fn name(&self) -> &'static str {
        PASS_NAME
    }

    fn description(&self) -> &'static str {
        "Checks def-before-use, use-list consistency, terminators and signatures"
    }

    fn run(&mut self, module: &mut IrModule) -> Result<(), PassError> {
        for func in module.functions() {
            validate_function(func)?;
        }
        Ok(())
    }
}

pub fn validate_function(func: &IrFunction) -> Result<(), PassError> {
    check_signature(func)?;
    check_body(func)?;
    check_use_lists(func)
}

fn check_signature(func: &IrFunction) -> Result<(), PassError> {
    let inputs = &func.function_type().inputs;
    if inputs.len() != func.num_args() {
        return Err(PassError::SignatureMismatch {
            func: func.name.clone(),
            detail: format!(
                "{} argument(s) but the signature declares {} input(s)",
                func.num_args(),
                inputs.len()
            ),
        });
    }
    for (i, (arg, declared)) in func.args().iter().zip(inputs).enumerate() {
        if func.value_type(arg.value) != Some(declared) {
            return Err(PassError::SignatureMismatch {
                func: func.name.clone(),
                detail: format!("argument #{} does not have its declared type {}", i, declared),
            });
        }
        if func.value_def(arg.value) != Some(ValueDef::Argument { index: i }) {
            return Err(PassError::SignatureMismatch {
                func: func.name.clone(),
                detail: format!("argument #{} is not bound to its own index", i),
            });
        }
    }
    Ok(())
}

fn check_body(func: &IrFunction) -> Result<(), PassError> {
    let mut defined: HashSet<ValueId> = func.args().iter().map(|a| a.value).collect();
    let n = func.num_ops();

    if func.terminator().is_none() {
        return Err(PassError::MissingTerminator {
            func: func.name.clone(),
        });
    }

    for (i, op) in func.ops().enumerate() {
        if op.is_terminator() && i != n - 1 {
            return Err(PassError::MissingTerminator {
                func: func.name.clone(),
            });
        }

        for operand in &op.operands {
            if !defined.contains(operand) {
                return Err(PassError::UseBeforeDef {
                    func: func.name.clone(),
                    value: operand.to_string(),
                });
            }
        }

        match &op.kind {
            OpKind::AssignVariable => check_assign(func, &op.operands)?,
            OpKind::Return => {
                let declared = &func.function_type().results;
                let returned: Vec<_> = op.operands.iter().map(|v| func.value_type(*v)).collect();
                let matches = returned.len() == declared.len()
                    && returned.iter().zip(declared).all(|(r, d)| *r == Some(d));
                if !matches {
                    return Err(PassError::SignatureMismatch {
                        func: func.name.clone(),
                        detail: "returned values do not match the declared result types".into(),
                    });
                }
            }
            OpKind::Const { value } => {
                let expected = value.ty.shape().and_then(|s| s.num_elements());
                if let Some(expected) = expected {
                    if expected != value.values.len() as u64 {
                        return Err(PassError::TypeError {
                            func: func.name.clone(),
                            detail: format!(
                                "const of type {} holds {} element(s)",
                                value.ty,
                                value.values.len()
                            ),
                        });
                    }
                }
            }
            OpKind::VarHandle { .. } | OpKind::RestoreV2 | OpKind::Generic { .. } => {}
        }

        defined.extend(op.results.iter().copied());
    }
    Ok(())
}

fn check_assign(func: &IrFunction, operands: &[ValueId]) -> Result<(), PassError> {
    let [resource, value] = operands else {
        return Err(PassError::TypeError {
            func: func.name.clone(),
            detail: format!("assign_variable takes 2 operands, found {}", operands.len()),
        });
    };
    let content = func.value_type(*resource).and_then(|t| t.resource_subtype());
    let Some(content) = content else {
        return Err(PassError::TypeError {
            func: func.name.clone(),
            detail: format!("assign_variable target {} is not a resource", resource),
        });
    };
    if func.value_type(*value) != Some(content) {
        return Err(PassError::TypeError {
            func: func.name.clone(),
            detail: format!("assign_variable stores {} into a variable of type {}", value, content),
        });
    }
    Ok(())
}

fn check_use_lists(func: &IrFunction) -> Result<(), PassError> {
    let mut expected: HashMap<ValueId, Vec<Use>> = HashMap::new();
    for op in func.ops() {
        for (slot, v) in op.operands.iter().enumerate() {
            expected.entry(*v).or_default().push(Use {
                user: op.id,
                operand: slot as u32,
            });
        }
    }

    let live_values = func
        .args()
        .iter()
        .map(|a| a.value)
        .chain(func.ops().flat_map(|op| op.results.iter().copied()));
    for v in live_values {
        let mut recorded = func.uses(v).to_vec();
        recorded.sort();
        let mut wanted = expected.remove(&v).unwrap_or_default();
        wanted.sort();
        if recorded != wanted {
            return Err(PassError::StaleUse {
                func: func.name.clone(),
                value: v.to_string(),
                detail: format!("recorded {} use(s), expected {}", recorded.len(), wanted.len()),
            });
        }
    }

    // Anything left is an operand reading a value that no longer exists.
    if let Some(v) = expected.keys().min() {
        return Err(PassError::UseBeforeDef {
            func: func.name.clone(),
            value: v.to_string(),
        });
    }
    Ok(())
}
