//! Integration tests for the pass pipeline, the pass registry and validation.

use initrestore::error::{Error, PassError};
use initrestore::ir::builder::{InsertPoint, OpBuilder};
use initrestore::ir::function::IrFunction;
use initrestore::ir::module::{IrFunctionBuilder, IrModule, INITIALIZER_TYPE_RESTORE_OP};
use initrestore::ir::op::{ElementsAttr, Literal, OpKind};
use initrestore::ir::types::{DType, IrType};
use initrestore::pass::validate::validate_function;
use initrestore::pass::{create_pass, registered_passes, Pass, PassManager, ValidatePass};

fn f32_ty() -> IrType {
    IrType::scalar(DType::F32)
}

fn build_restore_module() -> IrModule {
    let mut module = IrModule::new("model");
    let mut b = IrFunctionBuilder::new("init", vec![]).initializer_type(INITIALIZER_TYPE_RESTORE_OP);
    let h = b.emit_var_handle("w", f32_ty()).unwrap();
    let c = b.emit_const(ElementsAttr::scalar_f32(0.25)).unwrap();
    b.emit_assign(h, c).unwrap();
    b.emit_return(vec![]).unwrap();
    module.add_function(b.build()).unwrap();
    module.set_session_initializer(vec!["init".into()]);
    module
}

#[test]
fn test_registry_resolves_pass_names() {
    assert_eq!(registered_passes(), &["quant-insert-restore-op", "validate"]);
    let pass = create_pass("quant-insert-restore-op").expect("pass should be registered");
    assert_eq!(pass.name(), "quant-insert-restore-op");
    assert!(pass.description().contains("restore_v2"));
    assert!(create_pass("validate").is_some());
    assert!(create_pass("no-such-pass").is_none());
}

#[test]
fn test_pipeline_from_registry() {
    let mut module = build_restore_module();
    let mut pm = PassManager::new();
    for name in registered_passes() {
        pm.add_boxed_pass(create_pass(name).unwrap());
    }
    assert_eq!(pm.pass_names(), vec!["quant-insert-restore-op", "validate"]);
    assert!(pm.run(&mut module).is_ok());

    let func = module.function_by_name("init").unwrap();
    assert_eq!(func.ops().filter(|op| op.is_restore()).count(), 1);
}

#[test]
fn test_convenience_entry_point() {
    let mut module = build_restore_module();
    initrestore::insert_restore_op(&mut module).unwrap();
    let func = module.function_by_name("init").unwrap();
    assert_eq!(func.num_args(), 1);
    assert!(validate_function(func).is_ok());
}

#[test]
fn test_validate_reports_missing_terminator() {
    let mut b = IrFunctionBuilder::new("f", vec![]);
    b.emit_const(ElementsAttr::scalar_f32(1.0)).unwrap();
    let func = b.build();
    assert!(matches!(
        validate_function(&func),
        Err(PassError::MissingTerminator { .. })
    ));
}

#[test]
fn test_validate_reports_op_after_terminator() {
    let mut b = IrFunctionBuilder::new("f", vec![]);
    b.emit_return(vec![]).unwrap();
    b.emit_generic("late", vec![], vec![]).unwrap();
    let func = b.build();
    assert!(matches!(
        validate_function(&func),
        Err(PassError::MissingTerminator { .. })
    ));
}

#[test]
fn test_validate_reports_use_before_def() {
    let mut func: IrFunction = {
        let mut b = IrFunctionBuilder::new("f", vec![]);
        b.emit_return(vec![]).unwrap();
        b.build()
    };
    // Define a value after the op that reads it.
    let mut builder = OpBuilder::at_block_terminator(&mut func);
    let c = builder.create_const(ElementsAttr::scalar_f32(1.0), None).unwrap();
    let const_op = builder.func().defining_op(c).unwrap().id;
    builder.set_insertion_point(InsertPoint::Before(const_op));
    builder
        .create(OpKind::Generic { name: "reader".into() }, vec![c], vec![], None)
        .unwrap();
    assert!(matches!(
        validate_function(&func),
        Err(PassError::UseBeforeDef { .. })
    ));
}

#[test]
fn test_validate_reports_assign_type_mismatch() {
    let mut b = IrFunctionBuilder::new("f", vec![]);
    let h = b.emit_var_handle("v", f32_ty()).unwrap();
    let c = b
        .emit_const(ElementsAttr::new(IrType::scalar(DType::I64), vec![Literal::Int(3)]))
        .unwrap();
    b.emit_assign(h, c).unwrap();
    b.emit_return(vec![]).unwrap();
    let func = b.build();
    assert!(matches!(
        validate_function(&func),
        Err(PassError::TypeError { .. })
    ));
}

#[test]
fn test_validate_reports_const_element_count() {
    let mut b = IrFunctionBuilder::new("f", vec![]);
    b.emit_const(ElementsAttr::new(IrType::vector(DType::Str, 3), vec![Literal::Str("a".into())]))
        .unwrap();
    b.emit_return(vec![]).unwrap();
    let func = b.build();
    assert!(matches!(
        validate_function(&func),
        Err(PassError::TypeError { .. })
    ));
}

#[test]
fn test_validate_reports_return_signature_mismatch() {
    let mut b = IrFunctionBuilder::new("f", vec![f32_ty()]);
    b.emit_return(vec![]).unwrap();
    let func = b.build();
    assert!(matches!(
        validate_function(&func),
        Err(PassError::SignatureMismatch { .. })
    ));
}

#[test]
fn test_pipeline_error_names_failing_pass() {
    let mut module = IrModule::new("m");
    module
        .add_function(IrFunctionBuilder::new("broken", vec![]).build())
        .unwrap();
    let mut pm = PassManager::new();
    pm.add_pass(ValidatePass);
    let (name, err) = pm.run(&mut module).unwrap_err();
    assert_eq!(name, "validate");
    let err = Error::from(err);
    assert_eq!(err.diagnostic_code(), "E0203");
    assert!(err.to_string().starts_with("[pass error]"));
}

#[test]
fn test_validate_pass_accepts_well_formed_module() {
    let mut module = build_restore_module();
    assert!(ValidatePass.run(&mut module).is_ok());
}
