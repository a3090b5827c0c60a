//! Tests that construct and edit IR through the builder API directly.
//! These verify def-use bookkeeping and insertion-point behaviour.

use initrestore::error::IrError;
use initrestore::ir::builder::{InsertPoint, OpBuilder};
use initrestore::ir::function::ArgAttrs;
use initrestore::ir::module::{IrFunctionBuilder, IrModule, INITIALIZER_TYPE_INIT_OP, INITIALIZER_TYPE_RESTORE_OP};
use initrestore::ir::op::{ElementsAttr, OpKind};
use initrestore::ir::types::{DType, Dim, IrType, Shape};
use initrestore::ir::value::{Use, ValueDef};

fn f32_ty() -> IrType {
    IrType::scalar(DType::F32)
}

#[test]
fn test_type_display() {
    assert_eq!(IrType::scalar(DType::Str).to_string(), "tensor<str>");
    assert_eq!(IrType::vector(DType::Str, 3).to_string(), "tensor<3xstr>");
    let dyn_ty = IrType::Tensor {
        dtype: DType::F32,
        shape: Shape(vec![Dim::Dynamic, Dim::Symbolic("N".into()), Dim::Fixed(4)]),
    };
    assert_eq!(dyn_ty.to_string(), "tensor<?xNx4xf32>");
    assert_eq!(
        IrType::resource(IrType::tensor(DType::I64, &[1])).to_string(),
        "resource<tensor<1xi64>>"
    );
    assert_eq!(dyn_ty.shape().and_then(|s| s.num_elements()), None);
    assert_eq!(IrType::tensor(DType::F32, &[2, 3]).shape().and_then(|s| s.num_elements()), Some(6));
}

#[test]
fn test_builder_records_uses() {
    let mut b = IrFunctionBuilder::new("f", vec![]);
    let h = b.emit_var_handle("v", f32_ty()).unwrap();
    let c = b.emit_const(ElementsAttr::scalar_f32(1.0)).unwrap();
    let assign = b.emit_assign(h, c).unwrap();
    b.emit_return(vec![]).unwrap();
    let func = b.build();

    assert_eq!(func.num_ops(), 4);
    assert_eq!(func.uses(h), &[Use { user: assign, operand: 0 }]);
    assert_eq!(func.uses(c), &[Use { user: assign, operand: 1 }]);
    assert!(func.defining_op(h).unwrap().is_var_handle());
    assert_eq!(func.var_content_type(func.defining_op(h).unwrap().id), Some(&f32_ty()));
    assert!(func.terminator().is_some());
}

#[test]
fn test_append_argument_extends_signature() {
    let mut b = IrFunctionBuilder::new("f", vec![]);
    let x = b.add_argument(Some("x"), f32_ty());
    b.emit_return(vec![]).unwrap();
    let mut func = b.build();

    let attrs = ArgAttrs {
        index_path: Some(vec!["p".into()]),
    };
    let p = func.append_argument(IrType::scalar(DType::Str), Some("p"), attrs.clone());
    assert_eq!(func.num_args(), 2);
    assert_eq!(func.arg_value(0), Some(x));
    assert_eq!(func.arg_value(1), Some(p));
    assert_eq!(func.value_def(p), Some(ValueDef::Argument { index: 1 }));
    assert_eq!(func.args()[1].attrs, attrs);
    assert_eq!(
        func.function_type().inputs,
        vec![f32_ty(), IrType::scalar(DType::Str)]
    );
}

#[test]
fn test_erase_refuses_value_in_use() {
    let mut b = IrFunctionBuilder::new("f", vec![]);
    let h = b.emit_var_handle("v", f32_ty()).unwrap();
    let c = b.emit_const(ElementsAttr::scalar_f32(1.0)).unwrap();
    let assign = b.emit_assign(h, c).unwrap();
    b.emit_return(vec![]).unwrap();
    let mut func = b.build();

    let const_op = func.defining_op(c).unwrap().id;
    let err = func.erase_op(const_op).unwrap_err();
    assert!(matches!(err, IrError::ValueInUse { uses: 1, .. }));
    assert_eq!(func.num_ops(), 4);

    func.erase_op(assign).unwrap();
    assert!(func.use_empty(c));
    assert!(func.use_empty(h));
    func.erase_op(const_op).unwrap();
    assert!(func.value_type(c).is_none());
    assert_eq!(func.num_ops(), 2);

    // Erased handles stay dead.
    assert!(matches!(func.erase_op(const_op), Err(IrError::UnknownOp { .. })));
}

#[test]
fn test_ops_where_snapshot_survives_erasure() {
    let mut b = IrFunctionBuilder::new("f", vec![]);
    for i in 0..3 {
        b.emit_const(ElementsAttr::scalar_f32(i as f32)).unwrap();
    }
    b.emit_return(vec![]).unwrap();
    let mut func = b.build();

    let consts = func.ops_where(|op| op.is_const());
    assert_eq!(consts.len(), 3);
    for id in consts {
        func.erase_op(id).unwrap();
    }
    assert_eq!(func.num_ops(), 1);
    assert!(func.terminator().is_some());
}

#[test]
fn test_op_builder_insert_points() {
    let mut b = IrFunctionBuilder::new("f", vec![]);
    let first = b.emit_generic("first", vec![], vec![]).unwrap();
    assert!(first.is_empty());
    b.emit_return(vec![]).unwrap();
    let mut func = b.build();
    let first_id = func.body()[0];

    {
        let mut builder = OpBuilder::at_block_terminator(&mut func);
        builder
            .create(OpKind::Generic { name: "t1".into() }, vec![], vec![], None)
            .unwrap();
        builder
            .create(OpKind::Generic { name: "t2".into() }, vec![], vec![], None)
            .unwrap();
        builder.set_insertion_point(InsertPoint::After(first_id));
        builder
            .create(OpKind::Generic { name: "a1".into() }, vec![], vec![], None)
            .unwrap();
        builder
            .create(OpKind::Generic { name: "a2".into() }, vec![], vec![], None)
            .unwrap();
        builder.set_insertion_point(InsertPoint::End);
        builder
            .create(OpKind::Generic { name: "end".into() }, vec![], vec![], None)
            .unwrap();
    }

    let names: Vec<&str> = func.ops().map(|op| op.kind.mnemonic()).collect();
    assert_eq!(names, vec!["first", "a1", "a2", "t1", "t2", "return", "end"]);
}

#[test]
fn test_op_builder_rejects_bad_anchor() {
    let mut b = IrFunctionBuilder::new("f", vec![]);
    let c = b.emit_const(ElementsAttr::scalar_f32(1.0)).unwrap();
    b.emit_return(vec![]).unwrap();
    let mut func = b.build();
    let const_op = func.defining_op(c).unwrap().id;
    func.erase_op(const_op).unwrap();

    let mut builder = OpBuilder::new(&mut func, InsertPoint::Before(const_op));
    let err = builder
        .create(OpKind::Generic { name: "x".into() }, vec![], vec![], None)
        .unwrap_err();
    assert!(matches!(err, IrError::BadInsertPoint { .. }));
}

#[test]
fn test_op_builder_rejects_unknown_operand() {
    let mut b = IrFunctionBuilder::new("f", vec![]);
    let c = b.emit_const(ElementsAttr::scalar_f32(1.0)).unwrap();
    b.emit_return(vec![]).unwrap();
    let mut func = b.build();
    let const_op = func.defining_op(c).unwrap().id;
    func.erase_op(const_op).unwrap();

    let mut builder = OpBuilder::at_block_terminator(&mut func);
    let err = builder
        .create(OpKind::Generic { name: "use".into() }, vec![c], vec![], None)
        .unwrap_err();
    assert!(matches!(err, IrError::UnknownValue { .. }));
}

#[test]
fn test_find_initializer_by_type() {
    let mut module = IrModule::new("m");
    let init = IrFunctionBuilder::new("init_all_tables", vec![])
        .initializer_type(INITIALIZER_TYPE_INIT_OP)
        .build();
    let restore = IrFunctionBuilder::new("restore", vec![])
        .initializer_type(INITIALIZER_TYPE_RESTORE_OP)
        .build();
    let unlisted = IrFunctionBuilder::new("unlisted", vec![])
        .initializer_type(INITIALIZER_TYPE_RESTORE_OP)
        .build();
    module.add_function(unlisted).unwrap();
    module.add_function(init).unwrap();
    let restore_id = module.add_function(restore).unwrap();

    assert_eq!(module.find_initializer(INITIALIZER_TYPE_RESTORE_OP), None);

    module.set_session_initializer(vec!["init_all_tables".into(), "restore".into()]);
    assert_eq!(module.find_initializer(INITIALIZER_TYPE_RESTORE_OP), Some(restore_id));
    assert!(module.find_initializer("unknown_type").is_none());
}

#[test]
fn test_duplicate_function_rejected() {
    let mut module = IrModule::new("m");
    module.add_function(IrFunctionBuilder::new("f", vec![]).build()).unwrap();
    let err = module
        .add_function(IrFunctionBuilder::new("f", vec![]).build())
        .unwrap_err();
    assert!(matches!(err, IrError::FunctionExists { .. }));
}
