pub mod builder;
pub mod function;
pub mod module;
pub mod op;
pub mod types;
pub mod value;

pub use builder::{InsertPoint, OpBuilder};
pub use function::{ArgAttrs, Argument, FunctionId, FunctionType, IrFunction};
pub use module::{
    IrFunctionBuilder, IrModule, SessionInitializer, INITIALIZER_TYPE_INIT_OP,
    INITIALIZER_TYPE_RESTORE_OP,
};
pub use op::{ElementsAttr, Literal, Op, OpId, OpKind};
pub use types::{DType, Dim, IrType, Shape};
pub use value::{Use, ValueDef, ValueId};
