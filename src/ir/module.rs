use std::collections::HashMap;

use crate::error::IrError;
use crate::ir::function::{ArgAttrs, FunctionId, IrFunction};
use crate::ir::op::{ElementsAttr, OpId, OpKind};
use crate::ir::types::IrType;
use crate::ir::value::ValueId;

/// `initializer_type` of the initializer that restores variables from a checkpoint.
pub const INITIALIZER_TYPE_RESTORE_OP: &str = "restore_op";
/// `initializer_type` of the general-purpose initializer (tables, assets, ...).
pub const INITIALIZER_TYPE_INIT_OP: &str = "init_op";

/// Module-level record naming the functions that run once at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInitializer {
    pub initializers: Vec<String>,
}

/// The top-level IR container.
///
/// Invariants:
/// - Function names are unique within a module.
/// - `FunctionId(n)` always indexes `functions[n]`.
#[derive(Debug, Default, Clone)]
pub struct IrModule {
    pub name: String,
    pub(crate) functions: Vec<IrFunction>,
    pub(crate) function_index: HashMap<String, FunctionId>,
    pub(crate) session_initializer: Option<SessionInitializer>,
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            function_index: HashMap::new(),
            session_initializer: None,
        }
    }

    pub fn function(&self, id: FunctionId) -> Option<&IrFunction> {
        self.functions.get(id.0 as usize)
    }

    pub fn function_mut(&mut self, id: FunctionId) -> Option<&mut IrFunction> {
        self.functions.get_mut(id.0 as usize)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&IrFunction> {
        let id = self.function_index.get(name)?;
        self.functions.get(id.0 as usize)
    }

    pub fn functions(&self) -> &[IrFunction] {
        &self.functions
    }

    /// Registers a function built by `IrFunctionBuilder`.
    /// Returns `Err` if the name is already taken.
    pub fn add_function(&mut self, mut func: IrFunction) -> Result<FunctionId, IrError> {
        if self.function_index.contains_key(&func.name) {
            return Err(IrError::FunctionExists { name: func.name });
        }
        let id = FunctionId(self.functions.len() as u32);
        func.id = id;
        self.function_index.insert(func.name.clone(), id);
        self.functions.push(func);
        Ok(id)
    }

    /// Declares which functions are load-time initializers, in run order.
    pub fn set_session_initializer(&mut self, initializers: Vec<String>) {
        self.session_initializer = Some(SessionInitializer { initializers });
    }

    pub fn session_initializer(&self) -> Option<&SessionInitializer> {
        self.session_initializer.as_ref()
    }

    /// Finds the initializer function whose `initializer_type` is `kind`.
    ///
    /// Only functions listed by the session initializer are candidates; the
    /// first listed match wins. Returns `None` when the module has no session
    /// initializer or none of its functions has the requested type.
    pub fn find_initializer(&self, kind: &str) -> Option<FunctionId> {
        let session_init = self.session_initializer.as_ref()?;
        session_init
            .initializers
            .iter()
            .filter_map(|name| self.function_by_name(name))
            .find(|f| f.initializer_type.as_deref() == Some(kind))
            .map(|f| f.id)
    }
}

/// Builder for constructing an `IrFunction` from scratch.
///
/// Call order:
/// 1. `add_argument()` — declare arguments in order
/// 2. `emit_*()` / `push_op()` — append operations to the body
/// 3. `emit_return()` — append the terminator
/// 4. `build()` — consume the builder and return the completed `IrFunction`
///
/// `build()` does not insist on a terminator; `ValidatePass` reports a
/// missing one.
pub struct IrFunctionBuilder {
    func: IrFunction,
}

impl IrFunctionBuilder {
    pub fn new(name: impl Into<String>, results: Vec<IrType>) -> Self {
        Self {
            func: IrFunction::new(name, results),
        }
    }

    /// Marks the function as an initializer of the given type.
    pub fn initializer_type(mut self, kind: impl Into<String>) -> Self {
        self.func.initializer_type = Some(kind.into());
        self
    }

    pub fn exported_name(mut self, name: impl Into<String>) -> Self {
        self.func.exported_names.push(name.into());
        self
    }

    pub fn add_argument(&mut self, name: Option<&str>, ty: IrType) -> ValueId {
        self.func.append_argument(ty, name, ArgAttrs::default())
    }

    pub fn add_argument_with_attrs(
        &mut self,
        name: Option<&str>,
        ty: IrType,
        attrs: ArgAttrs,
    ) -> ValueId {
        self.func.append_argument(ty, name, attrs)
    }

    /// Appends an operation to the end of the body.
    pub fn push_op(
        &mut self,
        kind: OpKind,
        operands: Vec<ValueId>,
        result_types: Vec<IrType>,
    ) -> Result<OpId, IrError> {
        let end = self.func.body.len();
        self.func.insert_op_at(end, kind, operands, result_types, None)
    }

    /// Emits `var_handle` for a variable holding `content` and returns the handle.
    pub fn emit_var_handle(
        &mut self,
        shared_name: impl Into<String>,
        content: IrType,
    ) -> Result<ValueId, IrError> {
        let kind = OpKind::VarHandle {
            shared_name: shared_name.into(),
        };
        let id = self.push_op(kind, vec![], vec![IrType::resource(content)])?;
        Ok(self.result_of(id, 0))
    }

    pub fn emit_const(&mut self, value: ElementsAttr) -> Result<ValueId, IrError> {
        let ty = value.ty.clone();
        let id = self.push_op(OpKind::Const { value }, vec![], vec![ty])?;
        Ok(self.result_of(id, 0))
    }

    pub fn emit_assign(&mut self, resource: ValueId, value: ValueId) -> Result<OpId, IrError> {
        self.push_op(OpKind::AssignVariable, vec![resource, value], vec![])
    }

    /// Emits an arbitrary named op and returns its results.
    pub fn emit_generic(
        &mut self,
        name: impl Into<String>,
        operands: Vec<ValueId>,
        result_types: Vec<IrType>,
    ) -> Result<Vec<ValueId>, IrError> {
        let kind = OpKind::Generic { name: name.into() };
        let id = self.push_op(kind, operands, result_types)?;
        Ok(self
            .func
            .op(id)
            .map(|op| op.results.clone())
            .unwrap_or_default())
    }

    pub fn emit_return(&mut self, values: Vec<ValueId>) -> Result<OpId, IrError> {
        self.push_op(OpKind::Return, values, vec![])
    }

    /// Read-only view of the function under construction.
    pub fn func(&self) -> &IrFunction {
        &self.func
    }

    /// Consumes the builder and returns the completed `IrFunction`.
    pub fn build(self) -> IrFunction {
        self.func
    }

    fn result_of(&self, id: OpId, index: usize) -> ValueId {
        self.func.ops[id.0 as usize]
            .as_ref()
            .map(|op| op.results[index])
            .unwrap_or_else(|| unreachable!("op {} was just created", id))
    }
}
