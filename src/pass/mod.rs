pub mod insert_restore;
pub mod validate;

pub use insert_restore::InsertRestoreOpPass;
pub use validate::ValidatePass;

use crate::error::PassError;
use crate::ir::module::IrModule;

/// A compiler pass that operates on an `IrModule` in place.
///
/// Passes must be deterministic: given the same `IrModule`, the transformed
/// output must be identical across runs (no global mutable state, no randomness).
pub trait Pass {
    /// Stable short name, used for registry lookup and in error messages.
    fn name(&self) -> &'static str;

    /// One-line human-readable summary of what the pass does.
    fn description(&self) -> &'static str {
        ""
    }

    /// Run the pass on the module.
    ///
    /// On success, the module is in a valid state for the next pass.
    /// On error, the module state is unspecified and the pipeline aborts.
    fn run(&mut self, module: &mut IrModule) -> Result<(), PassError>;
}

/// Names accepted by `create_pass`, in registration order.
pub fn registered_passes() -> &'static [&'static str] {
    &[insert_restore::PASS_NAME, validate::PASS_NAME]
}

/// Instantiates the pass registered under `name`.
pub fn create_pass(name: &str) -> Option<Box<dyn Pass>> {
    match name {
        insert_restore::PASS_NAME => Some(Box::new(InsertRestoreOpPass)),
        validate::PASS_NAME => Some(Box::new(ValidatePass)),
        _ => None,
    }
}

/// Manages and executes an ordered sequence of compiler passes.
///
/// Passes run in the order they were registered. The pipeline aborts at the
/// first error.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    /// If set, dumps IR text to stderr after the pass with this name completes.
    dump_after: Option<String>,
}

impl PassManager {
    pub fn new() -> Self {
        Self { passes: Vec::new(), dump_after: None }
    }

    /// Appends a pass to the end of the pipeline.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Appends an already-boxed pass, e.g. one returned by `create_pass`.
    pub fn add_boxed_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// Configures the manager to dump IR to stderr after the named pass completes.
    pub fn set_dump_after(&mut self, pass_name: impl Into<String>) {
        self.dump_after = Some(pass_name.into());
    }

    /// Runs all passes in registration order on `module`.
    ///
    /// Returns `Err((pass_name, error))` at the first failure.
    pub fn run(&mut self, module: &mut IrModule) -> Result<(), (String, PassError)> {
        for pass in &mut self.passes {
            log::debug!("running pass '{}' on module '{}'", pass.name(), module.name);
            pass.run(module).map_err(|e| (pass.name().to_owned(), e))?;
            if let Some(ref target) = self.dump_after {
                if pass.name() == target.as_str() {
                    use crate::codegen::printer::emit_ir_text;
                    if let Ok(text) = emit_ir_text(module) {
                        eprintln!("--- IR after {} ---\n{}", pass.name(), text);
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the names of all registered passes in pipeline order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
