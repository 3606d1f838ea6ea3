//! Backend IR module: the collection of function declarations and
//! definitions produced by emission.

use super::function::{IrFunction, Linkage, Signature};

/// Handle to a function within an [`IrModule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(pub(crate) u32);

impl FuncId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A backend IR module.
///
/// Holds every function the emitter produced: the per-definition
/// WebAssembly functions, the personality declaration, and any internal
/// helper functions (SEH filters, the try-prologue dummy, the Itanium
/// `__cxa_begin_catch` declaration).
#[derive(Debug, Default)]
pub struct IrModule {
    functions: Vec<IrFunction>,
    debug_finalized: bool,
}

impl IrModule {
    pub fn new() -> IrModule {
        IrModule::default()
    }

    /// Declare a function with no body.
    pub fn declare_function(
        &mut self,
        name: impl Into<String>,
        signature: Signature,
        linkage: Linkage,
    ) -> FuncId {
        self.add_function(IrFunction::new(name, signature, linkage))
    }

    /// Add an already-built function.
    pub fn add_function(&mut self, function: IrFunction) -> FuncId {
        let id = FuncId(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    /// Install the body for a previously declared function. The signature
    /// must match the declaration.
    pub fn define_function(&mut self, id: FuncId, function: IrFunction) {
        assert_eq!(
            self.functions[id.index()].signature, function.signature,
            "definition signature must match declaration"
        );
        self.functions[id.index()] = function;
    }

    pub fn function(&self, id: FuncId) -> &IrFunction {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FuncId) -> &mut IrFunction {
        &mut self.functions[id.index()]
    }

    pub fn functions(&self) -> impl Iterator<Item = (FuncId, &IrFunction)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(index, function)| (FuncId(index as u32), function))
    }

    pub fn find_function(&self, name: &str) -> Option<FuncId> {
        self.functions
            .iter()
            .position(|function| function.name == name)
            .map(|index| FuncId(index as u32))
    }

    /// Number of functions with bodies.
    pub fn defined_function_count(&self) -> usize {
        self.functions.iter().filter(|function| !function.is_declaration()).count()
    }

    /// Mark debug info complete. Called once by the module emitter after
    /// every function has been translated.
    pub fn finalize_debug_info(&mut self) {
        self.debug_finalized = true;
    }

    pub fn debug_info_finalized(&self) -> bool {
        self.debug_finalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::types::{CallConv, IrType};

    fn signature() -> Signature {
        Signature {
            params: vec![IrType::Ptr],
            results: vec![],
            call_conv: CallConv::Wasm,
        }
    }

    #[test]
    fn declare_then_define() {
        let mut module = IrModule::new();
        let id = module.declare_function("f", signature(), Linkage::External);
        assert!(module.function(id).is_declaration());
        assert_eq!(module.defined_function_count(), 0);

        let mut body = IrFunction::new("f", signature(), Linkage::External);
        body.add_block("entry");
        module.define_function(id, body);
        assert!(!module.function(id).is_declaration());
        assert_eq!(module.defined_function_count(), 1);
        assert_eq!(module.find_function("f"), Some(id));
    }
}
