use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicValueEnum, FunctionValue, GlobalValue, PointerValue};
use inkwell::AddressSpace;
use std::collections::HashMap;

use crate::logger::Logger;

/// LLVM calling-convention id for plain C calls.
pub(crate) const C_CALL_CONV: u32 = 0;

/// Symbol state for the function currently being lowered.
///
/// Names resolve against the enclosing frame before module scope is
/// consulted for locals; constants declared inside the function live here
/// too and shadow its locals.
pub struct FunctionFrame<'ctx> {
    pub function: FunctionValue<'ctx>,
    pub locals: HashMap<String, (PointerValue<'ctx>, BasicTypeEnum<'ctx>)>,
    pub constants: HashMap<String, BasicValueEnum<'ctx>>,
}

impl<'ctx> FunctionFrame<'ctx> {
    pub fn new(function: FunctionValue<'ctx>) -> Self {
        Self {
            function,
            locals: HashMap::new(),
            constants: HashMap::new(),
        }
    }
}

/// Owns the LLVM module and builder plus the symbol tables the lowering
/// walks against.
pub struct CodegenContext<'ctx> {
    pub context: &'ctx Context,
    pub module: Module<'ctx>,
    pub builder: Builder<'ctx>,

    /// Module-level storage, with the value type needed to load through it.
    pub globals: HashMap<String, (GlobalValue<'ctx>, BasicTypeEnum<'ctx>)>,
    /// Module-level compile-time constants, notably `true`/`false`.
    pub constants: HashMap<String, BasicValueEnum<'ctx>>,
    /// Set while lowering a function body.
    pub current_func: Option<FunctionFrame<'ctx>>,

    pub(crate) logger: Logger,
}

impl<'ctx> CodegenContext<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();

        let mut codegen = Self {
            context,
            module,
            builder,
            globals: HashMap::new(),
            constants: HashMap::new(),
            current_func: None,
            logger: Logger::new("codegen"),
        };

        codegen.init_table();
        codegen
    }

    /// Preload the symbol tables: the boolean constants, and the external
    /// variadic `printf(*i8, ...) -> i32` so user code can call it by name.
    fn init_table(&mut self) {
        let bool_type = self.context.bool_type();
        self.constants
            .insert("true".to_string(), bool_type.const_int(1, false).into());
        self.constants
            .insert("false".to_string(), bool_type.const_int(0, false).into());

        let ptr_type = self.context.ptr_type(AddressSpace::default());
        let printf_type = self.context.i32_type().fn_type(&[ptr_type.into()], true);
        let printf = self
            .module
            .add_function("printf", printf_type, Some(Linkage::External));
        printf.set_call_conventions(C_CALL_CONV);
    }

    /// Textual IR for the whole module.
    pub fn get_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }
}
