use inkwell::builder::BuilderError;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum};
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue};
use inkwell::{AddressSpace, FloatPredicate, IntPredicate};

use super::context::{CodegenContext, FunctionFrame, C_CALL_CONV};
use crate::parser::ast::{Node, ProtoNode};
use crate::types::{DataType, TypeInfo};

/// Code generation failure. Position information is not tracked below the
/// statement level; the message names the offending symbol instead.
#[derive(Debug, Clone, PartialEq)]
pub struct CodegenError {
    pub message: String,
}

impl CodegenError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CodegenError {}

impl From<BuilderError> for CodegenError {
    fn from(err: BuilderError) -> Self {
        CodegenError::new(format!("Instruction emission failed: {err}"))
    }
}

type CodegenResult<T> = Result<T, CodegenError>;

impl<'ctx> CodegenContext<'ctx> {
    /// Lower a whole program into the module.
    pub fn compile_program(&mut self, node: &Node) -> CodegenResult<()> {
        let Node::Program { body } = node else {
            return Err(self.error("Expected a program node at the root.".to_string()));
        };

        for stmt in body {
            self.compile_stmt(stmt)?;
        }

        Ok(())
    }

    pub fn compile_stmt(&mut self, node: &Node) -> CodegenResult<()> {
        match node {
            Node::Program { .. } => {
                Err(self.error("Nested program node.".to_string()))
            }
            Node::VarDecl {
                name,
                ty,
                value,
                is_const,
            } => self.compile_var_decl(name, ty, value, *is_const),
            Node::Assign { name, value } => self.compile_assign(name, value),
            Node::If { cond, body } => self.compile_if(cond, body, None),
            Node::IfElse {
                if_node,
                else_block,
            } => self.compile_if_else(if_node, else_block),
            Node::Proto(proto) => {
                self.compile_proto(proto)?;
                Ok(())
            }
            Node::Block { body } => self.compile_block(body),
            Node::FuncDecl { proto, body } => {
                self.compile_func_decl(proto, body)?;
                Ok(())
            }
            Node::Return { value } => self.compile_return(value),

            // Expression statement: lower for effect, discard any value.
            Node::Literal { .. }
            | Node::Variable { .. }
            | Node::Binary { .. }
            | Node::Unary { .. }
            | Node::Call { .. } => {
                self.compile_expr(node)?;
                Ok(())
            }
        }
    }

    /// Lower an expression. `None` only for calls to void functions.
    pub fn compile_expr(&mut self, node: &Node) -> CodegenResult<Option<BasicValueEnum<'ctx>>> {
        match node {
            Node::Literal { value, ty } => self.compile_literal(value, ty).map(Some),
            Node::Variable { name } => self.compile_variable(name).map(Some),
            Node::Binary { lhs, rhs, op } => self.compile_binary(lhs, rhs, op).map(Some),
            Node::Unary { operand, op } => self.compile_unary(operand, op).map(Some),
            Node::Call { callee, args } => self.compile_call(callee, args),

            Node::Program { .. }
            | Node::VarDecl { .. }
            | Node::Assign { .. }
            | Node::If { .. }
            | Node::IfElse { .. }
            | Node::Proto(_)
            | Node::Block { .. }
            | Node::FuncDecl { .. }
            | Node::Return { .. } => Err(self.error("Expected an expression.".to_string())),
        }
    }

    /// Lower an expression that must produce a value.
    fn compile_value(&mut self, node: &Node) -> CodegenResult<BasicValueEnum<'ctx>> {
        match self.compile_expr(node)? {
            Some(value) => Ok(value),
            None => Err(self.error("Expression has no value.".to_string())),
        }
    }

    fn compile_literal(&mut self, value: &str, ty: &TypeInfo) -> CodegenResult<BasicValueEnum<'ctx>> {
        match ty.kind {
            DataType::Integer => {
                let parsed: i32 = value
                    .parse()
                    .map_err(|_| self.error(format!("Invalid integer literal: {value}")))?;
                Ok(self.context.i32_type().const_int(parsed as u64, false).into())
            }
            DataType::Float => {
                let parsed: f32 = value
                    .parse()
                    .map_err(|_| self.error(format!("Invalid float literal: {value}")))?;
                Ok(self.context.f32_type().const_float(parsed as f64).into())
            }
            DataType::Double => {
                let parsed: f64 = value
                    .parse()
                    .map_err(|_| self.error(format!("Invalid double literal: {value}")))?;
                Ok(self.context.f64_type().const_float(parsed).into())
            }
            DataType::Bool => self
                .constants
                .get(value)
                .copied()
                .ok_or_else(|| self.error(format!("Invalid boolean literal: {value}"))),
            DataType::String => Ok(self.compile_string(value)),
            DataType::Void | DataType::Unknown => {
                Err(self.error(format!("Cannot lower a literal of type `{}`.", ty.name)))
            }
        }
    }

    /// Every string literal gets its own private NUL-terminated global; the
    /// value is the pointer to it.
    fn compile_string(&mut self, value: &str) -> BasicValueEnum<'ctx> {
        let bytes = self.context.const_string(value.as_bytes(), true);
        let global = self.module.add_global(bytes.get_type(), None, "str");
        global.set_initializer(&bytes);
        global.set_constant(true);
        global.set_linkage(inkwell::module::Linkage::Private);
        global.set_unnamed_addr(true);

        global.as_pointer_value().into()
    }

    fn compile_var_decl(
        &mut self,
        name: &str,
        ty: &TypeInfo,
        value: &Node,
        is_const: bool,
    ) -> CodegenResult<()> {
        let var_type = self.get_type(ty)?;
        let value = self.compile_value(value)?;

        if self.current_func.is_some() {
            if is_const {
                // Function-local constants never touch the stack.
                if let Some(frame) = self.current_func.as_mut() {
                    frame.constants.insert(name.to_string(), value);
                }
                return Ok(());
            }

            let slot = self.builder.build_alloca(var_type, name)?;
            self.builder.build_store(slot, value)?;

            if let Some(frame) = self.current_func.as_mut() {
                frame.locals.insert(name.to_string(), (slot, var_type));
            }

            return Ok(());
        }

        // Module scope: only constant globals exist.
        if !is_const {
            return Err(self.error(format!("Global variable must be constant: {name}")));
        }

        if !is_constant(value) {
            return Err(self.error(format!(
                "Global initializer must be a constant: {name}"
            )));
        }

        let global = self.module.add_global(var_type, None, name);
        global.set_initializer(&value);
        global.set_constant(true);

        self.constants.insert(name.to_string(), value);
        self.globals.insert(name.to_string(), (global, var_type));

        Ok(())
    }

    fn compile_assign(&mut self, name: &str, value: &Node) -> CodegenResult<()> {
        if self.constants.contains_key(name) {
            return Err(self.error(format!("Cannot assign to a constant: {name}")));
        }

        if self.globals.contains_key(name) {
            return Err(self.error(format!("Cannot assign to a global variable: {name}")));
        }

        let value = self.compile_value(value)?;

        if let Some(frame) = &self.current_func {
            if frame.constants.contains_key(name) {
                return Err(self.error(format!("Cannot assign to a constant: {name}")));
            }

            if let Some((slot, _)) = frame.locals.get(name) {
                let slot = *slot;
                self.builder.build_store(slot, value)?;
                return Ok(());
            }
        }

        Err(self.error(format!("Unknown variable referenced: {name}")))
    }

    /// Resolution order: globals, module constants, locals, then
    /// function-local constants.
    fn compile_variable(&mut self, name: &str) -> CodegenResult<BasicValueEnum<'ctx>> {
        if let Some((global, ty)) = self.globals.get(name) {
            let (pointer, ty) = (global.as_pointer_value(), *ty);
            return Ok(self.builder.build_load(ty, pointer, name)?);
        }

        if let Some(value) = self.constants.get(name) {
            return Ok(*value);
        }

        if let Some(frame) = &self.current_func {
            if let Some((slot, ty)) = frame.locals.get(name) {
                let (slot, ty) = (*slot, *ty);
                return Ok(self.builder.build_load(ty, slot, name)?);
            }

            if let Some(value) = frame.constants.get(name) {
                return Ok(*value);
            }
        }

        Err(self.error(format!("Unknown variable referenced: {name}")))
    }

    /// Only a scalar type-equality check is performed; there is no separate
    /// type checker. Integer comparisons and division are unsigned.
    fn compile_binary(
        &mut self,
        lhs: &Node,
        rhs: &Node,
        op: &str,
    ) -> CodegenResult<BasicValueEnum<'ctx>> {
        let lhs = self.compile_value(lhs)?;
        let rhs = self.compile_value(rhs)?;

        if lhs.get_type() != rhs.get_type() {
            return Err(self.error("Binary operands must have the same type.".to_string()));
        }

        match (lhs, rhs) {
            (BasicValueEnum::IntValue(lhs), BasicValueEnum::IntValue(rhs)) => {
                let value: BasicValueEnum = match op {
                    "+" => self.builder.build_int_add(lhs, rhs, "addtmp")?.into(),
                    "-" => self.builder.build_int_sub(lhs, rhs, "subtmp")?.into(),
                    "*" => self.builder.build_int_mul(lhs, rhs, "multmp")?.into(),
                    "/" => self
                        .builder
                        .build_int_unsigned_div(lhs, rhs, "divtmp")?
                        .into(),
                    "or" => self.builder.build_or(lhs, rhs, "ortmp")?.into(),
                    "and" => self.builder.build_and(lhs, rhs, "andtmp")?.into(),
                    "<" => self
                        .builder
                        .build_int_compare(IntPredicate::ULT, lhs, rhs, "cmptmp")?
                        .into(),
                    ">" => self
                        .builder
                        .build_int_compare(IntPredicate::UGT, lhs, rhs, "cmptmp")?
                        .into(),
                    "==" => self
                        .builder
                        .build_int_compare(IntPredicate::EQ, lhs, rhs, "cmptmp")?
                        .into(),
                    "!=" => self
                        .builder
                        .build_int_compare(IntPredicate::NE, lhs, rhs, "cmptmp")?
                        .into(),
                    "<=" => self
                        .builder
                        .build_int_compare(IntPredicate::ULE, lhs, rhs, "cmptmp")?
                        .into(),
                    ">=" => self
                        .builder
                        .build_int_compare(IntPredicate::UGE, lhs, rhs, "cmptmp")?
                        .into(),
                    _ => return Err(self.error(format!("Invalid binary operator: {op}"))),
                };
                Ok(value)
            }
            (BasicValueEnum::FloatValue(lhs), BasicValueEnum::FloatValue(rhs)) => {
                let value: BasicValueEnum = match op {
                    "+" => self.builder.build_float_add(lhs, rhs, "addtmp")?.into(),
                    "-" => self.builder.build_float_sub(lhs, rhs, "subtmp")?.into(),
                    "*" => self.builder.build_float_mul(lhs, rhs, "multmp")?.into(),
                    "/" => self.builder.build_float_div(lhs, rhs, "divtmp")?.into(),
                    "<" => self
                        .builder
                        .build_float_compare(FloatPredicate::OLT, lhs, rhs, "cmptmp")?
                        .into(),
                    ">" => self
                        .builder
                        .build_float_compare(FloatPredicate::OGT, lhs, rhs, "cmptmp")?
                        .into(),
                    "==" => self
                        .builder
                        .build_float_compare(FloatPredicate::OEQ, lhs, rhs, "cmptmp")?
                        .into(),
                    "!=" => self
                        .builder
                        .build_float_compare(FloatPredicate::ONE, lhs, rhs, "cmptmp")?
                        .into(),
                    "<=" => self
                        .builder
                        .build_float_compare(FloatPredicate::OLE, lhs, rhs, "cmptmp")?
                        .into(),
                    ">=" => self
                        .builder
                        .build_float_compare(FloatPredicate::OGE, lhs, rhs, "cmptmp")?
                        .into(),
                    _ => return Err(self.error(format!("Invalid binary operator: {op}"))),
                };
                Ok(value)
            }
            _ => Err(self.error("Binary operands must be scalar values.".to_string())),
        }
    }

    fn compile_unary(&mut self, operand: &Node, op: &str) -> CodegenResult<BasicValueEnum<'ctx>> {
        let operand = self.compile_value(operand)?;

        match (op, operand) {
            ("-", BasicValueEnum::IntValue(value)) => {
                Ok(self.builder.build_int_neg(value, "negtmp")?.into())
            }
            ("-", BasicValueEnum::FloatValue(value)) => {
                Ok(self.builder.build_float_neg(value, "negtmp")?.into())
            }
            ("!", BasicValueEnum::IntValue(value)) => {
                Ok(self.builder.build_not(value, "nottmp")?.into())
            }
            _ => Err(self.error(format!("Invalid unary operator: {op}"))),
        }
    }

    /// Declare the function described by the prototype, with external
    /// linkage and named arguments.
    pub fn compile_proto(&mut self, proto: &ProtoNode) -> CodegenResult<FunctionValue<'ctx>> {
        let mut param_types: Vec<BasicMetadataTypeEnum> = Vec::with_capacity(proto.params.len());
        for param in &proto.params {
            param_types.push(self.get_type(&param.ty)?.into());
        }

        let fn_type = match proto.ret.kind {
            DataType::Void => self.context.void_type().fn_type(&param_types, false),
            _ => self.get_type(&proto.ret)?.fn_type(&param_types, false),
        };

        let function =
            self.module
                .add_function(&proto.name, fn_type, Some(inkwell::module::Linkage::External));

        for (arg, param) in function.get_param_iter().zip(&proto.params) {
            arg.set_name(&param.name);
        }

        Ok(function)
    }

    /// Lower a function definition: entry block, stack slots for every
    /// argument, then the body. No terminator is inserted on the way out; a
    /// body that does not end in `return` stays unterminated.
    pub fn compile_func_decl(
        &mut self,
        proto: &ProtoNode,
        body: &Node,
    ) -> CodegenResult<FunctionValue<'ctx>> {
        let function = self.compile_proto(proto)?;

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let mut frame = FunctionFrame::new(function);
        for (arg, param) in function.get_param_iter().zip(&proto.params) {
            let ty = self.get_type(&param.ty)?;
            let slot = self.builder.build_alloca(ty, &param.name)?;
            self.builder.build_store(slot, arg)?;
            frame.locals.insert(param.name.clone(), (slot, ty));
        }

        let previous = self.current_func.replace(frame);
        let result = self.compile_stmt(body);
        self.current_func = previous;
        result?;

        Ok(function)
    }

    /// Calls resolve through the module, so user functions and the
    /// preloaded `printf` are reached the same way.
    fn compile_call(
        &mut self,
        callee: &Node,
        args: &[Node],
    ) -> CodegenResult<Option<BasicValueEnum<'ctx>>> {
        let Node::Variable { name } = callee else {
            return Err(self.error("Call target must be a function name.".to_string()));
        };

        let function = self
            .module
            .get_function(name)
            .ok_or_else(|| self.error(format!("Unknown function referenced: {name}")))?;

        let mut call_args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
        for arg in args {
            call_args.push(self.compile_value(arg)?.into());
        }

        let call = self.builder.build_call(function, &call_args, "calltmp")?;
        call.set_call_convention(C_CALL_CONV);

        Ok(call.try_as_basic_value().left())
    }

    fn compile_return(&mut self, value: &Node) -> CodegenResult<()> {
        let value = self.compile_value(value)?;
        self.builder.build_return(Some(&value))?;
        Ok(())
    }

    /// Blocks share the enclosing basic block; they only scope statements
    /// syntactically.
    fn compile_block(&mut self, body: &[Node]) -> CodegenResult<()> {
        for stmt in body {
            self.compile_stmt(stmt)?;
        }

        Ok(())
    }

    fn compile_if(
        &mut self,
        cond: &Node,
        body: &Node,
        else_block: Option<&Node>,
    ) -> CodegenResult<()> {
        let cond = match self.compile_value(cond)? {
            BasicValueEnum::IntValue(value) => value,
            _ => return Err(self.error("Condition must be a boolean value.".to_string())),
        };

        let function = self
            .current_func
            .as_ref()
            .map(|frame| frame.function)
            .ok_or_else(|| self.error("Conditional outside of a function.".to_string()))?;

        let then_bb = self.context.append_basic_block(function, "then");
        let else_bb = else_block.map(|_| self.context.append_basic_block(function, "else"));
        let merge_bb = self.context.append_basic_block(function, "ifcont");

        self.builder
            .build_conditional_branch(cond, then_bb, else_bb.unwrap_or(merge_bb))?;

        self.builder.position_at_end(then_bb);
        self.compile_stmt(body)?;
        self.branch_to_merge(merge_bb)?;

        if let (Some(else_bb), Some(else_body)) = (else_bb, else_block) {
            self.builder.position_at_end(else_bb);
            self.compile_stmt(else_body)?;
            self.branch_to_merge(merge_bb)?;
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    fn compile_if_else(&mut self, if_node: &Node, else_block: &Node) -> CodegenResult<()> {
        let Node::If { cond, body } = if_node else {
            return Err(self.error("Malformed if/else node.".to_string()));
        };

        self.compile_if(cond, body, Some(else_block))
    }

    /// Fall through to the merge block unless the branch already ended in a
    /// terminator (e.g. a `return`).
    fn branch_to_merge(
        &mut self,
        merge_bb: inkwell::basic_block::BasicBlock<'ctx>,
    ) -> CodegenResult<()> {
        let unterminated = self
            .builder
            .get_insert_block()
            .and_then(|block| block.get_terminator())
            .is_none();

        if unterminated {
            self.builder.build_unconditional_branch(merge_bb)?;
        }

        Ok(())
    }

    fn get_type(&self, ty: &TypeInfo) -> CodegenResult<BasicTypeEnum<'ctx>> {
        match ty.kind {
            DataType::Integer => Ok(self.context.i32_type().into()),
            DataType::Float => Ok(self.context.f32_type().into()),
            DataType::Double => Ok(self.context.f64_type().into()),
            DataType::Bool => Ok(self.context.bool_type().into()),
            DataType::String => Ok(self.context.ptr_type(AddressSpace::default()).into()),
            DataType::Void | DataType::Unknown => {
                Err(self.error(format!("Cannot use type `{}` here.", ty.name)))
            }
        }
    }

    fn error(&self, message: String) -> CodegenError {
        self.logger.error(&message);
        CodegenError { message }
    }
}

fn is_constant(value: BasicValueEnum) -> bool {
    match value {
        BasicValueEnum::IntValue(value) => value.is_const(),
        BasicValueEnum::FloatValue(value) => value.is_const(),
        BasicValueEnum::PointerValue(value) => value.is_const(),
        BasicValueEnum::ArrayValue(value) => value.is_const(),
        _ => false,
    }
}
