//! Native emission: object file plus system linker.
//!
//! The pipeline is strictly linear — lex, parse, lower, emit, link — and
//! every stage runs to completion before the next starts.

use std::path::{Path, PathBuf};
use std::process::Command;

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine,
};
use inkwell::OptimizationLevel;

use super::compiler::CodegenError;
use super::context::CodegenContext;
use crate::lexer::{self, LexicalError};
use crate::logger::Logger;
use crate::parser::{self, ParserError};

/// Errors surfaced by the full compilation pipeline.
#[derive(Debug)]
pub enum CompileError {
    Lexical(LexicalError),
    Parser(ParserError),
    Codegen(CodegenError),
    Link(String),
    Io(std::io::Error),
}

impl From<LexicalError> for CompileError {
    fn from(err: LexicalError) -> Self {
        CompileError::Lexical(err)
    }
}

impl From<ParserError> for CompileError {
    fn from(err: ParserError) -> Self {
        CompileError::Parser(err)
    }
}

impl From<CodegenError> for CompileError {
    fn from(err: CodegenError) -> Self {
        CompileError::Codegen(err)
    }
}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        CompileError::Io(err)
    }
}

/// Lowers a populated module to a native executable.
pub struct Compiler {
    logger: Logger,
}

impl Compiler {
    /// Registers every target backend; cheap to call more than once.
    pub fn new() -> Self {
        Target::initialize_all(&InitializationConfig::default());

        Self {
            logger: Logger::new("compiler"),
        }
    }

    /// Emit `<output>.o` from the module, link it with `gcc`, and remove
    /// the intermediate object file.
    pub fn compile(&self, module: &Module, output_path: &Path) -> Result<(), CompileError> {
        let object_path = PathBuf::from(format!("{}.o", output_path.display()));

        self.emit_object(module, &object_path)?;
        self.link(&object_path, output_path)?;

        std::fs::remove_file(&object_path)?;
        self.logger
            .info(&format!("Wrote executable: {}", output_path.display()));

        Ok(())
    }

    /// Configure a target machine for the host and write the object file.
    fn emit_object(&self, module: &Module, object_path: &Path) -> Result<(), CompileError> {
        let triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&triple)
            .map_err(|e| CompileError::Link(format!("Failed to look up target: {e}")))?;

        let machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                OptimizationLevel::None,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| CompileError::Link("Failed to create target machine.".to_string()))?;

        module.set_triple(&triple);
        module.set_data_layout(&machine.get_target_data().get_data_layout());

        machine
            .write_to_file(module, FileType::Object, object_path)
            .map_err(|e| CompileError::Link(format!("Failed to write object file: {e}")))
    }

    /// Bind the object into an executable with the system linker.
    fn link(&self, object_path: &Path, output_path: &Path) -> Result<(), CompileError> {
        let status = Command::new("gcc")
            .arg(object_path)
            .arg("-o")
            .arg(output_path)
            .status()?;

        if !status.success() {
            return Err(CompileError::Link(format!(
                "Linker failed with exit code: {:?}",
                status.code()
            )));
        }

        Ok(())
    }

    /// Full pipeline: source text to executable.
    pub fn compile_source_to_executable(
        &self,
        source: &str,
        output_path: &Path,
    ) -> Result<(), CompileError> {
        self.with_codegen(source, |codegen| self.compile(&codegen.module, output_path))
    }

    /// Run the pipeline up to codegen and return the textual IR.
    pub fn compile_source_to_ir(&self, source: &str) -> Result<String, CompileError> {
        self.with_codegen(source, |codegen| Ok(codegen.get_ir()))
    }

    /// Lex, parse, and lower into a fresh module, then hand the populated
    /// context to `f`. The LLVM context cannot outlive this frame.
    fn with_codegen<T>(
        &self,
        source: &str,
        f: impl FnOnce(&CodegenContext) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        let tokens = lexer::lex(source)?;
        let program = parser::parse(tokens)?;

        let context = Context::create();
        let mut codegen = CodegenContext::new(&context, "verte");
        codegen.compile_program(&program)?;

        f(&codegen)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
