//! The module assembler: collects typed declarations, validates
//! cross-references eagerly, and serializes the WebAssembly binary.
//!
//! A [`Module`] holds append-only vectors for every entity kind. Insertion
//! methods return the assigned index in the *combined* index space of the
//! kind (imports first, then declarations) and perform all validation up
//! front, so a failed insertion leaves the module untouched.
//! [`Module::assemble`] consumes the module and emits the preamble plus
//! every non-empty section in canonical order:
//!
//! ```text
//! module  ::= magic version section*
//! section ::= id:u8 size:vu32 contents:byte*
//! order   ::= 1 2 3 4 5 6 7 8 9 12 10 11 0*
//! ```
//!
//! The DataCount section (id 12) precedes Code whenever at least one data
//! segment exists, as `memory.init`/`data.drop` validation requires.

use std::fmt;

use crate::encoding::{
    self, DATA_ACTIVE, DATA_ACTIVE_EXPLICIT, DATA_PASSIVE, DESC_FUNC, DESC_GLOBAL, DESC_MEMORY,
    DESC_TABLE, ELEMKIND_FUNCREF, PREAMBLE, SECTION_CODE, SECTION_CUSTOM, SECTION_DATA,
    SECTION_DATA_COUNT, SECTION_ELEMENT, SECTION_EXPORT, SECTION_FUNCTION, SECTION_GLOBAL,
    SECTION_IMPORT, SECTION_MEMORY, SECTION_START, SECTION_TABLE, SECTION_TYPE, write_section,
};
use crate::expr::{ConstExpr, Expr};
use crate::types::{FuncType, GlobalType, Limits, RefType, TableType, ValueType};

// ===========================================================================
// Errors
// ===========================================================================

/// Entity kinds named in assembler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Type,
    Function,
    Table,
    Memory,
    Global,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Type => "type",
            EntityKind::Function => "function",
            EntityKind::Table => "table",
            EntityKind::Memory => "memory",
            EntityKind::Global => "global",
        })
    }
}

/// Errors raised by insertion methods. All validation is eager; a failed
/// insertion appends nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("{kind} index {index} out of range (space has {count} entries)")]
    IndexOutOfRange {
        kind: EntityKind,
        index: u32,
        count: u32,
    },
    #[error("cannot import a {0} after a {0} has been declared")]
    ImportAfterDeclaration(EntityKind),
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueType,
        found: ValueType,
    },
    #[error("duplicate export name {0:?}")]
    DuplicateExport(String),
    #[error("invalid limits: max {max} is less than min {min}")]
    InvalidLimits { min: u32, max: u32 },
}

// ===========================================================================
// Entities
// ===========================================================================

/// A declared function: its signature index, locals groups, and finalized
/// body.
#[derive(Debug, Clone)]
pub struct Function {
    pub type_idx: u32,
    /// Run-length compressed locals: (count, type) pairs after the params.
    pub locals: Vec<(u32, ValueType)>,
    pub body: Expr,
}

impl Function {
    pub fn new(type_idx: u32, body: Expr) -> Function {
        Function {
            type_idx,
            locals: Vec::new(),
            body,
        }
    }

    pub fn with_locals(type_idx: u32, locals: Vec<(u32, ValueType)>, body: Expr) -> Function {
        Function {
            type_idx,
            locals,
            body,
        }
    }
}

#[derive(Debug, Clone)]
struct Import<D> {
    module: String,
    name: String,
    desc: D,
}

#[derive(Debug, Clone, Copy)]
enum ExportKind {
    Func,
    Table,
    Memory,
    Global,
}

impl ExportKind {
    fn desc_byte(self) -> u8 {
        match self {
            ExportKind::Func => DESC_FUNC,
            ExportKind::Table => DESC_TABLE,
            ExportKind::Memory => DESC_MEMORY,
            ExportKind::Global => DESC_GLOBAL,
        }
    }
}

#[derive(Debug, Clone)]
struct Export {
    name: String,
    kind: ExportKind,
    index: u32,
}

/// Where an element segment's contents go at instantiation.
#[derive(Debug, Clone)]
pub enum ElementMode {
    /// Inert until `table.init` references it.
    Passive,
    /// Only forward-declares functions for `ref.func`.
    Declarative,
    /// Copied into `table` at the evaluated `offset` on instantiation.
    Active { table: u32, offset: ConstExpr },
}

/// Element segment contents: plain function indices or full constant
/// expressions. Function indices use the compact elemkind encoding and
/// require a `funcref` segment.
#[derive(Debug, Clone)]
pub enum ElementInit {
    Functions(Vec<u32>),
    Expressions(Vec<ConstExpr>),
}

/// A table initialization segment.
#[derive(Debug, Clone)]
pub struct ElementSegment {
    pub ref_type: RefType,
    pub mode: ElementMode,
    pub init: ElementInit,
}

#[derive(Debug, Clone)]
enum DataMode {
    Passive,
    Active { memory: u32, offset: ConstExpr },
}

#[derive(Debug, Clone)]
struct DataSegment {
    bytes: Vec<u8>,
    mode: DataMode,
}

// ===========================================================================
// Module
// ===========================================================================

/// An in-memory WebAssembly module under construction.
#[derive(Debug, Default)]
pub struct Module {
    types: Vec<FuncType>,
    func_imports: Vec<Import<u32>>,
    table_imports: Vec<Import<TableType>>,
    memory_imports: Vec<Import<Limits>>,
    global_imports: Vec<Import<GlobalType>>,
    functions: Vec<Function>,
    tables: Vec<TableType>,
    memories: Vec<Limits>,
    globals: Vec<(GlobalType, ConstExpr)>,
    exports: Vec<Export>,
    start: Option<u32>,
    elements: Vec<ElementSegment>,
    data: Vec<DataSegment>,
    customs: Vec<(String, Vec<u8>)>,
}

impl Module {
    pub fn new() -> Module {
        Module::default()
    }

    // -- index space sizes --------------------------------------------------

    /// Entries in the combined function index space (imports + declarations).
    pub fn func_count(&self) -> u32 {
        (self.func_imports.len() + self.functions.len()) as u32
    }

    pub fn table_count(&self) -> u32 {
        (self.table_imports.len() + self.tables.len()) as u32
    }

    pub fn memory_count(&self) -> u32 {
        (self.memory_imports.len() + self.memories.len()) as u32
    }

    pub fn global_count(&self) -> u32 {
        (self.global_imports.len() + self.globals.len()) as u32
    }

    pub fn type_count(&self) -> u32 {
        self.types.len() as u32
    }

    fn check_index(kind: EntityKind, index: u32, count: u32) -> Result<(), BuildError> {
        if index >= count {
            return Err(BuildError::IndexOutOfRange { kind, index, count });
        }
        Ok(())
    }

    fn check_limits(limits: &Limits) -> Result<(), BuildError> {
        if let Some(max) = limits.max
            && max < limits.min
        {
            return Err(BuildError::InvalidLimits {
                min: limits.min,
                max,
            });
        }
        Ok(())
    }

    /// The value type a constant expression evaluates to. `global.get` is
    /// resolved against imported globals (the only globals in scope for
    /// constant expressions); `ref.func` must name a known function.
    fn const_expr_type(&self, expr: &ConstExpr) -> Result<ValueType, BuildError> {
        match expr {
            ConstExpr::I32(_) => Ok(ValueType::I32),
            ConstExpr::I64(_) => Ok(ValueType::I64),
            ConstExpr::F32(_) => Ok(ValueType::F32),
            ConstExpr::F64(_) => Ok(ValueType::F64),
            ConstExpr::RefNull(rt) => Ok((*rt).into()),
            ConstExpr::GlobalGet(idx) => {
                let count = self.global_imports.len() as u32;
                Self::check_index(EntityKind::Global, *idx, count)?;
                Ok(self.global_imports[*idx as usize].desc.value_type)
            }
            ConstExpr::RefFunc(idx) => {
                Self::check_index(EntityKind::Function, *idx, self.func_count())?;
                Ok(ValueType::FuncRef)
            }
        }
    }

    fn check_const_expr(&self, expr: &ConstExpr, expected: ValueType) -> Result<(), BuildError> {
        let found = self.const_expr_type(expr)?;
        if found != expected {
            return Err(BuildError::TypeMismatch { expected, found });
        }
        Ok(())
    }

    // -- types --------------------------------------------------------------

    /// Interns a function signature and returns its type index.
    ///
    /// Structurally equal signatures share one entry; distinct signatures
    /// keep insertion order.
    pub fn func_type(&mut self, ft: FuncType) -> u32 {
        if let Some(idx) = self.types.iter().position(|existing| *existing == ft) {
            return idx as u32;
        }
        self.types.push(ft);
        (self.types.len() - 1) as u32
    }

    // -- imports ------------------------------------------------------------

    /// Imports a function. Must precede all function declarations; the
    /// returned index lives in the combined function index space.
    pub fn import_func(
        &mut self,
        module: &str,
        name: &str,
        type_idx: u32,
    ) -> Result<u32, BuildError> {
        if !self.functions.is_empty() {
            return Err(BuildError::ImportAfterDeclaration(EntityKind::Function));
        }
        Self::check_index(EntityKind::Type, type_idx, self.type_count())?;
        self.func_imports.push(Import {
            module: module.to_string(),
            name: name.to_string(),
            desc: type_idx,
        });
        Ok((self.func_imports.len() - 1) as u32)
    }

    /// Imports a table. Must precede all table declarations.
    pub fn import_table(
        &mut self,
        module: &str,
        name: &str,
        tt: TableType,
    ) -> Result<u32, BuildError> {
        if !self.tables.is_empty() {
            return Err(BuildError::ImportAfterDeclaration(EntityKind::Table));
        }
        Self::check_limits(&tt.limits)?;
        self.table_imports.push(Import {
            module: module.to_string(),
            name: name.to_string(),
            desc: tt,
        });
        Ok((self.table_imports.len() - 1) as u32)
    }

    /// Imports a memory. Must precede all memory declarations.
    pub fn import_memory(
        &mut self,
        module: &str,
        name: &str,
        limits: Limits,
    ) -> Result<u32, BuildError> {
        if !self.memories.is_empty() {
            return Err(BuildError::ImportAfterDeclaration(EntityKind::Memory));
        }
        Self::check_limits(&limits)?;
        self.memory_imports.push(Import {
            module: module.to_string(),
            name: name.to_string(),
            desc: limits,
        });
        Ok((self.memory_imports.len() - 1) as u32)
    }

    /// Imports a global. Must precede all global declarations.
    pub fn import_global(
        &mut self,
        module: &str,
        name: &str,
        gt: GlobalType,
    ) -> Result<u32, BuildError> {
        if !self.globals.is_empty() {
            return Err(BuildError::ImportAfterDeclaration(EntityKind::Global));
        }
        self.global_imports.push(Import {
            module: module.to_string(),
            name: name.to_string(),
            desc: gt,
        });
        Ok((self.global_imports.len() - 1) as u32)
    }

    // -- declarations -------------------------------------------------------

    /// Declares a function; `func.type_idx` must name an interned type.
    pub fn function(&mut self, func: Function) -> Result<u32, BuildError> {
        Self::check_index(EntityKind::Type, func.type_idx, self.type_count())?;
        self.functions.push(func);
        Ok(self.func_count() - 1)
    }

    /// Declares a table.
    pub fn table(&mut self, tt: TableType) -> Result<u32, BuildError> {
        Self::check_limits(&tt.limits)?;
        self.tables.push(tt);
        Ok(self.table_count() - 1)
    }

    /// Declares a memory.
    pub fn memory(&mut self, limits: Limits) -> Result<u32, BuildError> {
        Self::check_limits(&limits)?;
        self.memories.push(limits);
        Ok(self.memory_count() - 1)
    }

    /// Declares a global; the initializer must evaluate to the declared
    /// value type.
    pub fn global(&mut self, gt: GlobalType, init: ConstExpr) -> Result<u32, BuildError> {
        self.check_const_expr(&init, gt.value_type)?;
        self.globals.push((gt, init));
        Ok(self.global_count() - 1)
    }

    // -- exports ------------------------------------------------------------

    fn export(&mut self, name: &str, kind: ExportKind, index: u32) -> Result<u32, BuildError> {
        let (entity, count) = match kind {
            ExportKind::Func => (EntityKind::Function, self.func_count()),
            ExportKind::Table => (EntityKind::Table, self.table_count()),
            ExportKind::Memory => (EntityKind::Memory, self.memory_count()),
            ExportKind::Global => (EntityKind::Global, self.global_count()),
        };
        Self::check_index(entity, index, count)?;
        if self.exports.iter().any(|e| e.name == name) {
            return Err(BuildError::DuplicateExport(name.to_string()));
        }
        self.exports.push(Export {
            name: name.to_string(),
            kind,
            index,
        });
        Ok((self.exports.len() - 1) as u32)
    }

    /// Exports a function by combined-space index. Export names must be
    /// unique across all kinds.
    pub fn export_func(&mut self, name: &str, index: u32) -> Result<u32, BuildError> {
        self.export(name, ExportKind::Func, index)
    }

    pub fn export_table(&mut self, name: &str, index: u32) -> Result<u32, BuildError> {
        self.export(name, ExportKind::Table, index)
    }

    pub fn export_memory(&mut self, name: &str, index: u32) -> Result<u32, BuildError> {
        self.export(name, ExportKind::Memory, index)
    }

    pub fn export_global(&mut self, name: &str, index: u32) -> Result<u32, BuildError> {
        self.export(name, ExportKind::Global, index)
    }

    // -- start, segments, custom sections -----------------------------------

    /// Sets the start function. A second call replaces the previous one.
    pub fn start(&mut self, func_idx: u32) -> Result<(), BuildError> {
        Self::check_index(EntityKind::Function, func_idx, self.func_count())?;
        self.start = Some(func_idx);
        Ok(())
    }

    /// Adds a passive data segment; the returned index is the operand of
    /// `memory.init`/`data.drop`.
    pub fn passive_data(&mut self, bytes: Vec<u8>) -> u32 {
        self.data.push(DataSegment {
            bytes,
            mode: DataMode::Passive,
        });
        (self.data.len() - 1) as u32
    }

    /// Adds an active data segment targeting memory 0.
    pub fn active_data(&mut self, bytes: Vec<u8>, offset: ConstExpr) -> Result<u32, BuildError> {
        self.active_data_in(0, bytes, offset)
    }

    /// Adds an active data segment targeting an explicit memory index.
    pub fn active_data_in(
        &mut self,
        memory: u32,
        bytes: Vec<u8>,
        offset: ConstExpr,
    ) -> Result<u32, BuildError> {
        Self::check_index(EntityKind::Memory, memory, self.memory_count())?;
        self.check_const_expr(&offset, ValueType::I32)?;
        self.data.push(DataSegment {
            bytes,
            mode: DataMode::Active { memory, offset },
        });
        Ok((self.data.len() - 1) as u32)
    }

    /// Adds an element segment; the returned index is the operand of
    /// `table.init`/`elem.drop`.
    pub fn element(&mut self, segment: ElementSegment) -> Result<u32, BuildError> {
        if let ElementMode::Active { table, offset } = &segment.mode {
            Self::check_index(EntityKind::Table, *table, self.table_count())?;
            self.check_const_expr(offset, ValueType::I32)?;
        }
        match &segment.init {
            ElementInit::Functions(indices) => {
                if segment.ref_type != RefType::FuncRef {
                    return Err(BuildError::TypeMismatch {
                        expected: segment.ref_type.into(),
                        found: ValueType::FuncRef,
                    });
                }
                for idx in indices {
                    Self::check_index(EntityKind::Function, *idx, self.func_count())?;
                }
            }
            ElementInit::Expressions(exprs) => {
                for expr in exprs {
                    self.check_const_expr(expr, segment.ref_type.into())?;
                }
            }
        }
        self.elements.push(segment);
        Ok((self.elements.len() - 1) as u32)
    }

    /// Appends a raw custom section, emitted after all standard sections.
    pub fn custom_section(&mut self, name: &str, bytes: Vec<u8>) {
        self.customs.push((name.to_string(), bytes));
    }

    // =======================================================================
    // Assembly
    // =======================================================================

    /// Serializes the module, consuming it.
    ///
    /// Emits the 8-byte preamble, then each non-empty section in canonical
    /// order. The output validates under the WebAssembly 2.0 spec provided
    /// the function bodies type-check (body content beyond structure is the
    /// caller's contract).
    pub fn assemble(self) -> Vec<u8> {
        let mut out = Vec::from(PREAMBLE);

        self.type_section(&mut out);
        self.import_section(&mut out);
        self.function_section(&mut out);
        self.table_section(&mut out);
        self.memory_section(&mut out);
        self.global_section(&mut out);
        self.export_section(&mut out);
        self.start_section(&mut out);
        self.element_section(&mut out);
        self.data_count_section(&mut out);
        self.code_section(&mut out);
        self.data_section(&mut out);
        self.custom_sections(&mut out);

        out
    }

    /// Type section (id 1): the interned function signatures.
    fn type_section(&self, out: &mut Vec<u8>) {
        if self.types.is_empty() {
            return;
        }
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, self.types.len() as u32);
        for ft in &self.types {
            ft.encode(&mut contents);
        }
        write_section(out, SECTION_TYPE, &contents);
    }

    /// Import section (id 2): function, table, memory, then global imports.
    fn import_section(&self, out: &mut Vec<u8>) {
        let total = self.func_imports.len()
            + self.table_imports.len()
            + self.memory_imports.len()
            + self.global_imports.len();
        if total == 0 {
            return;
        }
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, total as u32);
        for imp in &self.func_imports {
            Self::import_header(&mut contents, imp, DESC_FUNC);
            encoding::write_vu32(&mut contents, imp.desc);
        }
        for imp in &self.table_imports {
            Self::import_header(&mut contents, imp, DESC_TABLE);
            imp.desc.encode(&mut contents);
        }
        for imp in &self.memory_imports {
            Self::import_header(&mut contents, imp, DESC_MEMORY);
            imp.desc.encode(&mut contents);
        }
        for imp in &self.global_imports {
            Self::import_header(&mut contents, imp, DESC_GLOBAL);
            imp.desc.encode(&mut contents);
        }
        write_section(out, SECTION_IMPORT, &contents);
    }

    fn import_header<D>(contents: &mut Vec<u8>, imp: &Import<D>, desc: u8) {
        encoding::write_name(contents, &imp.module);
        encoding::write_name(contents, &imp.name);
        contents.push(desc);
    }

    /// Function section (id 3): one type index per declared function.
    fn function_section(&self, out: &mut Vec<u8>) {
        if self.functions.is_empty() {
            return;
        }
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, self.functions.len() as u32);
        for func in &self.functions {
            encoding::write_vu32(&mut contents, func.type_idx);
        }
        write_section(out, SECTION_FUNCTION, &contents);
    }

    /// Table section (id 4).
    fn table_section(&self, out: &mut Vec<u8>) {
        if self.tables.is_empty() {
            return;
        }
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, self.tables.len() as u32);
        for tt in &self.tables {
            tt.encode(&mut contents);
        }
        write_section(out, SECTION_TABLE, &contents);
    }

    /// Memory section (id 5).
    fn memory_section(&self, out: &mut Vec<u8>) {
        if self.memories.is_empty() {
            return;
        }
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, self.memories.len() as u32);
        for limits in &self.memories {
            limits.encode(&mut contents);
        }
        write_section(out, SECTION_MEMORY, &contents);
    }

    /// Global section (id 6): (type, init expression) pairs.
    fn global_section(&self, out: &mut Vec<u8>) {
        if self.globals.is_empty() {
            return;
        }
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, self.globals.len() as u32);
        for (gt, init) in &self.globals {
            gt.encode(&mut contents);
            init.encode(&mut contents);
        }
        write_section(out, SECTION_GLOBAL, &contents);
    }

    /// Export section (id 7): (name, kind byte, index) triples.
    fn export_section(&self, out: &mut Vec<u8>) {
        if self.exports.is_empty() {
            return;
        }
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, self.exports.len() as u32);
        for export in &self.exports {
            encoding::write_name(&mut contents, &export.name);
            contents.push(export.kind.desc_byte());
            encoding::write_vu32(&mut contents, export.index);
        }
        write_section(out, SECTION_EXPORT, &contents);
    }

    /// Start section (id 8).
    fn start_section(&self, out: &mut Vec<u8>) {
        let Some(func_idx) = self.start else {
            return;
        };
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, func_idx);
        write_section(out, SECTION_START, &contents);
    }

    /// Element section (id 9).
    ///
    /// The leading flag byte 0-7 selects the combination of mode, table
    /// index presence, and init encoding; it is derived from the segment
    /// structure, never stored:
    ///
    /// ```text
    /// bit 0: passive/declarative   bit 1: explicit table (active)
    ///        or declarative (bit 0 set)
    /// bit 2: init as expressions rather than function indices
    /// ```
    fn element_section(&self, out: &mut Vec<u8>) {
        if self.elements.is_empty() {
            return;
        }
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, self.elements.len() as u32);
        for segment in &self.elements {
            let flags = Self::element_flags(segment);
            encoding::write_vu32(&mut contents, flags);

            if let ElementMode::Active { table, offset } = &segment.mode {
                if flags & 0b010 != 0 {
                    encoding::write_vu32(&mut contents, *table);
                }
                offset.encode(&mut contents);
            }

            match &segment.init {
                ElementInit::Functions(indices) => {
                    // Flags 1-3 carry an elemkind byte; flag 0 implies it
                    if flags != 0 {
                        contents.push(ELEMKIND_FUNCREF);
                    }
                    encoding::write_vu32(&mut contents, indices.len() as u32);
                    for idx in indices {
                        encoding::write_vu32(&mut contents, *idx);
                    }
                }
                ElementInit::Expressions(exprs) => {
                    // Flags 5-7 carry a reftype byte; flag 4 implies funcref
                    if flags != 4 {
                        contents.push(segment.ref_type.wire_byte());
                    }
                    encoding::write_vu32(&mut contents, exprs.len() as u32);
                    for expr in exprs {
                        expr.encode(&mut contents);
                    }
                }
            }
        }
        write_section(out, SECTION_ELEMENT, &contents);
    }

    fn element_flags(segment: &ElementSegment) -> u32 {
        let mut flags = match &segment.mode {
            // The implicit-table-0 encodings (flags 0 and 4) also imply a
            // funcref element kind; a non-funcref active segment must take
            // the explicit-table form so its reftype byte is emitted.
            ElementMode::Active { table: 0, .. } if segment.ref_type == RefType::FuncRef => 0,
            ElementMode::Active { .. } => 2,
            ElementMode::Passive => 1,
            ElementMode::Declarative => 3,
        };
        if matches!(segment.init, ElementInit::Expressions(_)) {
            flags |= 4;
        }
        flags
    }

    /// DataCount section (id 12): emitted whenever data segments exist so
    /// that `memory.init`/`data.drop` in the Code section can validate.
    fn data_count_section(&self, out: &mut Vec<u8>) {
        if self.data.is_empty() {
            return;
        }
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, self.data.len() as u32);
        write_section(out, SECTION_DATA_COUNT, &contents);
    }

    /// Code section (id 10): length-prefixed bodies, each a locals vector
    /// followed by the already-terminated body expression.
    fn code_section(&self, out: &mut Vec<u8>) {
        if self.functions.is_empty() {
            return;
        }
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, self.functions.len() as u32);
        for func in &self.functions {
            let mut body = Vec::new();
            encoding::write_vu32(&mut body, func.locals.len() as u32);
            for (count, vt) in &func.locals {
                encoding::write_vu32(&mut body, *count);
                body.push(vt.wire_byte());
            }
            body.extend_from_slice(func.body.bytes());
            encoding::write_u8vec(&mut contents, &body);
        }
        write_section(out, SECTION_CODE, &contents);
    }

    /// Data section (id 11).
    fn data_section(&self, out: &mut Vec<u8>) {
        if self.data.is_empty() {
            return;
        }
        let mut contents = Vec::new();
        encoding::write_vu32(&mut contents, self.data.len() as u32);
        for segment in &self.data {
            match &segment.mode {
                DataMode::Active { memory: 0, offset } => {
                    encoding::write_vu32(&mut contents, DATA_ACTIVE);
                    offset.encode(&mut contents);
                }
                DataMode::Active { memory, offset } => {
                    encoding::write_vu32(&mut contents, DATA_ACTIVE_EXPLICIT);
                    encoding::write_vu32(&mut contents, *memory);
                    offset.encode(&mut contents);
                }
                DataMode::Passive => {
                    encoding::write_vu32(&mut contents, DATA_PASSIVE);
                }
            }
            encoding::write_u8vec(&mut contents, &segment.bytes);
        }
        write_section(out, SECTION_DATA, &contents);
    }

    /// Custom sections (id 0), after all standard sections.
    fn custom_sections(&self, out: &mut Vec<u8>) {
        for (name, bytes) in &self.customs {
            let mut contents = Vec::new();
            encoding::write_name(&mut contents, name);
            contents.extend_from_slice(bytes);
            write_section(out, SECTION_CUSTOM, &contents);
        }
    }
}

// ===========================================================================
// Tests (unit level; scenario coverage lives in tests/builder_tests.rs)
// ===========================================================================
