//! Graph resolution.
//!
//! [`resolve`] walks the definition graph depth-first from the requested
//! entry points and produces one WGSL program. Each reached definition is
//! declared once per distinct [`ResolutionKey`]: the same helper reached
//! under different slot values is specialized into separate declarations,
//! and the same helper reached under equal values is shared.
//!
//! ## Traversal
//!
//! - Functions, constants and bindings are keyed, named, and memoized.
//!   Their declaration text is produced after everything they reference, so
//!   dependencies precede dependents in the output.
//! - Slots are read through the override stack and replaced by their value's
//!   literal text, or by the definition they hold.
//! - Specializations push their bindings for the duration of their inner
//!   reference.
//! - Schemas declare their struct and stand for its type name.
//!
//! A function that is re-entered while still in progress resolves to its
//! identifier, so recursive helpers emit normally. Re-entering any other
//! definition is a cyclic dependency.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use shaderweave_core::ir::Stmt;
use shaderweave_core::{
    DataSchema, LayoutError, ResolveError, ResolveErrorKind, SlotValue, size_for_length,
};
use shaderweave_registry::{
    BindingKind, BindingNode, ConstantInit, ConstantNode, DefinitionGraph, FunctionNode, Node,
    NodeId, ShaderStage, SlotBindings,
};

use crate::context::ResolutionContext;
use crate::emit::BodyEmitter;
use crate::emit::types::{
    check_declarable, io_attributes, merged_decorations, struct_decl, type_text,
};
use crate::emit::values::{struct_schemas, value_text};
use crate::layout_table::{BindingEntry, BindingLayoutTable, ShaderStages};
use crate::names::{is_valid_identifier, sanitize};
use crate::options::{NamingStrategy, ResolveOptions};
use crate::scope::BodyScope;
use crate::slots::{EntryState, OverrideStack, ResolutionKey};

/// Placeholder base for unlabelled struct schemas.
const STRUCT_PLACEHOLDER: &str = "Data";

// ============================================================================
// Output
// ============================================================================

/// A requested entry point and the identifier it was declared under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub node: NodeId,
    pub identifier: String,
    /// Pipeline stage, if the entry point is a stage function.
    pub stage: Option<ShaderStage>,
}

/// The result of a successful resolution.
#[derive(Debug, Clone)]
pub struct ResolvedProgram {
    /// Complete WGSL source.
    pub code: String,
    /// Every resource binding the program declares.
    pub bindings: BindingLayoutTable,
    /// Entry points in request order.
    pub entry_points: Vec<EntryPoint>,
}

impl ResolvedProgram {
    /// The identifier of a requested entry point.
    pub fn identifier(&self, node: NodeId) -> Option<&str> {
        self.entry_points
            .iter()
            .find(|e| e.node == node)
            .map(|e| e.identifier.as_str())
    }
}

// ============================================================================
// Entry
// ============================================================================

/// Resolve `entry_points` into a single program.
///
/// `initial` is the outermost override frame; only slots may be bound in it.
/// The graph is only read, so any number of resolutions may run over one
/// graph at the same time.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve<'g>(
    graph: &'g DefinitionGraph,
    entry_points: &[NodeId],
    initial: &'g SlotBindings,
    options: &ResolveOptions,
) -> Result<ResolvedProgram, ResolveError> {
    debug!(
        entry_points = entry_points.len(),
        nodes = graph.len(),
        overrides = initial.len(),
        "resolving program"
    );

    let mut resolver = Resolver::new(graph, options);
    resolver.check_slots(initial)?;
    resolver.stack.push(initial);

    let mut entries = Vec::with_capacity(entry_points.len());
    for &node in entry_points {
        resolver.last_entry = None;
        let identifier = resolver.reference(node)?;
        let stage = stage_of(graph, node);
        if let (Some(stage), Some(entry)) = (stage, resolver.last_entry) {
            let stages = ShaderStages::from(stage);
            for (group, binding) in resolver.ctx.cache.reachable_bindings(entry) {
                resolver.ctx.table.add_visibility(group, binding, stages);
            }
        }
        entries.push(EntryPoint {
            node,
            identifier,
            stage,
        });
    }

    let code = resolver.ctx.code();
    debug!(
        declarations = resolver.ctx.declarations.len(),
        bindings = resolver.ctx.table.len(),
        bytes = code.len(),
        "resolved program"
    );

    Ok(ResolvedProgram {
        code,
        bindings: resolver.ctx.table,
        entry_points: entries,
    })
}

/// Stage of the function an entry point ultimately names, looking through
/// specializations.
fn stage_of(graph: &DefinitionGraph, id: NodeId) -> Option<ShaderStage> {
    let mut current = id;
    // A specialization chain longer than the graph must loop.
    for _ in 0..=graph.len() {
        match graph.get(current)? {
            Node::Function(f) => return f.stage,
            Node::Specialized { inner, .. } => current = *inner,
            _ => return None,
        }
    }
    None
}

// ============================================================================
// Resolver
// ============================================================================

/// A definition that gets its own memoized declaration.
#[derive(Clone, Copy)]
enum Keyed<'g> {
    Function(&'g FunctionNode),
    Constant(&'g ConstantNode),
    Binding(&'g BindingNode),
}

impl Keyed<'_> {
    fn placeholder(self) -> &'static str {
        match self {
            Keyed::Function(_) => "func",
            Keyed::Constant(_) => "constant",
            Keyed::Binding(_) => "binding",
        }
    }

    fn is_function(self) -> bool {
        matches!(self, Keyed::Function(_))
    }
}

struct Resolver<'g> {
    graph: &'g DefinitionGraph,
    naming: NamingStrategy,
    indent: usize,
    stack: OverrideStack<'g>,
    ctx: ResolutionContext,
    /// Cache entries whose declarations are being produced, innermost last.
    owners: Vec<usize>,
    /// Slots and specializations entered since the innermost keyed
    /// definition. Seeing one twice means the chain never reaches a
    /// declaration.
    unkeyed: Vec<NodeId>,
    /// Entry of the last keyed definition a reference ended at.
    last_entry: Option<usize>,
}

impl<'g> Resolver<'g> {
    fn new(graph: &'g DefinitionGraph, options: &ResolveOptions) -> Self {
        Self {
            graph,
            naming: options.naming,
            indent: options.indent,
            stack: OverrideStack::new(),
            ctx: ResolutionContext::new(),
            owners: Vec::new(),
            unkeyed: Vec::new(),
            last_entry: None,
        }
    }

    fn fail(&self, kind: impl Into<ResolveErrorKind>) -> ResolveError {
        ResolveError::new(kind, self.ctx.trail.clone())
    }

    /// Every key of an override frame must be a slot.
    fn check_slots(&self, bindings: &SlotBindings) -> Result<(), ResolveError> {
        for (id, _) in bindings.iter() {
            if !self.graph.get(id).is_some_and(Node::is_slot) {
                return Err(self.fail(ResolveErrorKind::NotASlot {
                    id,
                    name: self.graph.display_name(id),
                }));
            }
        }
        Ok(())
    }

    /// The text standing for `id` at the current point of the traversal.
    fn reference(&mut self, id: NodeId) -> Result<String, ResolveError> {
        let graph = self.graph;
        let Some(node) = graph.get(id) else {
            let from = self.ctx.trail.last().cloned().unwrap_or_default();
            return Err(self.fail(ResolveErrorKind::UnknownReference { from, id }));
        };

        self.ctx.trail.push(graph.display_name(id));
        let result = match node {
            Node::Function(f) => self.declaration(id, Keyed::Function(f)),
            Node::Constant(c) => self.declaration(id, Keyed::Constant(c)),
            Node::Binding(b) => self.declaration(id, Keyed::Binding(b)),
            Node::Slot(_) => self.enter_unkeyed(id, |this| this.slot(id)),
            Node::Schema(schema) => self.schema(schema),
            Node::Specialized { inner, bindings } => {
                self.enter_unkeyed(id, |this| this.specialized(*inner, bindings))
            }
        };
        self.ctx.trail.pop();
        result
    }

    fn enter_unkeyed(
        &mut self,
        id: NodeId,
        resolve: impl FnOnce(&mut Self) -> Result<String, ResolveError>,
    ) -> Result<String, ResolveError> {
        if self.unkeyed.contains(&id) {
            return Err(self.fail(ResolveErrorKind::CyclicDependency {
                node: self.graph.display_name(id),
            }));
        }
        self.unkeyed.push(id);
        let result = resolve(self);
        self.unkeyed.pop();
        result
    }

    // ==========================================================================
    // Unkeyed Nodes
    // ==========================================================================

    fn slot(&mut self, id: NodeId) -> Result<String, ResolveError> {
        let value = self
            .stack
            .read(self.graph, id)
            .map_err(|kind| self.fail(kind))?;
        match value {
            SlotValue::Node(target) => self.reference(*target),
            SlotValue::Value(value) => {
                let mut schemas = Vec::new();
                struct_schemas(value, &mut schemas);
                for schema in &schemas {
                    self.declare_schema(schema)?;
                }
                value_text(value, &self.ctx.structs).map_err(|reason| {
                    self.fail(ResolveErrorKind::InvalidValue {
                        node: self.graph.display_name(id),
                        reason,
                    })
                })
            }
        }
    }

    fn specialized(
        &mut self,
        inner: NodeId,
        bindings: &'g SlotBindings,
    ) -> Result<String, ResolveError> {
        self.check_slots(bindings)?;
        self.stack.push(bindings);
        let result = self.reference(inner);
        self.stack.pop();
        result
    }

    fn schema(&mut self, schema: &DataSchema) -> Result<String, ResolveError> {
        self.declare_schema(schema)?;
        Ok(type_text(schema, &self.ctx.structs))
    }

    // ==========================================================================
    // Keyed Declarations
    // ==========================================================================

    fn declaration(&mut self, id: NodeId, keyed: Keyed<'g>) -> Result<String, ResolveError> {
        let key = ResolutionKey::compute(self.graph, &self.stack, id);

        if let Some(entry) = self.ctx.cache.lookup(&key) {
            self.link(entry);
            if self.ctx.cache.state(entry) == Some(EntryState::InProgress) && !keyed.is_function() {
                return Err(self.fail(ResolveErrorKind::CyclicDependency {
                    node: self.graph.display_name(id),
                }));
            }
            self.last_entry = Some(entry);
            return Ok(self.ctx.cache.identifier(entry).unwrap_or_default().to_string());
        }

        let identifier = self.assign_identifier(id, keyed)?;
        let entry = self.ctx.cache.begin(key, identifier.clone());
        self.link(entry);

        self.owners.push(entry);
        let saved = std::mem::take(&mut self.unkeyed);
        let result = match keyed {
            Keyed::Function(f) => self.function(id, &identifier, f),
            Keyed::Constant(c) => self.constant(id, &identifier, c),
            Keyed::Binding(b) => self.binding(id, entry, &identifier, b),
        };
        self.unkeyed = saved;
        self.owners.pop();

        let text = result?;
        self.ctx.cache.finish(entry);
        self.ctx.declarations.push(text);
        trace!(node = %id, identifier = %identifier, "declared");

        let instances = self.ctx.cache.instances(id);
        if instances > 1 {
            debug!(
                node = %self.graph.display_name(id),
                identifier = %identifier,
                instances,
                "specialized declaration"
            );
        }

        self.last_entry = Some(entry);
        Ok(identifier)
    }

    fn link(&mut self, entry: usize) {
        if let Some(&owner) = self.owners.last() {
            self.ctx.cache.link(owner, entry);
        }
    }

    fn assign_identifier(&mut self, id: NodeId, keyed: Keyed<'_>) -> Result<String, ResolveError> {
        let placeholder = keyed.placeholder();
        let base = match (self.naming, self.graph.get(id).and_then(Node::label)) {
            (NamingStrategy::Labels, Some(label)) => sanitize(label, placeholder),
            _ => placeholder.to_string(),
        };
        self.ctx.names.assign(&base).map_err(|kind| self.fail(kind))
    }

    /// Resolve a reference set to `name -> text`.
    fn externals(
        &mut self,
        externals: impl Iterator<Item = (&'g str, NodeId)>,
    ) -> Result<FxHashMap<String, String>, ResolveError> {
        let mut resolved = FxHashMap::default();
        for (name, target) in externals {
            let text = self.reference(target)?;
            resolved.insert(name.to_string(), text);
        }
        Ok(resolved)
    }

    fn function(
        &mut self,
        id: NodeId,
        identifier: &str,
        f: &'g FunctionNode,
    ) -> Result<String, ResolveError> {
        if let Err(version) = f.body.ir_version() {
            return Err(self.fail(ResolveErrorKind::UnsupportedIrVersion {
                node: self.graph.display_name(id),
                version,
            }));
        }

        let externals = self.externals(f.externals.iter())?;

        let mut touched: Vec<&DataSchema> = f.params.iter().map(|p| &p.schema).collect();
        touched.extend(f.return_schema.as_ref());
        body_schemas(&f.body.statements, &mut touched);
        for schema in &touched {
            self.declare_schema(schema)?;
        }

        let mut avoid: FxHashSet<String> = externals.values().cloned().collect();
        avoid.insert(identifier.to_string());
        for schema in &touched {
            self.struct_names(schema, &mut avoid);
        }

        let structs = &self.ctx.structs;
        let mut emitter = BodyEmitter::new(BodyScope::new(avoid), &externals, structs, self.indent);

        let params: Vec<String> = f
            .params
            .iter()
            .map(|p| {
                format!(
                    "{}{}: {}",
                    io_attributes(merged_decorations(&p.schema).as_ref()),
                    emitter.declare(&p.name),
                    type_text(&p.schema, structs)
                )
            })
            .collect();
        let ret = f
            .return_schema
            .as_ref()
            .map(|schema| {
                format!(
                    " -> {}{}",
                    io_attributes(merged_decorations(schema).as_ref()),
                    type_text(schema, structs)
                )
            })
            .unwrap_or_default();

        match f.stage {
            Some(ShaderStage::Compute { workgroup_size: [x, y, z] }) => {
                emitter.line(&format!("@compute @workgroup_size({x}, {y}, {z})"));
            }
            Some(stage) => emitter.line(&format!("@{}", stage.name())),
            None => {}
        }
        emitter.open(&format!("fn {identifier}({}){ret}", params.join(", ")));
        emitter.statements(&f.body.statements).map_err(|reason| {
            self.fail(ResolveErrorKind::InvalidValue {
                node: self.graph.display_name(id),
                reason,
            })
        })?;
        emitter.close();
        Ok(emitter.finish())
    }

    fn constant(
        &mut self,
        id: NodeId,
        identifier: &str,
        c: &'g ConstantNode,
    ) -> Result<String, ResolveError> {
        self.declare_schema(&c.schema)?;

        let value = match &c.init {
            ConstantInit::Value(value) => {
                let mut schemas = Vec::new();
                struct_schemas(value, &mut schemas);
                for schema in &schemas {
                    self.declare_schema(schema)?;
                }
                value_text(value, &self.ctx.structs).map_err(|reason| {
                    self.fail(ResolveErrorKind::InvalidValue {
                        node: self.graph.display_name(id),
                        reason,
                    })
                })?
            }
            ConstantInit::Expr { expr, externals } => {
                let externals = self.externals(externals.iter())?;
                let emitter = BodyEmitter::new(
                    BodyScope::new(FxHashSet::default()),
                    &externals,
                    &self.ctx.structs,
                    self.indent,
                );
                emitter.expr(expr)
            }
        };

        Ok(format!(
            "const {identifier}: {} = {value};",
            type_text(&c.schema, &self.ctx.structs)
        ))
    }

    fn binding(
        &mut self,
        id: NodeId,
        entry: usize,
        identifier: &str,
        b: &'g BindingNode,
    ) -> Result<String, ResolveError> {
        let schema = b.schema.declared();
        let layout = self
            .ctx
            .layouts
            .layout_of(&schema)
            .map_err(|e| self.fail(e))?;

        if schema.contains_bool() {
            return Err(self.fail(LayoutError::NotHostShareable {
                schema: schema.to_string(),
            }));
        }
        if b.kind == BindingKind::Uniform && layout.runtime_sized {
            return Err(self.fail(LayoutError::RuntimeSizedUniform {
                schema: schema.to_string(),
            }));
        }
        self.declare_schema(&schema)?;

        let min_binding_size = if layout.runtime_sized {
            size_for_length(&schema, 1).map_err(|e| self.fail(e))?
        } else {
            layout.size
        };

        self.ctx
            .table
            .insert(
                b.group,
                b.binding,
                BindingEntry {
                    node: id,
                    identifier: identifier.to_string(),
                    kind: b.kind,
                    visibility: ShaderStages::empty(),
                    min_binding_size,
                },
            )
            .map_err(|kind| self.fail(kind))?;
        self.ctx.cache.set_binding(entry, (b.group, b.binding));

        Ok(format!(
            "@group({}) @binding({}) var<{}> {identifier}: {};",
            b.group,
            b.binding,
            b.kind.address_space(),
            type_text(&schema, &self.ctx.structs)
        ))
    }

    // ==========================================================================
    // Schemas
    // ==========================================================================

    /// Validate a touched schema and declare every struct inside it.
    fn declare_schema(&mut self, schema: &DataSchema) -> Result<(), ResolveError> {
        self.ctx
            .layouts
            .layout_of(schema)
            .map_err(|e| self.fail(e))?;
        check_declarable(schema).map_err(|e| self.fail(e))?;
        self.declare_structs(schema)
    }

    /// Declare nested structs first, then `schema` itself if it is one.
    /// Structurally equal structs share one declaration.
    fn declare_structs(&mut self, schema: &DataSchema) -> Result<(), ResolveError> {
        match schema {
            DataSchema::Array(array) => self.declare_structs(&array.element),
            DataSchema::Decorated(decorated) => self.declare_structs(&decorated.inner),
            DataSchema::Struct(s) => {
                if self.ctx.structs.contains(schema) {
                    return Ok(());
                }
                for field in &s.fields {
                    if !is_valid_identifier(&field.name) {
                        return Err(self.fail(ResolveErrorKind::InvalidFieldName {
                            schema: s.display_name().to_string(),
                            field: field.name.clone(),
                        }));
                    }
                    self.declare_structs(&field.schema)?;
                }

                let base = match (self.naming, s.label.as_deref()) {
                    (NamingStrategy::Labels, Some(label)) => sanitize(label, STRUCT_PLACEHOLDER),
                    _ => STRUCT_PLACEHOLDER.to_string(),
                };
                let name = self.ctx.names.assign(&base).map_err(|kind| self.fail(kind))?;
                let text = struct_decl(&name, s, &self.ctx.structs, self.indent);
                trace!(name = %name, fields = s.fields.len(), "declared struct");
                self.ctx.structs.insert(schema.clone(), name);
                self.ctx.declarations.push(text);
                Ok(())
            }
            DataSchema::Scalar(_)
            | DataSchema::Vector(..)
            | DataSchema::Matrix { .. }
            | DataSchema::Atomic(_) => Ok(()),
        }
    }

    /// Identifiers of the structs inside `schema`.
    fn struct_names(&self, schema: &DataSchema, out: &mut FxHashSet<String>) {
        match schema {
            DataSchema::Array(array) => self.struct_names(&array.element, out),
            DataSchema::Decorated(decorated) => self.struct_names(&decorated.inner, out),
            DataSchema::Struct(s) => {
                if let Some(name) = self.ctx.structs.get(schema) {
                    out.insert(name.to_string());
                }
                for field in &s.fields {
                    self.struct_names(&field.schema, out);
                }
            }
            _ => {}
        }
    }
}

/// Schemas named by local declarations anywhere in a body.
fn body_schemas<'s>(statements: &'s [Stmt], out: &mut Vec<&'s DataSchema>) {
    for statement in statements {
        match statement {
            Stmt::Var { schema, .. } | Stmt::Let { schema, .. } => out.extend(schema.as_ref()),
            Stmt::Block(body) | Stmt::While { body, .. } => body_schemas(body, out),
            Stmt::If {
                then, otherwise, ..
            } => {
                body_schemas(then, out);
                if let Some(otherwise) = otherwise {
                    body_schemas(otherwise, out);
                }
            }
            Stmt::For { init, body, .. } => {
                if let Some(init) = init {
                    body_schemas(std::slice::from_ref(init.as_ref()), out);
                }
                body_schemas(body, out);
            }
            Stmt::Expr(_) | Stmt::Return(_) | Stmt::Break | Stmt::Continue => {}
        }
    }
}
