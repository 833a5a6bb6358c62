use crate::context::AnalysisContext;
use crate::emitter::Channel;
use crate::entry::{
    ComputedEntry, DataEntry, Entry, FunctionDescriptor, MethodEntry, ModelEntry, Parameter,
    PropEntry, Returns, TypeName,
};
use crate::events::{EventScanner, SCANNED_HOOKS};
use crate::function::FunctionRef;
use crate::jsdoc::{doc_before, leading_comment, normalize_type, DocComment, SlotTag};
use crate::scope::ScopeResolver;
use crate::validate::{
    Diagnostic, W_DUPLICATE_MEMBER, W_DUPLICATE_OPTION, W_EXPORT_KIND, W_EXPORT_UNRESOLVED,
    W_NAME_UNRESOLVED, W_TYPE_UNION,
};
use lazy_static::lazy_static;
use oxc_ast::ast::{
    BindingPattern, Declaration, Expression, ObjectExpression, ObjectProperty, ObjectPropertyKind, Program,
    Statement, StaticMemberExpression,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::GetSpan;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref KEBAB_RE: Regex = Regex::new(r"\B([A-Z])").unwrap();
    static ref PROP_WRAPPER_RE: Regex =
        Regex::new(r"^Prop(?:Options|Type)\s*<([\s\S]*)>$").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// How many identifier hops an export may take before it counts as unresolved.
const MAX_EXPORT_DEPTH: usize = 8;

const DEFAULT_MODEL_PROP: &str = "value";
const DEFAULT_MODEL_EVENT: &str = "input";

/// Top-level `name = initializer` pairs, used to follow an exported identifier.
type Declarations<'b, 'a> = HashMap<String, (&'b Expression<'a>, u32)>;

// ═══════════════════════════════════════════════════════════════════════════════
// RESULT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportState {
    /// The script exports nothing recognizable as a component.
    #[default]
    Missing,
    Found,
    /// An export exists but does not lead to an object literal.
    Unresolved,
}

/// What the driver needs after the script has been processed.
#[derive(Debug, Default)]
pub struct ComponentSummary {
    pub export: ExportState,
    /// Slots declared by `@slot` tags on the component comment.
    pub slot_tags: Vec<SlotTag>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Top-level keys of the component object in declaration order.
struct ComponentOptions<'b, 'a> {
    entries: Vec<(String, &'b ObjectProperty<'a>)>,
    declarations: Declarations<'b, 'a>,
}

impl<'b, 'a> ComponentOptions<'b, 'a> {
    fn all(&self, key: &'static str) -> impl Iterator<Item = &'b ObjectProperty<'a>> + '_ {
        self.entries
            .iter()
            .filter(move |(name, _)| name == key)
            .map(|(_, prop)| *prop)
    }

    fn last(&self, key: &str) -> Option<&'b ObjectProperty<'a>> {
        self.entries
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, prop)| *prop)
    }

    /// Follows identifiers to their top-level initializer and strips
    /// parentheses and type assertions.
    fn deref(&self, expr: &'b Expression<'a>) -> &'b Expression<'a> {
        let mut current = expr;
        for _ in 0..MAX_EXPORT_DEPTH {
            current = match current {
                Expression::Identifier(id) => match self.declarations.get(id.name.as_str()) {
                    Some((init, _)) => *init,
                    None => return current,
                },
                Expression::ParenthesizedExpression(paren) => &paren.expression,
                Expression::TSAsExpression(cast) => &cast.expression,
                Expression::TSSatisfiesExpression(cast) => &cast.expression,
                _ => return current,
            };
        }
        current
    }

    fn object(&self, expr: &'b Expression<'a>) -> Option<&'b ObjectExpression<'a>> {
        match self.deref(expr) {
            Expression::ObjectExpression(obj) => Some(&**obj),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXTRACTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Walks the exported component definition and publishes one entry per
/// documented option member, category by category.
pub struct ComponentExtractor<'c, 'l, 's> {
    resolver: ScopeResolver<'s>,
    ctx: &'c mut AnalysisContext<'l>,
}

impl<'c, 'l, 's> ComponentExtractor<'c, 'l, 's> {
    pub fn new(source: &'s str, ctx: &'c mut AnalysisContext<'l>) -> Self {
        Self {
            resolver: ScopeResolver::new(source),
            ctx,
        }
    }

    /// Extracts every enabled category from `program`. `fallback_name` is
    /// emitted when the component declares no name of its own.
    pub fn extract(mut self, program: &Program<'_>, fallback_name: Option<&str>) -> ComponentSummary {
        let mut declarations: Declarations = HashMap::new();
        let mut export = None;

        for stmt in &program.body {
            self.resolver.declare_statement(stmt);
            match stmt {
                Statement::VariableDeclaration(var) => {
                    for decl in &var.declarations {
                        if let (BindingPattern::BindingIdentifier(id), Some(init)) = (&decl.id, &decl.init) {
                            declarations.insert(id.name.to_string(), (init, stmt.span().start));
                        }
                    }
                }
                Statement::ExportNamedDeclaration(named) => {
                    if let Some(Declaration::VariableDeclaration(var)) = &named.declaration {
                        for decl in &var.declarations {
                            self.resolver.declare(&decl.id, decl.init.as_ref());
                            if let (BindingPattern::BindingIdentifier(id), Some(init)) =
                                (&decl.id, &decl.init)
                            {
                                declarations.insert(id.name.to_string(), (init, stmt.span().start));
                            }
                        }
                    }
                }
                Statement::ExportDefaultDeclaration(export_default) => {
                    match export_default.declaration.as_expression() {
                        Some(expr) => export = Some((expr, stmt.span().start)),
                        None => self.warn(
                            W_EXPORT_KIND,
                            "default export is a class or function declaration, not a component object",
                            stmt.span().start,
                        ),
                    }
                }
                Statement::ExpressionStatement(expr_stmt) => {
                    if let Expression::AssignmentExpression(assign) = &expr_stmt.expression {
                        let target: String = self
                            .resolver
                            .text(assign.left.span())
                            .split_whitespace()
                            .collect();
                        if target == "module.exports" {
                            export = Some((&assign.right, stmt.span().start));
                        }
                    }
                }
                _ => {}
            }
        }

        let Some((export_expr, export_start)) = export else {
            tracing::debug!("script has no default export");
            return ComponentSummary::default();
        };

        let Some((object, declared_at)) = component_object(export_expr, &declarations, 0) else {
            self.warn(
                W_EXPORT_UNRESOLVED,
                &format!(
                    "cannot resolve exported component `{}`",
                    self.resolver.text(export_expr.span())
                ),
                export_start,
            );
            return ComponentSummary {
                export: ExportState::Unresolved,
                slot_tags: Vec::new(),
            };
        };

        let source = self.resolver.source();
        let doc = leading_comment(source, export_start as usize)
            .or_else(|| declared_at.and_then(|start| leading_comment(source, start as usize)))
            .map(|body| DocComment::parse(&body))
            .unwrap_or_default();
        self.report_unions(&doc, export_start);

        let options = self.collect_options(object, declarations);
        self.extract_name(&options, &doc, fallback_name);
        self.extract_description(&doc);

        let model_prop = self.model_prop(&options);
        if self.ctx.is_enabled(Channel::Model) {
            self.extract_model(&options);
        }
        if self.ctx.is_enabled(Channel::Prop) {
            self.extract_props(&options, &model_prop);
        }
        if self.ctx.is_enabled(Channel::Data) {
            self.extract_data(&options);
        }
        if self.ctx.is_enabled(Channel::Computed) {
            self.extract_computed(&options);
        }
        if self.ctx.is_enabled(Channel::Method) {
            self.extract_methods(&options);
        }
        if self.ctx.is_enabled(Channel::Event) {
            self.extract_events(&options);
        }

        ComponentSummary {
            export: ExportState::Found,
            slot_tags: doc.slots,
        }
    }

    fn collect_options<'b, 'a>(
        &mut self,
        object: &'b ObjectExpression<'a>,
        declarations: Declarations<'b, 'a>,
    ) -> ComponentOptions<'b, 'a> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        for kind in &object.properties {
            let ObjectPropertyKind::ObjectProperty(prop) = kind else {
                continue;
            };
            let Some(key) = self.resolver.property_key_name(&prop.key) else {
                continue;
            };
            if !seen.insert(key.clone()) {
                self.warn(
                    W_DUPLICATE_OPTION,
                    &format!("component option `{}` is declared more than once", key),
                    prop.span.start,
                );
            }
            entries.push((key, &**prop));
        }
        ComponentOptions {
            entries,
            declarations,
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Component-level entries
    // ───────────────────────────────────────────────────────────────────────────

    fn extract_name(&mut self, options: &ComponentOptions, doc: &DocComment, fallback: Option<&str>) {
        if !self.ctx.is_enabled(Channel::Name) {
            return;
        }
        let declared = match options.last("name") {
            Some(prop) => {
                let value = self.resolver.resolve(&prop.value);
                match value.as_str() {
                    Some(name) => Some(name.to_string()),
                    None => {
                        self.warn(
                            W_NAME_UNRESOLVED,
                            &format!("component name `{}` is not a static string", value.raw),
                            prop.span.start,
                        );
                        None
                    }
                }
            }
            None => None,
        };
        let name = declared
            .or_else(|| {
                doc.keywords
                    .iter()
                    .find(|k| k.name == "name" && !k.description.is_empty())
                    .map(|k| k.description.clone())
            })
            .or_else(|| fallback.map(str::to_string));
        if let Some(value) = name {
            self.ctx.emit(Entry::Name { value });
        }
    }

    fn extract_description(&mut self, doc: &DocComment) {
        if let Some(value) = &doc.description {
            self.ctx.emit(Entry::Description {
                value: value.clone(),
            });
        }
        let keywords = doc.component_keywords();
        if !keywords.is_empty() {
            self.ctx.emit(Entry::Keywords { value: keywords });
        }
    }

    /// The prop bound by `v-model`, whether or not models are being emitted.
    fn model_prop(&self, options: &ComponentOptions) -> String {
        options
            .last("model")
            .map(|prop| self.resolver.resolve(&prop.value))
            .and_then(|model| model.property("prop").and_then(|p| p.as_str().map(str::to_string)))
            .unwrap_or_else(|| DEFAULT_MODEL_PROP.to_string())
    }

    fn extract_model(&mut self, options: &ComponentOptions) {
        for prop in options.all("model") {
            let model = self.resolver.resolve(&prop.value);
            let bound = model
                .property("prop")
                .and_then(|p| p.as_str())
                .unwrap_or(DEFAULT_MODEL_PROP)
                .to_string();
            let event = model
                .property("event")
                .and_then(|e| e.as_str())
                .unwrap_or(DEFAULT_MODEL_EVENT)
                .to_string();
            let doc = self.member_doc(prop.span.start);
            if doc.hidden {
                continue;
            }
            self.ctx.emit(Entry::Model(ModelEntry {
                member: doc.member(&bound),
                prop: bound,
                event,
            }));
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Props
    // ───────────────────────────────────────────────────────────────────────────

    fn extract_props(&mut self, options: &ComponentOptions, model_prop: &str) {
        for option in options.all("props") {
            match options.deref(&option.value) {
                Expression::ArrayExpression(arr) => {
                    let mut seen = HashSet::new();
                    for element in &arr.elements {
                        let Some(expr) = element.as_expression() else {
                            continue;
                        };
                        let Some(key) = self.resolver.resolve(expr).as_str().map(str::to_string) else {
                            continue;
                        };
                        self.check_member_duplicate(&mut seen, "props", &key, expr.span().start);
                        let doc = self.member_doc(expr.span().start);
                        if doc.hidden {
                            continue;
                        }
                        let name = kebab_case(&key);
                        let kind = doc
                            .type_override
                            .as_deref()
                            .map(type_from_text)
                            .unwrap_or_else(TypeName::unknown);
                        self.ctx.emit(Entry::Prop(PropEntry {
                            describe_model: doc.model || key == model_prop || name == model_prop,
                            member: doc.member(&name),
                            kind,
                            required: false,
                            default: doc.default_override.clone(),
                            function: None,
                        }));
                    }
                }
                Expression::ObjectExpression(obj) => {
                    let mut seen = HashSet::new();
                    for kind in &obj.properties {
                        let ObjectPropertyKind::ObjectProperty(prop) = kind else {
                            continue;
                        };
                        let Some(key) = self.resolver.property_key_name(&prop.key) else {
                            continue;
                        };
                        self.check_member_duplicate(&mut seen, "props", &key, prop.span.start);
                        let doc = self.member_doc(prop.span.start);
                        if doc.hidden {
                            continue;
                        }
                        let entry = self.describe_prop(&key, prop, &doc, model_prop);
                        self.ctx.emit(Entry::Prop(entry));
                    }
                }
                _ => {}
            }
        }
    }

    fn describe_prop(
        &self,
        key: &str,
        prop: &ObjectProperty<'_>,
        doc: &DocComment,
        model_prop: &str,
    ) -> PropEntry {
        let name = kebab_case(key);
        let mut kind = TypeName::unknown();
        let mut required = false;
        let mut default = None;
        let mut function = None;

        let (descriptor, cast) = match &prop.value {
            Expression::TSAsExpression(cast) => match strip_parens(&cast.expression) {
                Expression::ObjectExpression(obj) => (
                    Some(&**obj),
                    Some(annotation_text(self.resolver.text(cast.type_annotation.span()))),
                ),
                _ => (None, None),
            },
            value => match strip_parens(value) {
                Expression::ObjectExpression(obj) => (Some(&**obj), None),
                _ => (None, None),
            },
        };

        match descriptor {
            Some(obj) => {
                for field in &obj.properties {
                    let ObjectPropertyKind::ObjectProperty(field) = field else {
                        continue;
                    };
                    match self.resolver.property_key_name(&field.key).as_deref() {
                        Some("type") => kind = self.prop_type(&field.value),
                        Some("required") => {
                            required = self.resolver.resolve(&field.value).as_bool().unwrap_or(false)
                        }
                        Some("default") => default = Some(&**field),
                        _ => {}
                    }
                }
                if let Some(cast) = cast {
                    kind = TypeName::Single(cast);
                }
            }
            None => kind = self.prop_type(&prop.value),
        }

        if let Some(text) = &doc.type_override {
            kind = type_from_text(text);
        }

        if doc.kind.as_deref() == Some("function") {
            if let Some(func) = default.and_then(|field| FunctionRef::from_expression(&field.value)) {
                function = Some(self.function_descriptor(key, func, doc));
            }
        }
        let reduce = function.is_none() && !kind.contains("function");
        let default = match (&doc.default_override, default) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(field)) => self.prop_default(field, reduce),
            (None, None) => None,
        };

        PropEntry {
            describe_model: doc.model || key == model_prop || name == model_prop,
            member: doc.member(&name),
            kind,
            required,
            default,
            function,
        }
    }

    /// Serialized `default` of a prop descriptor. A factory returning an
    /// object or array literal reduces to that literal when `reduce` is set;
    /// a method-shorthand factory with any other body has no default.
    fn prop_default(&self, field: &ObjectProperty<'_>, reduce: bool) -> Option<String> {
        let Some(func) = FunctionRef::from_expression(&field.value) else {
            return Some(self.resolver.resolve(&field.value).raw);
        };
        match func.single_return().map(strip_parens) {
            Some(returned @ (Expression::ObjectExpression(_) | Expression::ArrayExpression(_)))
                if reduce =>
            {
                Some(self.resolver.resolve(returned).raw)
            }
            _ if field.method => None,
            _ => Some(self.resolver.text(field.value.span()).to_string()),
        }
    }

    /// Type of a prop written as a constructor, a list of constructors or a
    /// type-asserted expression.
    fn prop_type(&self, expr: &Expression<'_>) -> TypeName {
        match expr {
            Expression::TSAsExpression(cast) => {
                TypeName::Single(annotation_text(self.resolver.text(cast.type_annotation.span())))
            }
            Expression::ParenthesizedExpression(paren) => self.prop_type(&paren.expression),
            Expression::Identifier(id) => TypeName::Single(id.name.to_lowercase()),
            Expression::ArrayExpression(arr) => {
                let mut types = Vec::new();
                for element in &arr.elements {
                    if let Some(expr) = element.as_expression() {
                        match self.prop_type(expr) {
                            TypeName::Single(t) => types.push(t),
                            TypeName::Union(list) => types.extend(list),
                        }
                    }
                }
                if types.is_empty() {
                    TypeName::unknown()
                } else {
                    TypeName::from_list(types)
                }
            }
            other => TypeName::Single(self.resolver.text(other.span()).to_string()),
        }
    }

    fn function_descriptor(&self, key: &str, func: FunctionRef<'_, '_>, doc: &DocComment) -> FunctionDescriptor {
        let params = func.describe_params(&self.resolver, doc);
        let returns = doc.returns.clone().unwrap_or_else(|| Returns::of("unknown"));
        let syntax = if doc.syntax.is_empty() {
            vec![format!("function {}", signature(key, &params, &returns))]
        } else {
            doc.syntax.clone()
        };
        FunctionDescriptor {
            name: key.to_string(),
            description: doc.description.clone(),
            keywords: doc.keywords.clone(),
            syntax,
            params,
            returns,
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Data
    // ───────────────────────────────────────────────────────────────────────────

    fn extract_data(&mut self, options: &ComponentOptions) {
        for option in options.all("data") {
            let value = options.deref(&option.value);
            if let Some(func) = FunctionRef::from_expression(value) {
                self.resolver.push_frame();
                func.declare_params(&mut self.resolver);
                if let Some(obj) = self.returned_object(func) {
                    self.emit_data(obj);
                }
                self.resolver.pop_frame();
            } else if let Some(obj) = options.object(value) {
                self.emit_data(obj);
            }
        }
    }

    /// The object literal a `data` function returns. Declarations before the
    /// `return` are bound in the current frame.
    fn returned_object<'b, 'a>(&mut self, func: FunctionRef<'b, 'a>) -> Option<&'b ObjectExpression<'a>> {
        if func.is_expression_body() {
            return match func.single_return().map(strip_parens) {
                Some(Expression::ObjectExpression(obj)) => Some(&**obj),
                _ => None,
            };
        }
        for stmt in func.statements()? {
            match stmt {
                Statement::ReturnStatement(ret) => {
                    return match ret.argument.as_ref().map(strip_parens) {
                        Some(Expression::ObjectExpression(obj)) => Some(&**obj),
                        _ => None,
                    };
                }
                other => self.resolver.declare_statement(other),
            }
        }
        None
    }

    fn emit_data(&mut self, obj: &ObjectExpression<'_>) {
        let mut seen = HashSet::new();
        for kind in &obj.properties {
            let ObjectPropertyKind::ObjectProperty(prop) = kind else {
                continue;
            };
            let Some(key) = self.resolver.property_key_name(&prop.key) else {
                continue;
            };
            self.check_member_duplicate(&mut seen, "data", &key, prop.span.start);
            let doc = self.member_doc(prop.span.start);
            if doc.hidden {
                continue;
            }
            let value = self.resolver.resolve(&prop.value);
            let kind = match &doc.type_override {
                Some(text) => type_from_text(text),
                None => TypeName::Single(value.kind.as_str().to_string()),
            };
            self.ctx.emit(Entry::Data(DataEntry {
                member: doc.member(&key),
                kind,
                initial_value: value.raw,
            }));
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Computed
    // ───────────────────────────────────────────────────────────────────────────

    fn extract_computed(&mut self, options: &ComponentOptions) {
        for option in options.all("computed") {
            let Some(obj) = options.object(&option.value) else {
                continue;
            };
            let mut seen = HashSet::new();
            for kind in &obj.properties {
                let ObjectPropertyKind::ObjectProperty(prop) = kind else {
                    continue;
                };
                let Some(key) = self.resolver.property_key_name(&prop.key) else {
                    continue;
                };
                self.check_member_duplicate(&mut seen, "computed", &key, prop.span.start);
                let doc = self.member_doc(prop.span.start);
                if doc.hidden {
                    continue;
                }
                let getter = FunctionRef::from_expression(&prop.value).or_else(|| {
                    let Expression::ObjectExpression(descriptor) = strip_parens(&prop.value) else {
                        return None;
                    };
                    descriptor.properties.iter().find_map(|field| match field {
                        ObjectPropertyKind::ObjectProperty(field)
                            if self.resolver.property_key_name(&field.key).as_deref() == Some("get") =>
                        {
                            FunctionRef::from_expression(&field.value)
                        }
                        _ => None,
                    })
                });
                let dependencies = getter.map(this_dependencies).unwrap_or_default();
                let kind = match (&doc.type_override, &doc.returns) {
                    (Some(text), _) => type_from_text(text),
                    (None, Some(returns)) => returns.kind.clone(),
                    (None, None) => TypeName::unknown(),
                };
                self.ctx.emit(Entry::Computed(ComputedEntry {
                    member: doc.member(&key),
                    kind,
                    dependencies,
                }));
            }
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Methods and events
    // ───────────────────────────────────────────────────────────────────────────

    fn extract_methods(&mut self, options: &ComponentOptions) {
        for option in options.all("methods") {
            let Some(obj) = options.object(&option.value) else {
                continue;
            };
            let mut seen = HashSet::new();
            for kind in &obj.properties {
                let ObjectPropertyKind::ObjectProperty(prop) = kind else {
                    continue;
                };
                let Some(key) = self.resolver.property_key_name(&prop.key) else {
                    continue;
                };
                self.check_member_duplicate(&mut seen, "methods", &key, prop.span.start);
                let doc = self.member_doc(prop.span.start);
                if doc.hidden {
                    continue;
                }
                let params = match FunctionRef::from_expression(&prop.value) {
                    Some(func) => func.describe_params(&self.resolver, &doc),
                    None => Vec::new(),
                };
                let returns = doc.returns.clone().unwrap_or_else(|| Returns::of("void"));
                let syntax = if doc.syntax.is_empty() {
                    vec![signature(&key, &params, &returns)]
                } else {
                    doc.syntax.clone()
                };
                self.ctx.emit(Entry::Method(MethodEntry {
                    member: doc.member(&key),
                    params,
                    returns,
                    syntax,
                }));
            }
        }
    }

    /// Scans method and hook bodies for emitted events, in option
    /// declaration order.
    fn extract_events(&mut self, options: &ComponentOptions) {
        let mut bodies = Vec::new();
        for (key, prop) in &options.entries {
            if key == "methods" {
                let Some(obj) = options.object(&prop.value) else {
                    continue;
                };
                for kind in &obj.properties {
                    if let ObjectPropertyKind::ObjectProperty(method) = kind {
                        if let Some(func) = FunctionRef::from_expression(&method.value) {
                            bodies.push(func);
                        }
                    }
                }
            } else if SCANNED_HOOKS.contains(&key.as_str()) {
                if let Some(func) = FunctionRef::from_expression(&prop.value) {
                    bodies.push(func);
                }
            }
        }

        tracing::debug!(bodies = bodies.len(), "scanning for emitted events");
        let mut scanner = EventScanner::new(&mut self.resolver);
        for func in bodies {
            scanner.scan_function(func);
        }
        for event in scanner.into_events() {
            self.ctx.emit(Entry::Event(event));
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Diagnostics
    // ───────────────────────────────────────────────────────────────────────────

    fn member_doc(&mut self, start: u32) -> DocComment {
        let doc = doc_before(self.resolver.source(), start as usize);
        self.report_unions(&doc, start);
        doc
    }

    fn report_unions(&mut self, doc: &DocComment, start: u32) {
        for union in &doc.malformed_unions {
            self.warn(
                W_TYPE_UNION,
                &format!("type union `{}` has an empty member", union),
                start,
            );
        }
    }

    fn check_member_duplicate(&mut self, seen: &mut HashSet<String>, block: &str, key: &str, start: u32) {
        if !seen.insert(key.to_string()) {
            self.warn(
                W_DUPLICATE_MEMBER,
                &format!("`{}` is declared more than once in `{}`", key, block),
                start,
            );
        }
    }

    fn warn(&mut self, code: &str, message: &str, offset: u32) {
        let diagnostic = Diagnostic::at(code, message, self.resolver.source(), offset as usize);
        self.ctx.warn(diagnostic);
    }
}

/// The component object behind an exported expression, plus the start of the
/// declaration it was reached through.
fn component_object<'b, 'a>(
    expr: &'b Expression<'a>,
    declarations: &Declarations<'b, 'a>,
    depth: usize,
) -> Option<(&'b ObjectExpression<'a>, Option<u32>)> {
    if depth > MAX_EXPORT_DEPTH {
        return None;
    }
    match expr {
        Expression::ObjectExpression(obj) => Some((&**obj, None)),
        Expression::CallExpression(call) => call
            .arguments
            .iter()
            .filter_map(|arg| arg.as_expression())
            .find_map(|arg| component_object(arg, declarations, depth + 1)),
        Expression::Identifier(id) => {
            let &(init, start) = declarations.get(id.name.as_str())?;
            let (obj, inner) = component_object(init, declarations, depth + 1)?;
            Some((obj, inner.or(Some(start))))
        }
        Expression::ParenthesizedExpression(paren) => {
            component_object(&paren.expression, declarations, depth + 1)
        }
        Expression::TSAsExpression(cast) => component_object(&cast.expression, declarations, depth + 1),
        Expression::TSSatisfiesExpression(cast) => {
            component_object(&cast.expression, declarations, depth + 1)
        }
        _ => None,
    }
}

/// Names read off `this` anywhere in a function body, in first-read order.
fn this_dependencies(func: FunctionRef<'_, '_>) -> Vec<String> {
    struct ThisAccess {
        names: Vec<String>,
    }

    impl<'a> Visit<'a> for ThisAccess {
        fn visit_static_member_expression(&mut self, expr: &StaticMemberExpression<'a>) {
            if matches!(expr.object, Expression::ThisExpression(_)) {
                let name = expr.property.name.as_str();
                if !self.names.iter().any(|n| n == name) {
                    self.names.push(name.to_string());
                }
            }
            walk::walk_static_member_expression(self, expr);
        }
    }

    let mut collector = ThisAccess { names: Vec::new() };
    if let Some(statements) = func.statements() {
        for stmt in statements {
            collector.visit_statement(stmt);
        }
    }
    collector.names
}

fn strip_parens<'b, 'a>(expr: &'b Expression<'a>) -> &'b Expression<'a> {
    match expr {
        Expression::ParenthesizedExpression(paren) => strip_parens(&paren.expression),
        other => other,
    }
}

/// `camelCase` → `camel-case`.
pub fn kebab_case(name: &str) -> String {
    KEBAB_RE.replace_all(name, "-${1}").to_lowercase()
}

/// Type annotation text with `PropType<T>` unwrapped and whitespace collapsed.
fn annotation_text(raw: &str) -> String {
    let raw = raw.trim();
    let inner = PROP_WRAPPER_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);
    WHITESPACE_RE
        .replace_all(inner.trim(), " ")
        .replace("( ", "(")
        .replace(" )", ")")
}

/// Type written in a `@type` tag.
fn type_from_text(text: &str) -> TypeName {
    let text = text.trim();
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text);
    if !inner.contains('|') {
        return TypeName::Single(normalize_type(inner));
    }
    TypeName::from_list(
        inner
            .split('|')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(normalize_type)
            .collect(),
    )
}

/// `name(a: string, ...rest: unknown): void`, top-level params only.
fn signature(name: &str, params: &[Parameter], returns: &Returns) -> String {
    let params: Vec<String> = params
        .iter()
        .filter(|p| !p.is_nested())
        .map(|p| {
            let prefix = if p.rest { "..." } else { "" };
            let optional = if p.optional { "?" } else { "" };
            format!("{}{}{}: {}", prefix, p.name, optional, p.kind.display())
        })
        .collect();
    format!("{}({}): {}", name, params.join(", "), returns.kind.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("nameValue"), "name-value");
        assert_eq!(kebab_case("value"), "value");
        assert_eq!(kebab_case("isHTMLInput"), "is-h-t-m-l-input");
    }

    #[test]
    fn test_annotation_text_unwraps_prop_type() {
        assert_eq!(annotation_text("PropType<Book>"), "Book");
        assert_eq!(
            annotation_text("PropOptions<{\n  title: string\n}>"),
            "{ title: string }"
        );
        assert_eq!(annotation_text("( a: string ) => void"), "(a: string) => void");
    }

    #[test]
    fn test_type_from_text() {
        assert!(type_from_text("String").is("string"));
        assert_eq!(
            type_from_text("(Number|Boolean)"),
            TypeName::Union(vec!["number".into(), "boolean".into()])
        );
    }

    #[test]
    fn test_signature() {
        let mut rest = Parameter::new("values");
        rest.rest = true;
        let mut first = Parameter::new("first");
        first.kind = TypeName::Single("string".into());
        let nested = Parameter::new("first.inner");
        assert_eq!(
            signature("sum", &[first, nested, rest], &Returns::of("number")),
            "sum(first: string, ...values: unknown): number"
        );
    }
}
