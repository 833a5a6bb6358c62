use crate::value::{Binding, Lookup, Properties, ResolvedValue, ScopeTable, ValueType};
use oxc_ast::ast::{
    ArrayExpressionElement, AssignmentTarget, BindingPattern, Expression, ObjectPropertyKind,
    PropertyKey, Statement,
};
use oxc_span::{GetSpan, Span};
use oxc_syntax::operator::AssignmentOperator;

/// Builds bindings from declarations and statically resolves expressions
/// against them.
///
/// Declarations are processed in program order, so a forward reference is
/// simply unresolved at the point it is read. Every binding stores the value
/// already resolved at declaration time, which makes aliasing transitive
/// without any cycle handling.
pub struct ScopeResolver<'s> {
    source: &'s str,
    table: ScopeTable,
}

impl<'s> ScopeResolver<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            table: ScopeTable::new(),
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Source text covered by `span`.
    pub fn text(&self, span: Span) -> &'s str {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    pub fn table(&self) -> &ScopeTable {
        &self.table
    }

    pub fn push_frame(&mut self) {
        self.table.push_frame();
    }

    pub fn pop_frame(&mut self) {
        self.table.pop_frame();
    }

    pub fn bind(&mut self, key: &str, source: Option<&str>, value: ResolvedValue) {
        self.table.insert(Binding {
            key: key.to_string(),
            source: source.map(str::to_string),
            value,
        });
    }

    /// Value bound to `name`, or an unknown carrying the bare name.
    pub fn lookup_value(&self, name: &str) -> ResolvedValue {
        if name == "undefined" {
            return ResolvedValue::undefined();
        }
        match self.table.lookup(name) {
            Lookup::Bound(binding) => binding.value.clone(),
            Lookup::Unresolved => ResolvedValue::unknown(name),
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Declarations
    // ───────────────────────────────────────────────────────────────────────────

    /// Registers the bindings introduced by a top-level or body statement.
    /// Statements that declare nothing are ignored.
    pub fn declare_statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::VariableDeclaration(var) => {
                for decl in &var.declarations {
                    self.declare(&decl.id, decl.init.as_ref());
                }
            }
            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    let value = ResolvedValue::function(self.text(func.span));
                    self.bind(id.name.as_str(), None, value);
                }
            }
            Statement::ExpressionStatement(expr_stmt) => {
                self.declare_assignment(&expr_stmt.expression);
            }
            _ => {}
        }
    }

    /// `x = expr` rebinds `x` in the current frame.
    pub fn declare_assignment(&mut self, expr: &Expression<'_>) {
        if let Expression::AssignmentExpression(assign) = expr {
            if assign.operator != AssignmentOperator::Assign {
                return;
            }
            if let AssignmentTarget::AssignmentTargetIdentifier(id) = &assign.left {
                let value = self.resolve(&assign.right);
                self.bind(id.name.as_str(), None, value);
            }
        }
    }

    pub fn declare(&mut self, pattern: &BindingPattern<'_>, init: Option<&Expression<'_>>) {
        let value = init.map(|expr| self.resolve(expr));
        self.declare_value(pattern, value);
    }

    /// Binds `pattern` against an already resolved value. `None` means the
    /// value is absent, which lets pattern defaults apply.
    pub fn declare_value(&mut self, pattern: &BindingPattern<'_>, value: Option<ResolvedValue>) {
        self.declare_named(pattern, None, value);
    }

    /// Binds every name in a parameter pattern to an unknown carrying its
    /// own name, since argument values are never known statically.
    pub fn declare_opaque(&mut self, pattern: &BindingPattern<'_>) {
        for name in binding_names(pattern) {
            let value = ResolvedValue::unknown(&name);
            self.bind(&name, None, value);
        }
    }

    fn declare_named(
        &mut self,
        pattern: &BindingPattern<'_>,
        source_key: Option<&str>,
        value: Option<ResolvedValue>,
    ) {
        match pattern {
            BindingPattern::BindingIdentifier(id) => {
                let name = id.name.as_str();
                let source = source_key.filter(|key| *key != name);
                self.bind(
                    name,
                    source,
                    value.unwrap_or_else(ResolvedValue::undefined),
                );
            }
            BindingPattern::AssignmentPattern(assign) => {
                let value = match value {
                    Some(v) if !v.is_undefined() => v,
                    _ => self.resolve(&assign.right),
                };
                self.declare_named(&assign.left, source_key, Some(value));
            }
            BindingPattern::ObjectPattern(obj) => {
                let mut used = Vec::new();
                for prop in &obj.properties {
                    let Some(key) = self.property_key_name(&prop.key) else {
                        continue;
                    };
                    let child = value.as_ref().and_then(|v| project_key(v, &key));
                    self.declare_named(&prop.value, Some(&key), child);
                    used.push(key);
                }
                if let Some(rest) = &obj.rest {
                    let remaining = match value.as_ref().and_then(|v| v.raw_object.as_ref()) {
                        Some(props) => ResolvedValue::object(
                            props
                                .iter()
                                .filter(|(k, _)| !used.iter().any(|u| u == k))
                                .map(|(k, v)| (k.to_string(), v.clone()))
                                .collect(),
                        ),
                        None => match &value {
                            Some(v) => ResolvedValue::member_unknown(&v.raw),
                            None => ResolvedValue::object(Properties::new()),
                        },
                    };
                    self.declare_value(&rest.argument, Some(remaining));
                }
            }
            BindingPattern::ArrayPattern(arr) => {
                for (index, element) in arr.elements.iter().enumerate() {
                    if let Some(element) = element {
                        let child = value.as_ref().and_then(|v| project_index(v, index));
                        self.declare_value(element, child);
                    }
                }
                if let Some(rest) = &arr.rest {
                    let skip = arr.elements.len();
                    let remaining = match value.as_ref().and_then(|v| v.raw_array.as_ref()) {
                        Some(items) => {
                            ResolvedValue::array(items.iter().skip(skip).cloned().collect())
                        }
                        None => match &value {
                            Some(v) => ResolvedValue::member_unknown(&v.raw),
                            None => ResolvedValue::array(Vec::new()),
                        },
                    };
                    self.declare_value(&rest.argument, Some(remaining));
                }
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Resolution
    // ───────────────────────────────────────────────────────────────────────────

    pub fn resolve(&self, expr: &Expression<'_>) -> ResolvedValue {
        match expr {
            Expression::StringLiteral(s) => ResolvedValue::string(s.value.as_str()),
            Expression::NumericLiteral(n) => ResolvedValue::number(n.value, self.text(n.span)),
            Expression::BooleanLiteral(b) => ResolvedValue::boolean(b.value),
            Expression::NullLiteral(_) => ResolvedValue::null(),
            Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => {
                let text = self.text(tpl.span);
                let inner = text
                    .strip_prefix('`')
                    .and_then(|t| t.strip_suffix('`'))
                    .unwrap_or(text);
                ResolvedValue::string(inner)
            }
            Expression::UnaryExpression(unary) => {
                let text = self.text(unary.span);
                match &unary.argument {
                    Expression::NumericLiteral(n) if text.starts_with('-') => {
                        ResolvedValue::number(-n.value, text)
                    }
                    _ => ResolvedValue::unknown(text),
                }
            }
            Expression::Identifier(id) => self.lookup_value(id.name.as_str()),
            Expression::ThisExpression(_) => ResolvedValue::unknown("this"),
            Expression::ObjectExpression(obj) => {
                let mut props = Properties::new();
                for kind in &obj.properties {
                    match kind {
                        ObjectPropertyKind::ObjectProperty(prop) => {
                            let Some(key) = self.property_key_name(&prop.key) else {
                                continue;
                            };
                            let value = self.resolve(&prop.value).with_member(false);
                            props.insert(key, value);
                        }
                        ObjectPropertyKind::SpreadProperty(spread) => {
                            let spread = self.resolve(&spread.argument);
                            if let Some(inner) = spread.raw_object {
                                for (k, v) in inner.iter() {
                                    props.insert(k.to_string(), v.clone());
                                }
                            }
                        }
                    }
                }
                ResolvedValue::object(props)
            }
            Expression::ArrayExpression(arr) => {
                let mut items = Vec::new();
                for element in &arr.elements {
                    match element {
                        ArrayExpressionElement::SpreadElement(spread) => {
                            let spread = self.resolve(&spread.argument);
                            match spread.raw_array {
                                Some(inner) => items.extend(inner),
                                None => items.push(ResolvedValue::unknown(self.text(element.span()))),
                            }
                        }
                        ArrayExpressionElement::Elision(_) => items.push(ResolvedValue::undefined()),
                        _ => {
                            if let Some(expr) = element.as_expression() {
                                items.push(self.resolve(expr).with_member(false));
                            }
                        }
                    }
                }
                ResolvedValue::array(items)
            }
            Expression::StaticMemberExpression(member) => {
                let parent = self.resolve(&member.object);
                let raw = self.text(member.span);
                project_key(&parent, member.property.name.as_str())
                    .map(|v| v.with_member(true))
                    .unwrap_or_else(|| ResolvedValue::member_unknown(raw))
            }
            Expression::ComputedMemberExpression(member) => {
                let parent = self.resolve(&member.object);
                let raw = self.text(member.span);
                let key = self.resolve(&member.expression);
                let projected = match (&key.kind, key.as_str()) {
                    (ValueType::String, Some(name)) => project_key(&parent, name),
                    (ValueType::Number, _) => key
                        .value
                        .as_ref()
                        .and_then(|v| v.as_u64())
                        .and_then(|index| project_index(&parent, index as usize)),
                    _ => None,
                };
                projected
                    .map(|v| v.with_member(true))
                    .unwrap_or_else(|| ResolvedValue::member_unknown(raw))
            }
            Expression::ParenthesizedExpression(paren) => self.resolve(&paren.expression),
            Expression::TSAsExpression(cast) => self.resolve(&cast.expression),
            Expression::TSSatisfiesExpression(cast) => self.resolve(&cast.expression),
            Expression::TSNonNullExpression(cast) => self.resolve(&cast.expression),
            Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_) => {
                ResolvedValue::function(self.text(expr.span()))
            }
            _ => ResolvedValue::unknown(self.text(expr.span())),
        }
    }

    /// Static name of an object key. Computed keys count only when they
    /// resolve to a string or number.
    pub fn property_key_name(&self, key: &PropertyKey<'_>) -> Option<String> {
        match key {
            PropertyKey::StaticIdentifier(id) => Some(id.name.to_string()),
            PropertyKey::PrivateIdentifier(id) => Some(id.name.to_string()),
            _ => {
                let value = self.resolve(key.as_expression()?);
                match value.kind {
                    ValueType::String => value.as_str().map(str::to_string),
                    ValueType::Number => value
                        .value
                        .as_ref()
                        .map(|v| v.to_string())
                        .or(Some(value.raw)),
                    _ => None,
                }
            }
        }
    }
}

/// Every identifier a pattern binds, in source order.
pub fn binding_names(pattern: &BindingPattern<'_>) -> Vec<String> {
    let mut names = Vec::new();
    collect_binding_names(pattern, &mut names);
    names
}

fn collect_binding_names(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => names.push(id.name.to_string()),
        BindingPattern::AssignmentPattern(assign) => collect_binding_names(&assign.left, names),
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                collect_binding_names(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                collect_binding_names(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for element in arr.elements.iter().flatten() {
                collect_binding_names(element, names);
            }
            if let Some(rest) = &arr.rest {
                collect_binding_names(&rest.argument, names);
            }
        }
        #[allow(unreachable_patterns)]
        _ => {}
    }
}

/// Property `key` of `parent`. `None` means the property is known to be absent.
fn project_key(parent: &ResolvedValue, key: &str) -> Option<ResolvedValue> {
    if let Some(props) = &parent.raw_object {
        return props.get(key).cloned();
    }
    if let Some(items) = &parent.raw_array {
        if key == "length" {
            return Some(ResolvedValue::number(
                items.len() as f64,
                &items.len().to_string(),
            ));
        }
        return key.parse::<usize>().ok().and_then(|i| items.get(i).cloned());
    }
    if let Some(s) = parent.as_str() {
        if key == "length" {
            let len = s.chars().count();
            return Some(ResolvedValue::number(len as f64, &len.to_string()));
        }
        return None;
    }
    Some(ResolvedValue::member_unknown(&format!("{}.{}", parent.raw, key)))
}

fn project_index(parent: &ResolvedValue, index: usize) -> Option<ResolvedValue> {
    if let Some(items) = &parent.raw_array {
        return items.get(index).cloned();
    }
    if parent.raw_object.is_some() {
        return parent.property(&index.to_string()).cloned();
    }
    if let Some(s) = parent.as_str() {
        return s
            .chars()
            .nth(index)
            .map(|c| ResolvedValue::string(&c.to_string()));
    }
    Some(ResolvedValue::member_unknown(&format!(
        "{}[{}]",
        parent.raw, index
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn resolve_last(code: &str, name: &str) -> ResolvedValue {
        let allocator = Allocator::default();
        let source_type = SourceType::default().with_module(true);
        let ret = Parser::new(&allocator, code, source_type).parse();
        let mut resolver = ScopeResolver::new(code);
        for stmt in &ret.program.body {
            resolver.declare_statement(stmt);
        }
        resolver.lookup_value(name)
    }

    #[test]
    fn test_literal_bindings() {
        assert_eq!(resolve_last("const a = 'chaka';", "a").raw, "\"chaka\"");
        assert_eq!(resolve_last("const a = 42;", "a").raw, "42");
        assert_eq!(resolve_last("const a = -1.5;", "a").raw, "-1.5");
        assert_eq!(resolve_last("const a = true;", "a").raw, "true");
        assert_eq!(resolve_last("const a = null;", "a").kind, ValueType::Object);
        assert_eq!(resolve_last("const a = `tpl`;", "a").as_str(), Some("tpl"));
    }

    #[test]
    fn test_alias_chain_resolves_to_literal() {
        let v = resolve_last("const a = 'x'; const b = a; let c = b;", "c");
        assert_eq!(v.as_str(), Some("x"));
    }

    #[test]
    fn test_unresolved_alias_keeps_innermost_name() {
        let v = resolve_last("const a = ppname; const b = a;", "b");
        assert_eq!(v.kind, ValueType::Unknown);
        assert_eq!(v.raw, "ppname");
        assert!(!v.member);
    }

    #[test]
    fn test_member_chain_projection() {
        let v = resolve_last("const o = { a: { b: 'deep' } }; const x = o.a['b'];", "x");
        assert_eq!(v.as_str(), Some("deep"));
        assert!(v.member);
    }

    #[test]
    fn test_member_through_unknown() {
        let v = resolve_last("const x = external.a.b;", "x");
        assert_eq!(v.kind, ValueType::Unknown);
        assert!(v.member);
        assert_eq!(v.raw, "external.a.b");
    }

    #[test]
    fn test_reassignment_last_write_wins() {
        let v = resolve_last("let a = 'one'; a = 'two';", "a");
        assert_eq!(v.as_str(), Some("two"));
    }

    #[test]
    fn test_forward_reference_is_unknown() {
        let v = resolve_last("const a = b; const b = 'late';", "a");
        assert_eq!(v.kind, ValueType::Unknown);
        assert_eq!(v.raw, "b");
    }
}
