use crate::entry::{EventEntry, Parameter, TypeName};
use crate::function::FunctionRef;
use crate::jsdoc::{leading_comment, DocComment};
use crate::scope::ScopeResolver;
use oxc_ast::ast::{
    Argument, ArrayExpressionElement, CallExpression, ChainElement, Expression,
    ObjectPropertyKind, Statement,
};
use oxc_span::GetSpan;

/// Lifecycle hooks whose bodies are scanned for emitted events, plus `render`.
pub const SCANNED_HOOKS: &[&str] = &[
    "beforeCreate",
    "created",
    "beforeMount",
    "mounted",
    "beforeUpdate",
    "updated",
    "activated",
    "deactivated",
    "beforeDestroy",
    "destroyed",
    "beforeUnmount",
    "unmounted",
    "errorCaptured",
    "serverPrefetch",
    "setup",
    "beforeRouteEnter",
    "beforeRouteUpdate",
    "beforeRouteLeave",
    "render",
];

/// Finds `$emit(...)` / `emit(...)` calls inside function bodies.
///
/// Walks every nested statement and expression form, keeping the scope
/// resolver in step with declarations so event names written through
/// variables resolve to their literal.
pub struct EventScanner<'r, 's> {
    resolver: &'r mut ScopeResolver<'s>,
    events: Vec<EventEntry>,
    statement_start: u32,
}

impl<'r, 's> EventScanner<'r, 's> {
    pub fn new(resolver: &'r mut ScopeResolver<'s>) -> Self {
        Self {
            resolver,
            events: Vec::new(),
            statement_start: 0,
        }
    }

    /// Events in the order their calls appear.
    pub fn into_events(self) -> Vec<EventEntry> {
        self.events
    }

    pub fn scan_function(&mut self, func: FunctionRef<'_, '_>) {
        self.resolver.push_frame();
        func.declare_params(self.resolver);
        if let Some(statements) = func.statements() {
            for stmt in statements {
                self.scan_statement(stmt);
            }
        }
        self.resolver.pop_frame();
    }

    fn scan_block(&mut self, statements: &[Statement<'_>]) {
        self.resolver.push_frame();
        for stmt in statements {
            self.scan_statement(stmt);
        }
        self.resolver.pop_frame();
    }

    fn scan_statement(&mut self, stmt: &Statement<'_>) {
        let previous = self.statement_start;
        self.statement_start = stmt.span().start;

        match stmt {
            Statement::VariableDeclaration(var) => {
                for decl in &var.declarations {
                    if let Some(init) = &decl.init {
                        self.scan_expression(init);
                    }
                    self.resolver.declare(&decl.id, decl.init.as_ref());
                }
            }
            Statement::FunctionDeclaration(func) => {
                self.resolver.declare_statement(stmt);
                self.scan_function(FunctionRef::Function(func));
            }
            Statement::ExpressionStatement(expr_stmt) => {
                self.scan_expression(&expr_stmt.expression);
                self.resolver.declare_assignment(&expr_stmt.expression);
            }
            Statement::BlockStatement(block) => self.scan_block(&block.body),
            Statement::IfStatement(if_stmt) => {
                self.scan_expression(&if_stmt.test);
                self.scan_statement(&if_stmt.consequent);
                if let Some(alternate) = &if_stmt.alternate {
                    self.scan_statement(alternate);
                }
            }
            Statement::ForStatement(for_stmt) => {
                self.resolver.push_frame();
                if let Some(init) = &for_stmt.init {
                    if let Some(expr) = init.as_expression() {
                        self.scan_expression(expr);
                    }
                }
                if let Some(test) = &for_stmt.test {
                    self.scan_expression(test);
                }
                if let Some(update) = &for_stmt.update {
                    self.scan_expression(update);
                }
                self.scan_statement(&for_stmt.body);
                self.resolver.pop_frame();
            }
            Statement::ForInStatement(for_in) => {
                self.scan_expression(&for_in.right);
                self.scan_statement(&for_in.body);
            }
            Statement::ForOfStatement(for_of) => {
                self.scan_expression(&for_of.right);
                self.scan_statement(&for_of.body);
            }
            Statement::WhileStatement(while_stmt) => {
                self.scan_expression(&while_stmt.test);
                self.scan_statement(&while_stmt.body);
            }
            Statement::DoWhileStatement(do_while) => {
                self.scan_statement(&do_while.body);
                self.scan_expression(&do_while.test);
            }
            Statement::SwitchStatement(switch) => {
                self.scan_expression(&switch.discriminant);
                for case in &switch.cases {
                    if let Some(test) = &case.test {
                        self.scan_expression(test);
                    }
                    for s in &case.consequent {
                        self.scan_statement(s);
                    }
                }
            }
            Statement::TryStatement(try_stmt) => {
                self.scan_block(&try_stmt.block.body);
                if let Some(handler) = &try_stmt.handler {
                    self.scan_block(&handler.body.body);
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    self.scan_block(&finalizer.body);
                }
            }
            Statement::LabeledStatement(labeled) => self.scan_statement(&labeled.body),
            Statement::ReturnStatement(ret) => {
                if let Some(arg) = &ret.argument {
                    self.scan_expression(arg);
                }
            }
            Statement::ThrowStatement(throw) => self.scan_expression(&throw.argument),
            _ => {}
        }

        self.statement_start = previous;
    }

    fn scan_expression(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::CallExpression(call) => self.scan_call(call),
            Expression::ChainExpression(chain) => {
                if let ChainElement::CallExpression(call) = &chain.expression {
                    self.scan_call(call);
                }
            }
            Expression::NewExpression(new_expr) => {
                self.scan_expression(&new_expr.callee);
                self.scan_arguments(&new_expr.arguments);
            }
            Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_) => {
                if let Some(func) = FunctionRef::from_expression(expr) {
                    self.scan_function(func);
                }
            }
            Expression::AssignmentExpression(assign) => self.scan_expression(&assign.right),
            Expression::ConditionalExpression(cond) => {
                self.scan_expression(&cond.test);
                self.scan_expression(&cond.consequent);
                self.scan_expression(&cond.alternate);
            }
            Expression::LogicalExpression(logical) => {
                self.scan_expression(&logical.left);
                self.scan_expression(&logical.right);
            }
            Expression::BinaryExpression(binary) => {
                self.scan_expression(&binary.left);
                self.scan_expression(&binary.right);
            }
            Expression::SequenceExpression(seq) => {
                for e in &seq.expressions {
                    self.scan_expression(e);
                }
            }
            Expression::AwaitExpression(await_expr) => self.scan_expression(&await_expr.argument),
            Expression::UnaryExpression(unary) => self.scan_expression(&unary.argument),
            Expression::ParenthesizedExpression(paren) => self.scan_expression(&paren.expression),
            Expression::TSAsExpression(cast) => self.scan_expression(&cast.expression),
            Expression::TSNonNullExpression(cast) => self.scan_expression(&cast.expression),
            Expression::StaticMemberExpression(member) => self.scan_expression(&member.object),
            Expression::ComputedMemberExpression(member) => {
                self.scan_expression(&member.object);
                self.scan_expression(&member.expression);
            }
            Expression::TemplateLiteral(tpl) => {
                for e in &tpl.expressions {
                    self.scan_expression(e);
                }
            }
            Expression::ObjectExpression(obj) => {
                for prop in &obj.properties {
                    match prop {
                        ObjectPropertyKind::ObjectProperty(p) => self.scan_expression(&p.value),
                        ObjectPropertyKind::SpreadProperty(s) => self.scan_expression(&s.argument),
                    }
                }
            }
            Expression::ArrayExpression(arr) => {
                for element in &arr.elements {
                    match element {
                        ArrayExpressionElement::SpreadElement(s) => self.scan_expression(&s.argument),
                        _ => {
                            if let Some(e) = element.as_expression() {
                                self.scan_expression(e);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn scan_arguments(&mut self, arguments: &[Argument<'_>]) {
        for arg in arguments {
            match arg {
                Argument::SpreadElement(spread) => self.scan_expression(&spread.argument),
                _ => {
                    if let Some(expr) = arg.as_expression() {
                        self.scan_expression(expr);
                    }
                }
            }
        }
    }

    fn scan_call(&mut self, call: &CallExpression<'_>) {
        self.record_emit(call);
        self.scan_expression(&call.callee);
        self.scan_arguments(&call.arguments);
    }

    fn record_emit(&mut self, call: &CallExpression<'_>) {
        let Expression::StaticMemberExpression(member) = &call.callee else {
            return;
        };
        if !matches!(member.property.name.as_str(), "$emit" | "emit") {
            return;
        }
        let Some(first) = call.arguments.first().and_then(|arg| arg.as_expression()) else {
            return;
        };

        let doc = self.call_doc(call.span.start);
        if doc.hidden {
            return;
        }
        let resolved = self.resolver.resolve(first);
        let name = match &doc.event {
            Some(event) => event.clone(),
            None => resolved
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| resolved.raw.clone()),
        };

        let arguments = call
            .arguments
            .iter()
            .skip(1)
            .enumerate()
            .filter_map(|(index, arg)| self.describe_argument(arg, index, &doc))
            .collect();

        tracing::debug!(event = %name, "found emitted event");
        self.events.push(EventEntry {
            member: doc.member(&name),
            arguments,
        });
    }

    fn describe_argument(
        &self,
        arg: &Argument<'_>,
        index: usize,
        doc: &DocComment,
    ) -> Option<Parameter> {
        let (expr, rest) = match arg {
            Argument::SpreadElement(spread) => (&spread.argument, true),
            _ => (arg.as_expression()?, false),
        };
        let mut param = match doc.param_for(None, index) {
            Some(documented) => documented.clone(),
            None => {
                let mut param = Parameter::new(self.resolver.text(expr.span()));
                param.kind = TypeName::Single(self.resolver.resolve(expr).kind.as_str().to_string());
                param
            }
        };
        param.rest |= rest;
        Some(param)
    }

    /// Comment directly before the call, or before its enclosing statement.
    fn call_doc(&self, call_start: u32) -> DocComment {
        let source = self.resolver.source();
        leading_comment(source, call_start as usize)
            .or_else(|| {
                if self.statement_start != call_start {
                    leading_comment(source, self.statement_start as usize)
                } else {
                    None
                }
            })
            .map(|body| DocComment::parse(&body))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    /// Scans every top-level function declaration in `code`.
    fn scan(code: &str) -> Vec<EventEntry> {
        let allocator = Allocator::default();
        let source_type = SourceType::default().with_module(true);
        let ret = Parser::new(&allocator, code, source_type).parse();
        let mut resolver = ScopeResolver::new(code);
        let mut events = Vec::new();
        for stmt in &ret.program.body {
            if let Statement::FunctionDeclaration(func) = stmt {
                let mut scanner = EventScanner::new(&mut resolver);
                scanner.scan_function(FunctionRef::Function(func));
                events.extend(scanner.into_events());
            } else {
                resolver.declare_statement(stmt);
            }
        }
        events
    }

    fn names(events: &[EventEntry]) -> Vec<&str> {
        events.iter().map(|e| e.member.name.as_str()).collect()
    }

    #[test]
    fn test_literal_event_name() {
        let events = scan("function f() { this.$emit('input', 1) }");
        assert_eq!(names(&events), vec!["input"]);
        assert!(events[0].arguments[0].kind.is("number"));
        assert_eq!(events[0].arguments[0].name, "1");
    }

    #[test]
    fn test_name_through_aliases_and_members() {
        let events = scan(
            "const EVENTS = { save: 'saved' };\nfunction f() { const a = EVENTS.save; let b = a; this.$emit(b) }",
        );
        assert_eq!(names(&events), vec!["saved"]);
    }

    #[test]
    fn test_unresolved_name_is_used_verbatim() {
        let events = scan("function f() { const n = ppname; this.$emit(n) }");
        assert_eq!(names(&events), vec!["ppname"]);
    }

    #[test]
    fn test_nested_control_flow() {
        let events = scan(
            r#"function f(x) {
                if (x) { this.$emit('a') } else if (!x) { this.$emit('b') } else { this.$emit('c') }
                for (let i = 0; i < 1; i++) { this.$emit('d') }
                for (const k in x) { this.$emit('e') }
                for (const k of x) { this.$emit('f') }
                while (x) { this.$emit('g') }
                do { this.$emit('h') } while (x)
                switch (x) { case 1: this.$emit('i'); break; default: this.$emit('j') }
                try { this.$emit('k') } catch (e) { this.$emit('l') } finally { this.$emit('m') }
            }"#,
        );
        assert_eq!(
            names(&events),
            vec!["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m"]
        );
    }

    #[test]
    fn test_callback_receiver_and_comment() {
        let events = scan(
            r#"function beforeRouteEnter(to, from, next) {
                next((vm) => {
                    /**
                     * Emitted on enter
                     * @param {string} path - target path
                     */
                    vm.$emit('entered', to.path)
                })
            }"#,
        );
        assert_eq!(names(&events), vec!["entered"]);
        assert_eq!(events[0].member.description.as_deref(), Some("Emitted on enter"));
        assert_eq!(events[0].arguments[0].name, "path");
        assert!(events[0].arguments[0].kind.is("string"));
    }

    #[test]
    fn test_event_tag_overrides_name() {
        let events = scan("function f() {\n  // @event renamed\n  this.$emit(dynamicName)\n}");
        assert_eq!(names(&events), vec!["renamed"]);
    }

    #[test]
    fn test_bare_emit_reference_is_ignored() {
        let events = scan("function f() { const e = this.$emit; this.$emit }");
        assert!(events.is_empty());
    }

    #[test]
    fn test_spread_argument_is_rest() {
        let events = scan("function f(args) { this.$emit('many', ...args) }");
        assert!(events[0].arguments[0].rest);
    }
}
