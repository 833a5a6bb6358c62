use crate::entry::{Parameter, TypeName};
use crate::jsdoc::DocComment;
use crate::scope::{binding_names, ScopeResolver};
use oxc_allocator::Vec as ArenaVec;
use oxc_ast::ast::{
    ArrowFunctionExpression, BindingPattern, Expression, FormalParameters, Function, Statement,
};
use oxc_span::GetSpan;

/// A function-valued node: `function` expressions, declarations, method
/// shorthands and arrows.
#[derive(Clone, Copy)]
pub enum FunctionRef<'b, 'a> {
    Function(&'b Function<'a>),
    Arrow(&'b ArrowFunctionExpression<'a>),
}

impl<'b, 'a> FunctionRef<'b, 'a> {
    pub fn from_expression(expr: &'b Expression<'a>) -> Option<Self> {
        match expr {
            Expression::FunctionExpression(func) => Some(FunctionRef::Function(func)),
            Expression::ArrowFunctionExpression(arrow) => Some(FunctionRef::Arrow(arrow)),
            Expression::ParenthesizedExpression(paren) => Self::from_expression(&paren.expression),
            _ => None,
        }
    }

    pub fn params(&self) -> &'b FormalParameters<'a> {
        match *self {
            FunctionRef::Function(func) => &func.params,
            FunctionRef::Arrow(arrow) => &arrow.params,
        }
    }

    pub fn statements(&self) -> Option<&'b ArenaVec<'a, Statement<'a>>> {
        match *self {
            FunctionRef::Function(func) => func.body.as_ref().map(|body| &body.statements),
            FunctionRef::Arrow(arrow) => Some(&arrow.body.statements),
        }
    }

    /// The returned expression when the whole body is one `return` (or an
    /// arrow expression body).
    pub fn single_return(&self) -> Option<&'b Expression<'a>> {
        let statements = self.statements()?;
        if statements.len() != 1 {
            return None;
        }
        match &statements[0] {
            Statement::ReturnStatement(ret) => ret.argument.as_ref(),
            Statement::ExpressionStatement(expr_stmt) if self.is_expression_body() => {
                Some(&expr_stmt.expression)
            }
            _ => None,
        }
    }

    pub fn is_expression_body(&self) -> bool {
        matches!(self, FunctionRef::Arrow(arrow) if arrow.expression)
    }

    /// Binds every parameter as an unknown value in the current frame.
    pub fn declare_params(&self, resolver: &mut ScopeResolver<'_>) {
        let params = self.params();
        for item in &params.items {
            resolver.declare_opaque(&item.pattern);
        }
        if let Some(rest) = &params.rest {
            resolver.declare_opaque(&rest.rest.argument);
        }
    }

    /// Declared parameters merged with their `@param` documentation. Nested
    /// documented paths follow their owner as siblings. An undocumented
    /// destructured parameter expands to one `unknown` entry per bound name.
    pub fn describe_params(&self, resolver: &ScopeResolver<'_>, doc: &DocComment) -> Vec<Parameter> {
        let mut params = Vec::new();
        let formal = self.params();

        for (index, item) in formal.items.iter().enumerate() {
            let (target, default) = match &item.pattern {
                BindingPattern::AssignmentPattern(assign) => (&assign.left, Some(&assign.right)),
                pattern => (pattern, None),
            };
            let declared = pattern_name(target);

            let mut param = match (doc.param_for(declared.as_deref(), index), &declared) {
                (Some(documented), _) => documented.clone(),
                (None, Some(name)) => {
                    let mut param = Parameter::new(name);
                    if let Some(default) = default {
                        let kind = resolver.resolve(default).kind;
                        param.kind = TypeName::Single(kind.as_str().to_string());
                    }
                    param
                }
                (None, None) => {
                    params.extend(binding_names(target).iter().map(|name| Parameter::new(name)));
                    continue;
                }
            };
            match declared {
                Some(name) => param.name = name,
                None if param.name.is_empty() => param.name = resolver.text(target.span()).to_string(),
                None => {}
            }
            if let Some(default) = default {
                if param.default_value.is_none() {
                    param.default_value = Some(resolver.text(default.span()).to_string());
                }
            }
            let nested = doc.nested_params_of(&param.name);
            params.push(param);
            params.extend(nested);
        }

        if let Some(rest) = &formal.rest {
            let declared = pattern_name(&rest.rest.argument);
            let mut param = match doc.param_for(declared.as_deref(), formal.items.len()) {
                Some(documented) => documented.clone(),
                None => Parameter::new(""),
            };
            param.name = match declared {
                Some(name) => name,
                None if param.name.is_empty() => resolver.text(rest.rest.argument.span()).to_string(),
                None => param.name,
            };
            param.rest = true;
            let nested = doc.nested_params_of(&param.name);
            params.push(param);
            params.extend(nested);
        }
        params
    }
}

/// Name of a simple (possibly defaulted) parameter; `None` when destructured.
fn pattern_name(pattern: &BindingPattern<'_>) -> Option<String> {
    match pattern {
        BindingPattern::BindingIdentifier(id) => Some(id.name.to_string()),
        BindingPattern::AssignmentPattern(assign) => pattern_name(&assign.left),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    /// Parameters of the first function declared in `code`, documented by `doc`.
    fn describe(code: &str, doc: &str) -> Vec<Parameter> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, code, SourceType::default().with_module(true)).parse();
        let resolver = ScopeResolver::new(code);
        let doc = DocComment::parse(doc);
        for stmt in &ret.program.body {
            if let Statement::FunctionDeclaration(func) = stmt {
                return FunctionRef::Function(func).describe_params(&resolver, &doc);
            }
        }
        panic!("no function in `{}`", code);
    }

    fn summary(params: &[Parameter]) -> Vec<(&str, String, Option<&str>, bool)> {
        params
            .iter()
            .map(|p| (p.name.as_str(), p.kind.display(), p.default_value.as_deref(), p.rest))
            .collect()
    }

    #[test]
    fn test_defaults_are_typed_from_their_value() {
        let params = describe("function f(a = 1, b = 'x', c = -2.5, d = someVar, e = () => 0) {}", "");
        assert_eq!(
            summary(&params),
            vec![
                ("a", "number".to_string(), Some("1"), false),
                ("b", "string".to_string(), Some("'x'"), false),
                ("c", "number".to_string(), Some("-2.5"), false),
                ("d", "unknown".to_string(), Some("someVar"), false),
                ("e", "function".to_string(), Some("() => 0"), false),
            ]
        );
    }

    #[test]
    fn test_comment_in_parameter_list_is_not_a_rest_parameter() {
        let params = describe("function m(a /* ...legacy */) {}", "");
        assert_eq!(summary(&params), vec![("a", "unknown".to_string(), None, false)]);
    }

    #[test]
    fn test_rest_parameter_is_read_from_the_syntax_tree() {
        let params = describe("function m(first, ...others) {}", "@param {number} first\n@param {string[]} others");
        assert_eq!(params.len(), 2);
        assert_eq!(params[1].name, "others");
        assert!(params[1].rest);
        assert!(params[1].kind.is("string[]"));
    }

    #[test]
    fn test_undocumented_destructuring_expands_to_unknown_entries() {
        let params = describe("function b({ first, second: [third] } = {}, ...rest) {}", "");
        assert_eq!(
            summary(&params),
            vec![
                ("first", "unknown".to_string(), None, false),
                ("third", "unknown".to_string(), None, false),
                ("rest", "unknown".to_string(), None, true),
            ]
        );
    }

    #[test]
    fn test_documented_destructuring_keeps_the_documented_name() {
        let params = describe(
            "function b({ name } = {}) {}",
            "@param {Object} options - Settings\n@param {string} options.name - Label",
        );
        assert_eq!(params[0].name, "options");
        assert!(params[0].kind.is("object"));
        assert_eq!(params[0].default_value.as_deref(), Some("{}"));
        assert_eq!(params[1].name, "options.name");
    }
}
