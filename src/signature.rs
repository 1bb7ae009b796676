//! Signature inference
//!
//! Derives the ordered dependency names of a [`Callable`]:
//!
//! 1. explicit names from [`Callable::inject`], returned verbatim
//! 2. `function name(a, b)` declarations
//! 3. `class X { constructor(a, b) { … } }` declarations
//! 4. arrow forms `(a, b) => …` and `a => …`
//!
//! Anything else is a [`DeinError::SignatureParse`]. This is a best-effort
//! heuristic over conventional parameter lists: default values,
//! destructuring, rest parameters and comments containing parentheses are
//! not understood. Neither is an arrow wrapped in parentheses: `(a => a)`
//! reads as the single parameter `a=>a`. Parameter lists may span several
//! lines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::callable::Callable;
use crate::config::{ClassWithoutConstructor, DeinConfig};
use crate::error::{DeinError, Result};

// ============================================================================
// LAZY REGEX PATTERNS (compiled once)
// ============================================================================

/// Parameter list after `function [*][name]` (list may span lines)
static FUNCTION_PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^function[\s*]*[\w$]*\s*\(([^)]*)\)").unwrap());

/// Parameter list of a class `constructor`
static CONSTRUCTOR_PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bconstructor\s*\(([^)]*)\)").unwrap());

/// A single bare identifier
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap());

/// Recognized shape of a callable's source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureShape {
    Function,
    Class,
    Arrow,
}

/// Infers dependency names under a given [`DeinConfig`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureInferer {
    class_without_constructor: ClassWithoutConstructor,
}

impl SignatureInferer {
    pub fn new(config: &DeinConfig) -> Self {
        Self {
            class_without_constructor: config.class_without_constructor,
        }
    }

    /// Ordered dependency names of `callable`
    pub fn infer(&self, callable: &Callable) -> Result<Vec<String>> {
        if let Some(names) = callable.injected() {
            return Ok(names.to_vec());
        }
        match callable.source() {
            Some(source) => self.infer_source(source),
            None => Err(DeinError::signature(
                "no source text and no injected names",
                "<anonymous>",
            )),
        }
    }

    /// Ordered parameter names found in `source`
    pub fn infer_source(&self, source: &str) -> Result<Vec<String>> {
        let text = strip_async(source.trim_start());

        match shape_of(text) {
            Some(SignatureShape::Function) => FUNCTION_PARAMS
                .captures(text)
                .map(|caps| split_params(&caps[1]))
                .ok_or_else(|| DeinError::signature("function without parameter list", source)),

            Some(SignatureShape::Class) => match CONSTRUCTOR_PARAMS.captures(text) {
                Some(caps) => Ok(split_params(&caps[1])),
                None => match self.class_without_constructor {
                    ClassWithoutConstructor::ZeroDependencies => Ok(Vec::new()),
                    ClassWithoutConstructor::Reject => {
                        Err(DeinError::signature("class without constructor", source))
                    }
                },
            },

            Some(SignatureShape::Arrow) => arrow_params(text)
                .ok_or_else(|| DeinError::signature("unrecognized arrow parameters", source)),

            None => Err(DeinError::signature("unexpected callable", source)),
        }
    }
}

/// Infer with the default configuration
pub fn infer_parameters(callable: &Callable) -> Result<Vec<String>> {
    SignatureInferer::default().infer(callable)
}

/// Shape of `text`, checked in priority order: function, class, arrow
pub fn shape_of(text: &str) -> Option<SignatureShape> {
    let text = strip_async(text.trim_start());

    if let Some(rest) = text.strip_prefix("function") {
        if rest.starts_with(|c: char| c.is_whitespace() || c == '(' || c == '*') {
            return Some(SignatureShape::Function);
        }
    }
    if let Some(rest) = text.strip_prefix("class") {
        if rest.starts_with(char::is_whitespace) {
            return Some(SignatureShape::Class);
        }
    }
    if text.contains("=>") {
        return Some(SignatureShape::Arrow);
    }
    None
}

fn strip_async(text: &str) -> &str {
    match text.strip_prefix("async") {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => text,
    }
}

fn arrow_params(text: &str) -> Option<Vec<String>> {
    if let Some(rest) = text.strip_prefix('(') {
        let close = rest.find(')')?;
        let list: String = rest[..close].chars().filter(|c| !c.is_whitespace()).collect();
        return Some(split_params(&list));
    }

    let (head, _) = text.split_once("=>")?;
    let name = head.trim();
    IDENTIFIER.is_match(name).then(|| vec![name.to_string()])
}

/// Split on commas, trim, drop empty segments
fn split_params(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn infer(source: &str) -> Result<Vec<String>> {
        SignatureInferer::default().infer_source(source)
    }

    // ─────────────────────────────────────────────────────────────
    // function declarations
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn simple_function() {
        assert_eq!(infer("function fun(a, b, c) { return a + b + c; }").unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn multiline_function() {
        let source = "function functionWithArgumentsSpanningMultipleLines(\n      first,\n      second,\n      third) {\n  return first + second + third;\n}";
        assert_eq!(infer(source).unwrap(), ["first", "second", "third"]);
    }

    #[test]
    fn zero_parameter_function() {
        assert!(infer("function hello() { return 'world'; }").unwrap().is_empty());
    }

    #[test]
    fn anonymous_and_generator_functions() {
        assert_eq!(infer("function (a) { return a; }").unwrap(), ["a"]);
        assert_eq!(infer("function(a, b) {}").unwrap(), ["a", "b"]);
        assert_eq!(infer("function* gen(seed) { yield seed; }").unwrap(), ["seed"]);
        assert_eq!(infer("async function load(db) { return db; }").unwrap(), ["db"]);
    }

    #[test]
    fn function_with_inner_arrow() {
        let source = "function fun(a, b, c) {\n  const arrow = (x, y) => x + y;\n  return arrow(arrow(a, b), c);\n}";
        assert_eq!(infer(source).unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn one_line_function_with_inline_call() {
        assert_eq!(infer("function fun(a) { return a(true); }").unwrap(), ["a"]);
    }

    #[test]
    fn function_prefix_is_not_enough() {
        assert!(infer("functional(a)").is_err());
    }

    // ─────────────────────────────────────────────────────────────
    // classes
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn class_constructor() {
        let source = "class Class { constructor(a, b) { this.dependencies = { a, b }; } }";
        assert_eq!(infer(source).unwrap(), ["a", "b"]);
    }

    #[test]
    fn class_without_constructor_rejected_by_default() {
        let err = infer("class Empty { run() { return 1; } }").unwrap_err();
        assert!(matches!(err, DeinError::SignatureParse { ref reason, .. } if reason.contains("constructor")));
    }

    #[test]
    fn class_without_constructor_as_zero_dependencies() {
        let config = DeinConfig {
            class_without_constructor: ClassWithoutConstructor::ZeroDependencies,
        };
        let inferer = SignatureInferer::new(&config);
        assert!(inferer.infer_source("class Empty {}").unwrap().is_empty());
    }

    // ─────────────────────────────────────────────────────────────
    // arrows
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn bracket_arrow() {
        assert_eq!(infer("(a, b, c) => a + b + c").unwrap(), ["a", "b", "c"]);
        assert_eq!(infer("(salutation,\n name) => `${salutation} ${name}.`").unwrap(), ["salutation", "name"]);
    }

    #[test]
    fn empty_arrow() {
        assert!(infer("() => true").unwrap().is_empty());
    }

    #[test]
    fn bare_arrow() {
        assert_eq!(infer("name => `Hello ${name}.`").unwrap(), ["name"]);
        assert_eq!(infer("b=>b").unwrap(), ["b"]);
        assert_eq!(infer("async conn => conn.ping()").unwrap(), ["conn"]);
    }

    #[test]
    fn arrow_with_garbage_head() {
        assert!(infer("a + b => c").is_err());
    }

    #[test]
    fn parenthesized_arrow_is_taken_literally() {
        assert_eq!(infer("(a => a)").unwrap(), ["a=>a"]);
    }

    // ─────────────────────────────────────────────────────────────
    // fallbacks
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn unexpected_source() {
        let err = infer("42").unwrap_err();
        assert_eq!(err.to_string(), "Could not parse signature (unexpected callable): 42");
    }

    #[test]
    fn injected_names_skip_text() {
        let callable = Callable::from_fn(|_| Ok::<_, DeinError>(()))
            .with_source("this is not parseable")
            .inject(["dependencyA", "dependencyB"]);
        assert_eq!(infer_parameters(&callable).unwrap(), ["dependencyA", "dependencyB"]);
    }

    #[test]
    fn callable_without_metadata_is_rejected() {
        let callable = Callable::from_fn(|_| Ok::<_, DeinError>(()));
        assert!(matches!(
            infer_parameters(&callable),
            Err(DeinError::SignatureParse { .. })
        ));
    }

    #[test]
    fn shapes() {
        assert_eq!(shape_of("  function f() {}"), Some(SignatureShape::Function));
        assert_eq!(shape_of("class A {}"), Some(SignatureShape::Class));
        assert_eq!(shape_of("x => x"), Some(SignatureShape::Arrow));
        assert_eq!(shape_of("classic"), None);
    }
}
