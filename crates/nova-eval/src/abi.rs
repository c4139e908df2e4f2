//! Names the Kotlin/JVM compiler gives to synthesized locals and fields.
//!
//! Captured variables, receivers and inlined code are only recognizable in a
//! suspended frame through these conventions.

use std::sync::OnceLock;

use nova_jdwp::LocalVariable;
use regex::Regex;

/// Prefix of fields holding captured variables on closure objects.
pub const CAPTURED_PREFIX: &str = "$";
/// Outer `this` captured into an inner class or lambda.
pub const CAPTURED_THIS_FIELD: &str = "this$0";
/// Extension receiver captured into a lambda (old backend).
pub const CAPTURED_RECEIVER_FIELD: &str = "receiver$0";
pub const LABELED_THIS_FIELD: &str = "this_";
pub const LABELED_THIS_PARAMETER: &str = "$this$";
pub const RECEIVER_PARAMETER_NAME: &str = "$receiver";
/// `this` passed explicitly into interface `DefaultImpls` methods.
pub const THIS_IN_DEFAULT_IMPLS: &str = "$this";
pub const LOCAL_FUNCTION_VARIABLE_PREFIX: &str = "$fun$";
pub const DEFAULT_IMPLS_SUFFIX: &str = "$DefaultImpls";
/// How the `this` of an inlined lambda's declaration site is spelled as a local.
pub const INLINE_DECLARATION_SITE_THIS: &str = "this_$iv";
/// Appended once per inlining level to locals of inlined function bodies.
pub const INLINE_FUN_VAR_SUFFIX: &str = "$iv";
/// Appended to captured fields of objects regenerated during inlining.
pub const INLINE_TRANSFORMATION_SUFFIX: &str = "$inlined";
/// Marker local opened at the start of an inlined function body.
pub const LOCAL_VARIABLE_NAME_PREFIX_INLINE_FUNCTION: &str = "$i$f$";
/// Marker local opened at the start of an inlined lambda argument.
pub const LOCAL_VARIABLE_NAME_PREFIX_INLINE_ARGUMENT: &str = "$i$a$";
pub const CONTEXT_RECEIVER_PREFIX: &str = "$context_receiver";
pub const OLD_CONTEXT_RECEIVER_PREFIX: &str = "_context_receiver";
pub const CONTINUATION_VARIABLE_NAME: &str = "$continuation";
pub const SUSPEND_FUNCTION_COMPLETION_PARAMETER_NAME: &str = "$completion";
/// Special name the debugger shows for the receiver.
pub const SPECIAL_THIS_NAME: &str = "<this>";

pub fn captured_field_name(name: &str) -> String {
    format!("{CAPTURED_PREFIX}{name}")
}

/// Name the IR backend uses for synthetic locals aliasing a captured variable.
pub fn synthesized_name(name: &str) -> String {
    format!("${name}")
}

/// Name of the parameter or field carrying the receiver labeled `label`.
///
/// Labels that are not valid identifiers (anonymous functions, special names)
/// fall back to `default_name`.
pub fn labeled_this_name(label: &str, prefix: &str, default_name: &str) -> String {
    if !is_valid_identifier(label) {
        return default_name.to_string();
    }
    format!("{prefix}{}", mangle_name_if_needed(label))
}

fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('<')
        && !name
            .chars()
            .any(|c| matches!(c, '.' | ';' | '[' | ']' | '/' | '<' | '>' | ':' | '\\'))
}

fn is_java_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Replaces characters that are not legal in JVM identifiers with `_<hex>`.
pub fn mangle_name_if_needed(name: &str) -> String {
    if name.chars().all(is_java_identifier_part) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 8);
    for c in name.chars() {
        if is_java_identifier_part(c) {
            out.push(c);
        } else {
            out.push('_');
            out.push_str(&format!("{:x}", c as u32));
        }
    }
    out
}

/// Number of trailing [`INLINE_FUN_VAR_SUFFIX`] repetitions.
pub fn inline_depth_of_name(name: &str) -> usize {
    let mut rest = name;
    let mut depth = 0;
    while let Some(stripped) = rest.strip_suffix(INLINE_FUN_VAR_SUFFIX) {
        depth += 1;
        rest = stripped;
    }
    depth
}

/// `name` without any of its trailing inline suffixes.
pub fn strip_inline_suffixes(name: &str) -> &str {
    let mut rest = name;
    while let Some(stripped) = rest.strip_suffix(INLINE_FUN_VAR_SUFFIX) {
        rest = stripped;
    }
    rest
}

/// Inline depth of the current location, derived from the visible locals.
///
/// The most recently declared local decides: an inline-suffixed name gives its
/// depth, an inline-lambda marker means we are back in the caller (depth 0).
/// Without either, every open inline-function marker counts as one level.
pub fn inline_depth(variables: &[LocalVariable]) -> usize {
    let raw_inline_fun_depth = variables
        .iter()
        .filter(|v| v.name.starts_with(LOCAL_VARIABLE_NAME_PREFIX_INLINE_FUNCTION))
        .count();

    let mut newest_first: Vec<&LocalVariable> = variables.iter().collect();
    newest_first.sort_by(|a, b| b.slot.cmp(&a.slot));

    for variable in newest_first {
        let depth = inline_depth_of_name(&variable.name);
        if depth > 0 {
            return depth;
        }
        if variable
            .name
            .starts_with(LOCAL_VARIABLE_NAME_PREFIX_INLINE_ARGUMENT)
        {
            return 0;
        }
    }

    raw_inline_fun_depth
}

fn inlined_this_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            "^{}(?:{})*$",
            regex::escape(INLINE_DECLARATION_SITE_THIS),
            regex::escape(INLINE_FUN_VAR_SUFFIX)
        );
        Regex::new(&pattern).expect("inlined-this regex should compile")
    })
}

/// `this` of an inlined lambda's declaration site, at any inline depth.
pub fn is_inlined_this(name: &str) -> bool {
    inlined_this_regex().is_match(name)
}

/// Matcher for a captured field that may carry the inline-transformation suffix.
pub fn captured_variable_name_regex(captured_name: &str) -> Regex {
    let pattern = format!(
        "^{}(?:{})?$",
        regex::escape(captured_name),
        regex::escape(INLINE_TRANSFORMATION_SUFFIX)
    );
    Regex::new(&pattern).expect("escaped captured-name regex should compile")
}

/// Fields through which an enclosing receiver was captured.
pub fn is_captured_receiver_field_name(name: &str) -> bool {
    name.starts_with(&captured_field_name(LABELED_THIS_FIELD)) || name == CAPTURED_RECEIVER_FIELD
}

/// Locals that hold a receiver or an explicitly passed `this`.
pub fn is_receiver_or_passed_this(name: &str) -> bool {
    name.starts_with(LABELED_THIS_PARAMETER)
        || name == RECEIVER_PARAMETER_NAME
        || name == THIS_IN_DEFAULT_IMPLS
        || is_inlined_this(name)
        || name == SPECIAL_THIS_NAME
}
