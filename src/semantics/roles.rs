//! Role classification: an ordered decision tree, first match wins

use regex::Regex;
use std::sync::LazyLock;

use super::models::Role;
use crate::language::is_test_path;
use crate::scanning::models::{file_stem, ClassDef, FileSyntax};

const ENTRY_POINT_DECORATORS: &[&str] = &[
    "click.command",
    "click.group",
    "app.command",
    "typer.command",
    "main",
];

const INTERFACE_BASES: &[&str] = &["ABC", "Protocol", "ABCMeta"];
const ABSTRACT_DECORATORS: &[&str] = &["abstractmethod", "abstractproperty"];

const EXCEPTION_BASES: &[&str] = &["Exception", "BaseException", "Error", "Warning"];

const MODEL_MARKERS: &[&str] = &[
    "dataclass",
    "BaseModel",
    "Model",
    "Schema",
    "NamedTuple",
    "TypedDict",
];

/// Import sources of argument-parsing libraries
const CLI_IMPORTS: &[&str] = &[
    "argparse",
    "click",
    "typer",
    "clap",
    "structopt",
    "github.com/spf13/cobra",
    "flag",
    "commander",
    "yargs",
    "optparse",
    "thor",
    "picocli",
];

const SERVICE_BASES: &[&str] = &[
    "BaseHTTPRequestHandler",
    "HTTPServer",
    "View",
    "APIView",
    "Resource",
    "Handler",
    "Controller",
    "Router",
];

const HTTP_DECORATORS: &[&str] = &["route", "get", "post", "put", "delete", "patch"];

static UPPER_SNAKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap());

static MIGRATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|/)migrations?/|alembic/versions|(^|/)\d{4}_\w+\.py$").unwrap()
});

/// Classify a file by structure and path
pub fn classify_role(syntax: &FileSyntax) -> Role {
    let path = syntax.path.to_lowercase().replace('\\', "/");

    if is_test_path(&path) {
        Role::Test
    } else if syntax.has_main_guard || has_entry_decorators(syntax) {
        Role::EntryPoint
    } else if is_interface(syntax) {
        Role::Interface
    } else if is_constants(syntax) {
        Role::Constant
    } else if is_exception_module(syntax) {
        Role::Exception
    } else if is_model_module(syntax) {
        Role::Model
    } else if is_cli(syntax) {
        Role::Cli
    } else if is_http_service(syntax) {
        Role::Service
    } else if MIGRATION_RE.is_match(&path) {
        Role::Migration
    } else if has_stateful_classes(syntax) {
        Role::Service
    } else if !syntax.functions.is_empty() && syntax.classes.is_empty() {
        Role::Utility
    } else if is_config(syntax, &path) {
        Role::Config
    } else {
        Role::Unknown
    }
}

/// Last segment of a dotted / scoped name: `models.Model` -> `Model`
fn simple_name(name: &str) -> &str {
    name.rsplit(['.', ':']).next().unwrap_or(name)
}

fn all_decorators(syntax: &FileSyntax) -> impl Iterator<Item = &str> {
    syntax
        .functions
        .iter()
        .flat_map(|f| f.decorators.iter().map(String::as_str))
}

fn has_entry_decorators(syntax: &FileSyntax) -> bool {
    all_decorators(syntax)
        .any(|d| ENTRY_POINT_DECORATORS.contains(&d) || d.to_lowercase().contains("main"))
}

fn is_abstract_class(class: &ClassDef) -> bool {
    class.is_abstract
        || class
            .bases
            .iter()
            .any(|b| INTERFACE_BASES.contains(&simple_name(b)))
        || class.methods.iter().any(|m| {
            m.decorators
                .iter()
                .any(|d| ABSTRACT_DECORATORS.contains(&simple_name(d)))
        })
}

/// Every declared class is abstract
fn is_interface(syntax: &FileSyntax) -> bool {
    !syntax.classes.is_empty() && syntax.classes.iter().all(is_abstract_class)
}

/// Only UPPER_SNAKE definitions
fn is_constants(syntax: &FileSyntax) -> bool {
    let mut names = syntax.defined_names().peekable();
    names.peek().is_some() && names.all(|n| UPPER_SNAKE_RE.is_match(n))
}

fn is_exception_class(class: &ClassDef) -> bool {
    let named = |n: &str| n.contains("Error") || n.contains("Exception");
    class.bases.iter().any(|b| {
        let base = simple_name(b);
        EXCEPTION_BASES.contains(&base) || named(base)
    })
}

fn is_exception_module(syntax: &FileSyntax) -> bool {
    let count = syntax.classes.iter().filter(|c| is_exception_class(c)).count();
    !syntax.classes.is_empty() && count * 2 > syntax.classes.len()
}

fn is_model_class(class: &ClassDef) -> bool {
    let marked = class
        .bases
        .iter()
        .chain(&class.decorators)
        .any(|b| MODEL_MARKERS.iter().any(|m| b.contains(m)));
    let field_heavy = class.fields.len() > 3 && class.methods.len() <= class.fields.len();
    marked || field_heavy
}

fn is_model_module(syntax: &FileSyntax) -> bool {
    let count = syntax.classes.iter().filter(|c| is_model_class(c)).count();
    !syntax.classes.is_empty() && count * 2 > syntax.classes.len()
}

fn is_cli(syntax: &FileSyntax) -> bool {
    let cli_import = syntax.imports.iter().any(|i| {
        let root = i.source.split(['.', '/', ':']).next().unwrap_or("");
        CLI_IMPORTS.contains(&i.source.as_str()) || CLI_IMPORTS.contains(&root)
    });
    cli_import
        || all_decorators(syntax).any(|d| {
            let d = d.to_lowercase();
            d.contains("command") || d.contains("cli")
        })
}

fn is_http_service(syntax: &FileSyntax) -> bool {
    let handler_base = syntax.classes.iter().any(|c| {
        c.bases.iter().any(|b| {
            let base = simple_name(b);
            SERVICE_BASES.contains(&base) || base.contains("Handler") || base.contains("View")
        })
    });
    handler_base
        || all_decorators(syntax).any(|d| HTTP_DECORATORS.contains(&simple_name(d).to_lowercase().as_str()))
}

/// Classes with public, non-dunder methods
fn has_stateful_classes(syntax: &FileSyntax) -> bool {
    syntax
        .classes
        .iter()
        .any(|c| c.methods.iter().any(|m| !m.name.starts_with("__")))
}

fn is_config(syntax: &FileSyntax, path: &str) -> bool {
    if path.ends_with("__init__.py") {
        return true;
    }
    if !syntax.imports.is_empty() && syntax.functions.is_empty() && syntax.classes.is_empty() {
        return true;
    }
    let stem = file_stem(path);
    ["config", "settings", "conf"].iter().any(|p| stem.contains(p))
}
