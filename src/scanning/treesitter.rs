// Tree-sitter scanner
//
// Walks a concrete syntax tree once and collects functions, classes, imports
// and the main guard. Node kinds differ per grammar; the tables below map them
// onto one model.

use anyhow::{anyhow, Result};
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::{Node, Parser};

use super::models::{ClassDef, FileSyntax, FunctionDef, ImportDecl};
use super::{content_hash, count_todo_markers, line_count};
use crate::language::{get_tree_sitter_language, language_family};

static MAIN_GUARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"__name__\s*==\s*["']__main__["']"#).unwrap());
static PURE_VIRTUAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"=\s*0\s*;?\s*$").unwrap());

/// Node kinds that hold a function or class body
const BODY_KINDS: &[&str] = &[
    "block",
    "compound_statement",
    "statement_block",
    "declaration_list",
    "field_declaration_list",
    "body_statement",
    "class_body",
    "interface_body",
    "enum_body",
    "constructor_body",
];

/// Control-flow nodes that add a nesting level
const NESTING_KINDS: &[&str] = &[
    // C-family, Java, JS/TS, Python, Go
    "if_statement",
    "for_statement",
    "for_range_loop",
    "for_in_statement",
    "enhanced_for_statement",
    "while_statement",
    "do_statement",
    "try_statement",
    "with_statement",
    "match_statement",
    "switch_statement",
    "switch_expression",
    "expression_switch_statement",
    "type_switch_statement",
    "select_statement",
    // Rust
    "if_expression",
    "while_expression",
    "loop_expression",
    "for_expression",
    "match_expression",
    // Ruby
    "if",
    "unless",
    "while",
    "until",
    "for",
    "case",
];

const IF_KINDS: &[&str] = &["if_statement", "if_expression", "if"];

const CALL_KINDS: &[&str] = &["call", "call_expression", "method_invocation"];

fn function_kinds(family: &str) -> &'static [&'static str] {
    match family {
        "python" => &["function_definition"],
        "go" => &["function_declaration", "method_declaration"],
        "typescript" | "javascript" => &[
            "function_declaration",
            "generator_function_declaration",
            "method_definition",
            "arrow_function",
            "function_expression",
        ],
        "java" => &["method_declaration", "constructor_declaration"],
        "rust" => &["function_item"],
        "ruby" => &["method", "singleton_method"],
        "c" | "cpp" => &["function_definition"],
        _ => &[],
    }
}

fn class_kinds(family: &str) -> &'static [&'static str] {
    match family {
        "python" => &["class_definition"],
        "go" => &["type_spec"],
        "typescript" | "javascript" => &[
            "class_declaration",
            "abstract_class_declaration",
            "interface_declaration",
        ],
        "java" => &[
            "class_declaration",
            "interface_declaration",
            "enum_declaration",
            "record_declaration",
        ],
        "rust" => &["struct_item", "enum_item", "trait_item", "union_item"],
        "ruby" => &["class", "module"],
        "c" => &["struct_specifier", "union_specifier", "enum_specifier"],
        "cpp" => &[
            "struct_specifier",
            "union_specifier",
            "enum_specifier",
            "class_specifier",
        ],
        _ => &[],
    }
}

/// Parses files with tree-sitter and normalizes the result into [`FileSyntax`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterScanner;

impl TreeSitterScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan one file.
    ///
    /// Fails when the grammar cannot be loaded or the tree is so broken that
    /// nothing could be extracted; callers then fall back to regexes.
    pub fn scan(&self, path: &str, content: &str, language: &str) -> Result<FileSyntax> {
        let grammar = get_tree_sitter_language(language)?;
        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| anyhow!("Failed to load {} grammar: {}", language, e))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| anyhow!("Failed to parse file: {}", path))?;
        let root = tree.root_node();

        let mut walker = SyntaxWalker::new(content.as_bytes(), language_family(language));
        walker.visit(root, Context::default());

        if root.has_error()
            && walker.functions.is_empty()
            && walker.classes.is_empty()
            && walker.imports.is_empty()
            && !content.trim().is_empty()
        {
            return Err(anyhow!("Syntax errors prevented extraction: {}", path));
        }

        Ok(FileSyntax {
            path: path.to_string(),
            language: language.to_string(),
            functions: walker.functions,
            classes: walker.classes,
            imports: walker.imports,
            has_main_guard: walker.has_main_guard,
            lines: line_count(content),
            tokens: count_leaves(root),
            todo_count: count_todo_markers(content),
            content_hash: content_hash(content),
            parsed_with_fallback: false,
        })
    }
}

/// Number of leaf nodes, the tree-sitter notion of tokens
fn count_leaves(root: Node) -> usize {
    let mut count = 0;
    let mut cursor = root.walk();
    loop {
        if cursor.node().child_count() == 0 {
            count += 1;
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return count;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    /// Class whose methods are being defined
    owner: Option<usize>,
    /// Class whose fields may still be assigned (Python `self.x`, Ruby `@x`)
    field_owner: Option<usize>,
    in_function: bool,
}

struct SyntaxWalker<'a> {
    source: &'a [u8],
    family: &'a str,
    functions: Vec<FunctionDef>,
    classes: Vec<ClassDef>,
    imports: Vec<ImportDecl>,
    has_main_guard: bool,
}

impl<'a> SyntaxWalker<'a> {
    fn new(source: &'a [u8], family: &'a str) -> Self {
        Self {
            source,
            family,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            has_main_guard: false,
        }
    }

    fn text(&self, node: Node) -> String {
        node.utf8_text(self.source).unwrap_or_default().to_string()
    }

    fn visit(&mut self, node: Node, ctx: Context) {
        if !node.is_named() {
            return;
        }
        let kind = node.kind();

        if function_kinds(self.family).contains(&kind) && self.is_named_function(node) {
            self.visit_function(node, ctx);
            return;
        }

        if class_kinds(self.family).contains(&kind) && self.is_class_definition(node) {
            let idx = self.push_class(node);
            self.visit_children(
                node,
                Context {
                    owner: Some(idx),
                    field_owner: Some(idx),
                    in_function: ctx.in_function,
                },
            );
            return;
        }

        if self.family == "rust" && kind == "impl_item" {
            let owner = self.register_rust_impl(node);
            self.visit_children(
                node,
                Context {
                    owner,
                    field_owner: owner,
                    in_function: ctx.in_function,
                },
            );
            return;
        }

        self.collect_import(node);
        self.collect_field(node, ctx);

        if self.family == "python" && kind == "if_statement" && !ctx.in_function {
            if let Some(condition) = node.child_by_field_name("condition") {
                if MAIN_GUARD_RE.is_match(&self.text(condition)) {
                    self.has_main_guard = true;
                }
            }
        }

        self.visit_children(node, ctx);
    }

    fn visit_children(&mut self, node: Node, ctx: Context) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(child, ctx);
        }
    }

    // ========================================
    // Functions
    // ========================================

    /// Anonymous JS functions only count when bound to a name
    fn is_named_function(&self, node: Node) -> bool {
        match node.kind() {
            "arrow_function" | "function_expression" => node
                .parent()
                .map(|p| p.kind() == "variable_declarator")
                .unwrap_or(false),
            _ => true,
        }
    }

    fn visit_function(&mut self, node: Node, ctx: Context) {
        let name = self.function_name(node).unwrap_or_else(|| "<anonymous>".to_string());
        let body = self.function_body(node);

        let full_tokens = token_count(&self.text(node));
        let body_tokens = match body {
            Some(b) => token_count(&self.text(b)),
            None => {
                // No body node (C++ `= default`, Ruby without body_statement):
                // everything after the first line
                let text = self.text(node);
                text.split_once('\n').map(|(_, rest)| token_count(rest)).unwrap_or(0)
            }
        };
        let signature_tokens = full_tokens.saturating_sub(body_tokens).max(1);

        let nesting_root = body.unwrap_or(node);
        let mut calls = Vec::new();
        self.collect_calls(nesting_root, &mut calls);

        let function = FunctionDef {
            name: name.clone(),
            params: self.function_params(node),
            body_tokens,
            signature_tokens,
            nesting_depth: nesting_depth(nesting_root),
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            call_targets: Some(calls),
            decorators: self.decorators(node),
        };

        let is_top_level = !ctx.in_function && ctx.owner.is_none();
        if name == "main" && self.family != "python" && (is_top_level || self.family == "java") {
            self.has_main_guard = true;
        }

        let owner = ctx.owner.or_else(|| self.go_receiver_owner(node));
        if let Some(class) = owner.and_then(|idx| self.classes.get_mut(idx)) {
            class.methods.push(function.clone());
        }
        self.functions.push(function);

        // Nested definitions are functions too, but not methods
        self.visit_children(
            node,
            Context {
                owner: None,
                field_owner: ctx.field_owner,
                in_function: true,
            },
        );
    }

    fn function_name(&self, node: Node) -> Option<String> {
        match node.kind() {
            "arrow_function" | "function_expression" => node
                .parent()
                .and_then(|p| p.child_by_field_name("name"))
                .map(|n| self.text(n)),
            "function_definition" if matches!(self.family, "c" | "cpp") => node
                .child_by_field_name("declarator")
                .and_then(|d| self.declarator_name(d)),
            _ => node.child_by_field_name("name").map(|n| self.text(n)),
        }
    }

    /// Unwrap pointer / reference / function declarators down to the identifier
    fn declarator_name(&self, node: Node) -> Option<String> {
        match node.kind() {
            "identifier" | "field_identifier" | "destructor_name" | "operator_name" => {
                Some(self.text(node))
            }
            "qualified_identifier" => node
                .child_by_field_name("name")
                .and_then(|n| self.declarator_name(n))
                .or_else(|| Some(self.text(node))),
            _ => node
                .child_by_field_name("declarator")
                .and_then(|d| self.declarator_name(d))
                .or_else(|| {
                    let mut cursor = node.walk();
                    let found = node
                        .named_children(&mut cursor)
                        .find_map(|c| self.declarator_name(c));
                    found
                }),
        }
    }

    fn function_body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        if let Some(body) = node.child_by_field_name("body") {
            if BODY_KINDS.contains(&body.kind()) || body.kind().ends_with("_body") {
                return Some(body);
            }
        }
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|c| BODY_KINDS.contains(&c.kind()));
        found
    }

    fn function_params(&self, node: Node) -> Vec<String> {
        let params = node.child_by_field_name("parameters").or_else(|| {
            // C/C++ keep parameters on the function declarator
            let declarator = node.child_by_field_name("declarator")?;
            let function_declarator = if declarator.kind() == "function_declarator" {
                Some(declarator)
            } else {
                find_descendant(declarator, "function_declarator")
            };
            function_declarator.and_then(|fd| fd.child_by_field_name("parameters"))
        });
        let Some(params) = params else {
            return Vec::new();
        };
        let mut cursor = params.walk();
        params
            .named_children(&mut cursor)
            .filter(|c| !c.kind().contains("comment"))
            .map(|c| squash_whitespace(&self.text(c)))
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn decorators(&self, node: Node) -> Vec<String> {
        let mut decorators = Vec::new();
        match self.family {
            "python" => {
                if let Some(parent) = node.parent().filter(|p| p.kind() == "decorated_definition") {
                    let mut cursor = parent.walk();
                    for child in parent.named_children(&mut cursor) {
                        if child.kind() == "decorator" {
                            decorators.push(decorator_name(&self.text(child)));
                        }
                    }
                }
            }
            "java" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "modifiers" {
                        let mut mc = child.walk();
                        for m in child.named_children(&mut mc) {
                            if m.kind().ends_with("annotation") {
                                decorators.push(decorator_name(&self.text(m)));
                            }
                        }
                    }
                }
            }
            "typescript" | "javascript" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "decorator" {
                        decorators.push(decorator_name(&self.text(child)));
                    }
                }
            }
            "rust" => {
                let mut sibling = node.prev_named_sibling();
                while let Some(s) = sibling {
                    if s.kind() != "attribute_item" {
                        break;
                    }
                    let raw = self.text(s);
                    let inner = raw.trim_start_matches("#[").trim_end_matches(']');
                    decorators.push(decorator_name(inner));
                    sibling = s.prev_named_sibling();
                }
            }
            _ => {}
        }
        decorators
    }

    /// Go methods live outside the type; attach them through the receiver
    fn go_receiver_owner(&self, node: Node) -> Option<usize> {
        if self.family != "go" || node.kind() != "method_declaration" {
            return None;
        }
        let receiver = node.child_by_field_name("receiver")?;
        let type_name = find_descendant(receiver, "type_identifier").map(|n| self.text(n))?;
        self.classes.iter().position(|c| c.name == type_name)
    }

    fn collect_calls(&self, node: Node, calls: &mut Vec<String>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if CALL_KINDS.contains(&child.kind()) {
                if let Some(name) = self.callee_name(child) {
                    if !calls.contains(&name) {
                        calls.push(name);
                    }
                }
            }
            self.collect_calls(child, calls);
        }
    }

    fn callee_name(&self, call: Node) -> Option<String> {
        let callee = call
            .child_by_field_name("function")
            .or_else(|| call.child_by_field_name("method"))
            .or_else(|| call.child_by_field_name("name"))?;
        self.trailing_identifier(callee)
    }

    /// `a.b.c` / `a->c` / `a::c` / `c` → `c`
    fn trailing_identifier(&self, node: Node) -> Option<String> {
        match node.kind() {
            "identifier" | "field_identifier" | "property_identifier" | "type_identifier"
            | "constant" => Some(self.text(node)),
            _ => ["attribute", "property", "field", "name", "function"]
                .iter()
                .find_map(|f| node.child_by_field_name(f))
                .and_then(|n| self.trailing_identifier(n)),
        }
    }

    // ========================================
    // Classes
    // ========================================

    /// Forward declarations (`struct Foo;`) and plain type aliases are not classes
    fn is_class_definition(&self, node: Node) -> bool {
        match self.family {
            "c" | "cpp" => node.child_by_field_name("body").is_some(),
            "go" => node
                .child_by_field_name("type")
                .map(|t| matches!(t.kind(), "struct_type" | "interface_type"))
                .unwrap_or(false),
            _ => true,
        }
    }

    fn push_class(&mut self, node: Node) -> usize {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_else(|| "<anonymous>".to_string());
        let class = ClassDef {
            name,
            bases: self.class_bases(node),
            methods: Vec::new(),
            fields: Vec::new(),
            is_abstract: self.is_abstract(node),
            decorators: self.decorators(node),
        };
        self.classes.push(class);
        self.classes.len() - 1
    }

    fn class_bases(&self, node: Node) -> Vec<String> {
        let mut bases = Vec::new();
        match self.family {
            "python" => {
                if let Some(args) = node.child_by_field_name("superclasses") {
                    let mut cursor = args.walk();
                    for arg in args.named_children(&mut cursor) {
                        match arg.kind() {
                            "keyword_argument" => {
                                if let Some(value) = arg.child_by_field_name("value") {
                                    bases.push(self.text(value));
                                }
                            }
                            _ => bases.push(self.text(arg)),
                        }
                    }
                }
            }
            "ruby" => {
                if let Some(superclass) = node.child_by_field_name("superclass") {
                    bases.push(self.text(superclass).trim_start_matches('<').trim().to_string());
                }
            }
            "java" | "typescript" | "javascript" | "cpp" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if matches!(
                        child.kind(),
                        "superclass"
                            | "super_interfaces"
                            | "extends_interfaces"
                            | "class_heritage"
                            | "extends_type_clause"
                            | "base_class_clause"
                    ) {
                        self.collect_type_names(child, &mut bases);
                    }
                }
            }
            _ => {}
        }
        bases
    }

    fn collect_type_names(&self, node: Node, out: &mut Vec<String>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "type_identifier" | "identifier" | "qualified_identifier" | "scoped_type_identifier"
                | "member_expression" => {
                    let name = self.text(child);
                    if !out.contains(&name) {
                        out.push(name);
                    }
                }
                "type_arguments" => {}
                _ => self.collect_type_names(child, out),
            }
        }
    }

    fn is_abstract(&self, node: Node) -> bool {
        match self.family {
            "python" => self
                .class_bases(node)
                .iter()
                .any(|b| matches!(b.rsplit('.').next(), Some("ABC" | "Protocol" | "ABCMeta"))),
            "java" => {
                if node.kind() == "interface_declaration" {
                    return true;
                }
                let mut cursor = node.walk();
                let abstract_modifier = node
                    .named_children(&mut cursor)
                    .any(|c| c.kind() == "modifiers" && self.text(c).contains("abstract"));
                abstract_modifier
            }
            "typescript" | "javascript" => matches!(
                node.kind(),
                "abstract_class_declaration" | "interface_declaration"
            ),
            "rust" => node.kind() == "trait_item",
            "go" => node
                .child_by_field_name("type")
                .map(|t| t.kind() == "interface_type")
                .unwrap_or(false),
            "cpp" => {
                let Some(body) = node.child_by_field_name("body") else {
                    return false;
                };
                let mut cursor = body.walk();
                let pure_virtual = body.named_children(&mut cursor).any(|member| {
                    matches!(member.kind(), "field_declaration" | "declaration")
                        && PURE_VIRTUAL_RE.is_match(self.text(member).trim())
                });
                pure_virtual
            }
            _ => false,
        }
    }

    /// `impl Trait for Type` attaches methods to `Type` and records `Trait` as a base
    fn register_rust_impl(&mut self, node: Node) -> Option<usize> {
        let type_name = node
            .child_by_field_name("type")
            .map(|t| self.text(t))
            .map(|t| t.split('<').next().unwrap_or_default().trim().to_string())?;
        let trait_name = node.child_by_field_name("trait").map(|t| self.text(t));
        let idx = self.classes.iter().position(|c| c.name == type_name)?;
        if let Some(trait_name) = trait_name {
            if !self.classes[idx].bases.contains(&trait_name) {
                self.classes[idx].bases.push(trait_name);
            }
        }
        Some(idx)
    }

    fn collect_field(&mut self, node: Node, ctx: Context) {
        let Some(idx) = ctx.field_owner else {
            return;
        };
        let mut names = Vec::new();
        match (self.family, node.kind()) {
            ("c" | "cpp", "field_declaration") => {
                let is_method = find_descendant(node, "function_declarator").is_some();
                if !is_method {
                    if let Some(id) = find_descendant(node, "field_identifier") {
                        names.push(self.text(id));
                    }
                }
            }
            ("rust", "field_declaration") => {
                if let Some(name) = node.child_by_field_name("name") {
                    names.push(self.text(name));
                }
            }
            ("go", "field_declaration") => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "field_identifier" {
                        names.push(self.text(child));
                    }
                }
            }
            ("java", "field_declaration") => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() != "variable_declarator" {
                        continue;
                    }
                    if let Some(name) = child.child_by_field_name("name") {
                        names.push(self.text(name));
                    }
                }
            }
            (
                "typescript" | "javascript",
                "public_field_definition" | "field_definition" | "property_signature",
            ) => {
                if let Some(name) = node
                    .child_by_field_name("name")
                    .or_else(|| node.child_by_field_name("property"))
                {
                    names.push(self.text(name));
                }
            }
            ("python", "assignment") => {
                if let Some(left) = node.child_by_field_name("left") {
                    match left.kind() {
                        // Class-level attribute (only directly in the class body)
                        "identifier" if !ctx.in_function => names.push(self.text(left)),
                        "attribute" => {
                            let is_self = left
                                .child_by_field_name("object")
                                .map(|o| self.text(o) == "self")
                                .unwrap_or(false);
                            if is_self {
                                if let Some(attr) = left.child_by_field_name("attribute") {
                                    names.push(self.text(attr));
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            ("ruby", "assignment") => {
                if let Some(left) = node
                    .child_by_field_name("left")
                    .filter(|l| l.kind() == "instance_variable")
                {
                    names.push(self.text(left).trim_start_matches('@').to_string());
                }
            }
            _ => {}
        }

        if let Some(class) = self.classes.get_mut(idx) {
            for name in names {
                if !name.is_empty() && !class.fields.contains(&name) {
                    class.fields.push(name);
                }
            }
        }
    }

    // ========================================
    // Imports
    // ========================================

    fn collect_import(&mut self, node: Node) {
        match (self.family, node.kind()) {
            ("python", "import_statement") => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    let module = match child.kind() {
                        "dotted_name" => Some(child),
                        "aliased_import" => child.child_by_field_name("name"),
                        _ => None,
                    };
                    if let Some(module) = module {
                        self.imports.push(ImportDecl::new(self.text(module)));
                    }
                }
            }
            ("python", "import_from_statement") => {
                let Some(module) = node.child_by_field_name("module_name") else {
                    return;
                };
                let mut import = ImportDecl::new(self.text(module));
                let mut cursor = node.walk();
                for child in node.children_by_field_name("name", &mut cursor) {
                    let name = match child.kind() {
                        "aliased_import" => child.child_by_field_name("name").map(|n| self.text(n)),
                        _ => Some(self.text(child)),
                    };
                    if let Some(name) = name {
                        import.names.push(name);
                    }
                }
                self.imports.push(import);
            }
            ("go", "import_spec") => {
                if let Some(path) = node.child_by_field_name("path") {
                    self.imports.push(ImportDecl::new(strip_quotes(&self.text(path))));
                }
            }
            ("typescript" | "javascript", "import_statement")
            | ("typescript" | "javascript", "export_statement") => {
                let Some(source) = node.child_by_field_name("source") else {
                    return;
                };
                let mut import = ImportDecl::new(strip_quotes(&self.text(source)));
                if let Some(clause) = find_descendant(node, "import_clause") {
                    let mut names = Vec::new();
                    collect_identifiers(clause, self.source, &mut names);
                    import.names = names;
                }
                self.imports.push(import);
            }
            ("typescript" | "javascript", "call_expression") => {
                if let Some(source) = self.string_call_argument(node, &["require"]) {
                    self.imports.push(ImportDecl::new(source));
                }
            }
            ("java", "import_declaration") => {
                let raw = self.text(node);
                let source = raw
                    .trim_start_matches("import")
                    .trim()
                    .trim_start_matches("static ")
                    .trim_end_matches(';')
                    .trim()
                    .trim_end_matches(".*")
                    .to_string();
                self.imports.push(ImportDecl::new(source));
            }
            ("rust", "use_declaration") => {
                if let Some(arg) = node.child_by_field_name("argument") {
                    self.imports.push(rust_use_import(&self.text(arg)));
                }
            }
            ("rust", "mod_item") => {
                // `mod foo;` pulls in foo.rs / foo/mod.rs
                if node.child_by_field_name("body").is_none() {
                    if let Some(name) = node.child_by_field_name("name") {
                        self.imports.push(ImportDecl::new(format!("self::{}", self.text(name))));
                    }
                }
            }
            ("ruby", "call") => {
                let method = node.child_by_field_name("method").map(|m| self.text(m));
                match method.as_deref() {
                    Some("require") => {
                        if let Some(source) = self.string_call_argument(node, &["require"]) {
                            self.imports.push(ImportDecl::new(source));
                        }
                    }
                    Some("require_relative") => {
                        if let Some(source) = self.string_call_argument(node, &["require_relative"]) {
                            let relative = if source.starts_with('.') {
                                source
                            } else {
                                format!("./{}", source)
                            };
                            self.imports.push(ImportDecl::new(relative));
                        }
                    }
                    _ => {}
                }
            }
            ("c" | "cpp", "preproc_include") => {
                let Some(path) = node.child_by_field_name("path") else {
                    return;
                };
                let raw = self.text(path);
                let mut import = ImportDecl::new(
                    raw.trim_matches(|c| c == '<' || c == '>' || c == '"').to_string(),
                );
                import.is_system = path.kind() == "system_lib_string";
                self.imports.push(import);
            }
            _ => {}
        }
    }

    /// First string argument of a call to one of `callees`
    fn string_call_argument(&self, call: Node, callees: &[&str]) -> Option<String> {
        let callee = call
            .child_by_field_name("function")
            .or_else(|| call.child_by_field_name("method"))?;
        if !callees.contains(&self.text(callee).as_str()) {
            return None;
        }
        let args = call.child_by_field_name("arguments")?;
        let mut cursor = args.walk();
        let first = args.named_children(&mut cursor).next()?;
        if !first.kind().contains("string") {
            return None;
        }
        Some(strip_quotes(&self.text(first)))
    }
}

/// Maximum depth of nested control-flow nodes below `node`
pub(crate) fn nesting_depth(node: Node) -> usize {
    let mut max = 0;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let adds_level = NESTING_KINDS.contains(&child.kind())
            && !(IF_KINDS.contains(&child.kind())
                && (node.kind() == "else_clause"
                    || node.kind() == "elsif"
                    || IF_KINDS.contains(&node.kind())));
        let depth = nesting_depth(child) + usize::from(adds_level);
        max = max.max(depth);
    }
    max
}

fn find_descendant<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == kind {
            return Some(child);
        }
        if let Some(found) = find_descendant(child, kind) {
            return Some(found);
        }
    }
    None
}

fn collect_identifiers(node: Node, source: &[u8], out: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "identifier" {
            out.push(child.utf8_text(source).unwrap_or_default().to_string());
        } else {
            collect_identifiers(child, source, out);
        }
    }
}

fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_quotes(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

/// `@app.route("/x")` → `app.route`
fn decorator_name(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('@').trim();
    trimmed
        .split('(')
        .next()
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// `std::io::{self, Write}` → source `std::io`, names `self`, `Write`
fn rust_use_import(argument: &str) -> ImportDecl {
    let compact = squash_whitespace(argument);
    if let Some((prefix, group)) = compact.split_once("::{") {
        let mut import = ImportDecl::new(prefix.to_string());
        import.names = group
            .trim_end_matches('}')
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        return import;
    }
    let source = compact.split(" as ").next().unwrap_or(&compact).to_string();
    let mut import = ImportDecl::new(source.trim_end_matches("::*").to_string());
    if let Some(last) = source.rsplit("::").next().filter(|l| *l != "*") {
        import.names.push(last.to_string());
    }
    import
}
