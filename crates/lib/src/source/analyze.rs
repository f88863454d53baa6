//! Syntactic analysis of Lua entry scripts.
//!
//! The analyzer never resolves names or evaluates code: it parses the file with
//! the tree-sitter Lua grammar and reports top-level declarations together with
//! their exact byte offsets in the original text.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use super::types::{ByteRange, Declaration, DeclarationKind, ParseError};

/// Name of the entry point function stripped from staged scripts.
pub const ENTRY_POINT_NAME: &str = "main";

/// Node kinds that wrap declarations without being declarations themselves.
const WRAPPER_KINDS: &[&str] = &["declaration", "statement"];

const SNIPPET_LEN: usize = 24;

pub struct SourceAnalyzer {
  parser: Parser,
}

impl SourceAnalyzer {
  pub fn new() -> Result<Self, ParseError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_lua::LANGUAGE.into())?;
    Ok(Self { parser })
  }

  /// Read and parse a file.
  pub fn analyze_file(&mut self, path: &Path) -> Result<SourceUnit, ParseError> {
    let source = fs::read_to_string(path).map_err(|source| ParseError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    self.analyze_source(path, source)
  }

  /// Parse an in-memory source text. `path` is only used for error reporting.
  pub fn analyze_source(&mut self, path: &Path, source: String) -> Result<SourceUnit, ParseError> {
    let tree = self
      .parser
      .parse(&source, None)
      .ok_or_else(|| ParseError::NoTree(path.to_path_buf()))?;

    if let Some(node) = first_error(tree.root_node()) {
      let position = node.start_position();
      let snippet: String = source
        .get(node.start_byte()..)
        .unwrap_or_default()
        .chars()
        .take_while(|c| *c != '\n')
        .take(SNIPPET_LEN)
        .collect();
      return Err(ParseError::Syntax {
        path: path.to_path_buf(),
        line: position.row + 1,
        column: position.column + 1,
        snippet,
      });
    }

    debug!(path = %path.display(), bytes = source.len(), "parsed source");

    Ok(SourceUnit {
      path: path.to_path_buf(),
      source,
      tree,
    })
  }
}

/// A parsed source file.
pub struct SourceUnit {
  path: PathBuf,
  source: String,
  tree: Tree,
}

impl SourceUnit {
  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn into_source(self) -> String {
    self.source
  }

  /// All top-level function declarations, in source order.
  pub fn declarations(&self) -> Vec<Declaration> {
    let mut out = Vec::new();
    let root = self.tree.root_node();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
      self.collect_declaration(child, &mut out);
    }
    out
  }

  /// Top-level declarations matching `predicate`, in source order.
  pub fn declarations_where<F>(&self, predicate: F) -> Vec<Declaration>
  where
    F: Fn(&Declaration) -> bool,
  {
    self.declarations().into_iter().filter(|d| predicate(d)).collect()
  }

  /// Every top-level function declaration named `main`.
  pub fn main_declarations(&self) -> Vec<Declaration> {
    self.declarations_where(|d| d.name == ENTRY_POINT_NAME)
  }

  fn collect_declaration(&self, node: Node<'_>, out: &mut Vec<Declaration>) {
    if WRAPPER_KINDS.contains(&node.kind()) {
      let mut cursor = node.walk();
      for child in node.named_children(&mut cursor) {
        self.collect_declaration(child, out);
      }
      return;
    }

    if node.kind() != "function_declaration" {
      return;
    }

    // Methods and dotted names (`function M.main()`) are not top-level functions.
    let Some(name_node) = node.child_by_field_name("name") else {
      return;
    };
    if name_node.kind() != "identifier" {
      return;
    }
    let Ok(name) = name_node.utf8_text(self.source.as_bytes()) else {
      return;
    };

    let kind = if self.source[node.start_byte()..].starts_with("local") {
      DeclarationKind::LocalFunction
    } else {
      DeclarationKind::Function
    };

    out.push(Declaration {
      kind,
      name: name.to_string(),
      range: ByteRange::new(node.start_byte(), node.end_byte()),
    });
  }
}

/// Find the first error or missing node in document order.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
  if node.is_error() || node.is_missing() {
    return Some(node);
  }
  if !node.has_error() {
    return None;
  }
  let mut cursor = node.walk();
  for child in node.children(&mut cursor) {
    if let Some(found) = first_error(child) {
      return Some(found);
    }
  }
  Some(node)
}
