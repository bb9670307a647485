use crate::model::warning::Warning;
use crate::parse::tree::Node;

/// Collects warnings while the extractor walks the tree, and reads typed
/// fields out of nodes. A field that is missing yields `None` silently; a
/// field that is present but unreadable yields `None` and a warning.
#[derive(Debug, Default)]
pub struct ExtractContext {
    pub warnings: Vec<Warning>,
}

impl ExtractContext {
    pub fn new() -> Self {
        ExtractContext::default()
    }

    /// Record a missing required field for the entity at `path`
    pub fn incomplete(&mut self, path: &str, missing: &str) {
        self.warnings.push(Warning::IncompleteProject {
            path: path.to_string(),
            missing: missing.to_string(),
        });
    }

    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    fn parse_number(&mut self, raw: Option<&str>, path: &str, field: &str) -> Option<f64> {
        let raw = raw?;
        match raw.trim().parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.warnings.push(Warning::InvalidNumber {
                    path: path.to_string(),
                    field: field.to_string(),
                    raw: raw.to_string(),
                });
                None
            }
        }
    }

    /// Number held in the `Value` attribute of the child at `field`
    pub fn number(&mut self, node: &Node, field: &str, path: &str) -> Option<f64> {
        self.parse_number(node.value_at(field), path, field)
    }

    /// Number held in an attribute of `node` itself
    pub fn number_attr(&mut self, node: &Node, attr: &str, path: &str) -> Option<f64> {
        self.parse_number(node.attr(attr), path, attr)
    }

    /// Whole number; fractional input is rounded
    pub fn integer(&mut self, node: &Node, field: &str, path: &str) -> Option<i64> {
        self.number(node, field, path).map(|v| v.round() as i64)
    }

    /// Current value of an automatable parameter (`<Field><Manual Value=".."/>`),
    /// falling back to a plain `<Field Value=".."/>`
    pub fn manual_number(&mut self, node: &Node, field: &str, path: &str) -> Option<f64> {
        let raw = manual(node, field);
        self.parse_number(raw, path, field)
    }
}

/// Raw current value of an automatable parameter
pub fn manual<'a>(node: &'a Node, field: &str) -> Option<&'a str> {
    let param = node.find(field)?;
    param
        .child("Manual")
        .and_then(Node::value)
        .or_else(|| param.value())
}

/// `true`/`false` flag in the `Value` attribute at `field`
pub fn flag(node: &Node, field: &str) -> Option<bool> {
    match node.value_at(field)? {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Non-empty string in the `Value` attribute at `field`
pub fn text(node: &Node, field: &str) -> Option<String> {
    node.value_at(field)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
