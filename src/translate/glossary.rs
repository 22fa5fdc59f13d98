//! Glossary support for consistent term translation

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    terms: BTreeMap<String, String>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).context("Failed to read glossary file")?;
        Ok(Self::parse(&content))
    }

    /// Parse `source = target` or tab separated lines. Blank lines and lines
    /// starting with `#` or `//` are skipped.
    pub fn parse(content: &str) -> Self {
        let mut glossary = Self::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }
            if let Some((source, target)) = Self::parse_line(line) {
                glossary.add(source, target);
            } else {
                tracing::warn!("Invalid glossary entry at line {}: {}", line_num + 1, line);
            }
        }
        glossary
    }

    fn parse_line(line: &str) -> Option<(String, String)> {
        for sep in ['=', '\t'] {
            if let Some((source, target)) = line.split_once(sep) {
                let source = source.trim();
                let target = target.trim();
                if !source.is_empty() && !target.is_empty() {
                    return Some((source.to_string(), target.to_string()));
                }
            }
        }
        None
    }

    pub fn add(&mut self, source: String, target: String) {
        self.terms.insert(source, target);
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Instruction block listing every term, empty when there are none.
    pub fn build_prompt_context(&self) -> String {
        if self.terms.is_empty() {
            return String::new();
        }
        let mut context = String::from("Use the following translations for specific terms:\n");
        for (source, target) in &self.terms {
            context.push_str(&format!("- \"{}\" → \"{}\"\n", source, target));
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let glossary = Glossary::parse(
            "# comment\n// also comment\nSign in = Войти\nCart\tКорзина\n\nbroken line\n",
        );
        assert_eq!(glossary.len(), 2);
        assert_eq!(glossary.terms.get("Sign in"), Some(&"Войти".to_string()));
        assert_eq!(glossary.terms.get("Cart"), Some(&"Корзина".to_string()));
    }

    #[test]
    fn test_prompt_context_is_sorted() {
        let glossary = Glossary::parse("b = 2\na = 1");
        assert_eq!(
            glossary.build_prompt_context(),
            "Use the following translations for specific terms:\n- \"a\" → \"1\"\n- \"b\" → \"2\"\n"
        );
    }

    #[test]
    fn test_empty_context() {
        assert!(Glossary::new().is_empty());
        assert_eq!(Glossary::new().build_prompt_context(), "");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("terms.txt");
        fs::write(&path, "Checkout = Caja\n").unwrap();
        assert_eq!(Glossary::load(&path).unwrap().len(), 1);
    }
}
