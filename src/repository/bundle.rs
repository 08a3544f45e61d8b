use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSection {
    pub path: String,
    pub contents: String,
}

/// Repository files concatenated for the language model, one
/// `File: <path>` section per file, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryBundle {
    sections: Vec<BundleSection>,
}

impl RepositoryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.sections.push(BundleSection {
            path: path.into(),
            contents: contents.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.path.as_str())
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RepositoryBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            write!(f, "File: {}\n{}\n\n", section.path, section.contents)?;
        }
        Ok(())
    }
}
