//! Plugin → Package Rules
//!
//! Static registry of which package provides each site plugin. Maintained by
//! hand; plugins missing from the table cannot be verified.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageRule {
    /// Ships with the build tool
    Builtin,
    /// Provided by the named package
    Package(&'static str),
}

pub const PLUGIN_RULES: &[(&str, PackageRule)] = &[
    ("search", PackageRule::Builtin),
    ("git-revision-date", PackageRule::Package("mkdocs-git-revision-date-plugin")),
    (
        "git-revision-date-localized",
        PackageRule::Package("mkdocs-git-revision-date-localized-plugin"),
    ),
    ("table-reader", PackageRule::Package("mkdocs-table-reader-plugin")),
    ("macros", PackageRule::Package("mkdocs-macros-plugin")),
    ("minify", PackageRule::Package("mkdocs-minify-plugin")),
    ("mermaid2", PackageRule::Package("mkdocs-mermaid2-plugin")),
    ("awesome-pages", PackageRule::Package("mkdocs-awesome-pages-plugin")),
];

#[derive(Debug, Clone, Copy)]
pub struct RuleTable {
    rules: &'static [(&'static str, PackageRule)],
}

impl RuleTable {
    pub const fn new(rules: &'static [(&'static str, PackageRule)]) -> Self {
        Self { rules }
    }

    pub fn lookup(&self, plugin: &str) -> Option<PackageRule> {
        self.rules
            .iter()
            .find(|(id, _)| *id == plugin)
            .map(|(_, rule)| *rule)
    }

    pub fn plugins(&self) -> impl Iterator<Item = &'static str> {
        self.rules.iter().map(|(id, _)| *id)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(PLUGIN_RULES)
    }
}
