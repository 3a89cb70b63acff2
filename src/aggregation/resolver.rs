use crate::catalog::ConfigurationGroup;

/// Finds the stored variable group a declared name refers to.
///
/// Exact case-insensitive equality wins. Otherwise the first group, in the
/// order given, whose name contains the declared name or is contained by it.
/// When several groups satisfy containment the pick depends on input order.
pub fn resolve_group<'a>(
    declared: &str,
    known: &'a [ConfigurationGroup],
) -> Option<&'a ConfigurationGroup> {
    let declared = declared.trim().to_lowercase();
    if declared.is_empty() {
        return None;
    }

    known
        .iter()
        .find(|group| group.name.to_lowercase() == declared)
        .or_else(|| {
            known.iter().find(|group| {
                let name = group.name.to_lowercase();
                !name.is_empty() && (name.contains(&declared) || declared.contains(&name))
            })
        })
}

/// The project's variable groups, fetched once per aggregation request.
#[derive(Debug, Clone, Default)]
pub struct KnownGroups {
    groups: Vec<ConfigurationGroup>,
}

impl KnownGroups {
    pub fn new(groups: Vec<ConfigurationGroup>) -> Self {
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn by_name(&self, declared: &str) -> Option<&ConfigurationGroup> {
        resolve_group(declared, &self.groups)
    }

    pub fn by_id(&self, id: u64) -> Option<&ConfigurationGroup> {
        self.groups.iter().find(|group| group.id == id)
    }
}
