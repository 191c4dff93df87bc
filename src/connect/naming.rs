use crate::model::{Name, TableModel};

/// Maps a logical table model to the physical table name in the store.
pub trait TableNaming: Send + Sync {
    fn resolve(&self, model: &TableModel) -> Name;
}

/// Physical name equals the model name.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModelNaming;

impl TableNaming for ModelNaming {
    fn resolve(&self, model: &TableModel) -> Name {
        model.name().clone()
    }
}

/// Places every table under a directory-style prefix: `{prefix}/{name}`.
#[derive(Clone, Debug)]
pub struct PrefixedNaming {
    prefix: String,
}

impl PrefixedNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }
}

impl TableNaming for PrefixedNaming {
    fn resolve(&self, model: &TableModel) -> Name {
        Name::of(format!("{}/{}", self.prefix, model.name()))
    }
}
