use std::{fmt, sync::Arc};

use thiserror::Error;

use super::{CellDeserializer, Name, VersioningModel};

/// Errors raised while assembling table models.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Two families in one table share a name.
    #[error("family {family} declared twice in table {table}")]
    DuplicateFamily {
        /// Table being built.
        table: Name,
        /// Repeated family name.
        family: Name,
    },
    /// Two qualifiers in one family share a name.
    #[error("qualifier {qualifier} declared twice in family {family}")]
    DuplicateQualifier {
        /// Family being built.
        family: Name,
        /// Repeated qualifier name.
        qualifier: Name,
    },
}

/// Logical qualifier: a name plus the policy used to version its values.
#[derive(Clone)]
pub struct QualModel {
    inner: Arc<QualInner>,
}

struct QualInner {
    name: Name,
    versioning: VersioningModel,
    deserializer: Option<Arc<dyn CellDeserializer>>,
}

impl QualModel {
    /// Unversioned qualifier.
    pub fn of(name: impl Into<Name>) -> Self {
        Self::with(name).build()
    }

    /// Start building a qualifier model.
    pub fn with(name: impl Into<Name>) -> QualModelBuilder {
        QualModelBuilder {
            name: name.into(),
            versioning: VersioningModel::None,
            deserializer: None,
        }
    }

    pub fn name(&self) -> &Name {
        &self.inner.name
    }

    pub fn versioning(&self) -> VersioningModel {
        self.inner.versioning
    }

    pub fn deserializer(&self) -> Option<&Arc<dyn CellDeserializer>> {
        self.inner.deserializer.as_ref()
    }
}

impl fmt::Debug for QualModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualModel")
            .field("name", &self.inner.name)
            .field("versioning", &self.inner.versioning)
            .field("deserializer", &self.inner.deserializer.is_some())
            .finish()
    }
}

/// Builder for [`QualModel`].
pub struct QualModelBuilder {
    name: Name,
    versioning: VersioningModel,
    deserializer: Option<Arc<dyn CellDeserializer>>,
}

impl QualModelBuilder {
    #[must_use]
    pub fn versioning(mut self, model: VersioningModel) -> Self {
        self.versioning = model;
        self
    }

    #[must_use]
    pub fn deserializer(mut self, deserializer: Arc<dyn CellDeserializer>) -> Self {
        self.deserializer = Some(deserializer);
        self
    }

    pub fn build(self) -> QualModel {
        QualModel {
            inner: Arc::new(QualInner {
                name: self.name,
                versioning: self.versioning,
                deserializer: self.deserializer,
            }),
        }
    }
}

/// Logical column family.
#[derive(Clone)]
pub struct FamilyModel {
    inner: Arc<FamilyInner>,
}

struct FamilyInner {
    name: Name,
    quals: Vec<QualModel>,
    deserializer: Option<Arc<dyn CellDeserializer>>,
}

impl FamilyModel {
    /// Family without any declared qualifiers.
    pub fn of(name: impl Into<Name>) -> Self {
        FamilyModel {
            inner: Arc::new(FamilyInner {
                name: name.into(),
                quals: Vec::new(),
                deserializer: None,
            }),
        }
    }

    /// Start building a family model.
    pub fn with(name: impl Into<Name>) -> FamilyModelBuilder {
        FamilyModelBuilder {
            name: name.into(),
            quals: Vec::new(),
            deserializer: None,
        }
    }

    pub fn name(&self) -> &Name {
        &self.inner.name
    }

    /// Declared qualifiers, in declaration order.
    pub fn quals(&self) -> &[QualModel] {
        &self.inner.quals
    }

    pub fn deserializer(&self) -> Option<&Arc<dyn CellDeserializer>> {
        self.inner.deserializer.as_ref()
    }

    /// Find the declared qualifier that produced the physical qualifier bytes
    /// `stored`, if any.
    pub(crate) fn resolve_physical(&self, stored: &[u8]) -> Option<&QualModel> {
        self.inner.quals.iter().find(|qual| {
            let base = qual.name().as_bytes();
            if qual.versioning().is_qualifier_based() {
                crate::codec::is_versioned_form_of(stored, base)
            } else {
                stored == base
            }
        })
    }

    /// Whether any declared qualifier keeps several versions per cell.
    pub(crate) fn has_timestamp_versions(&self) -> bool {
        self.inner
            .quals
            .iter()
            .any(|qual| qual.versioning().is_timestamp_based())
    }
}

impl fmt::Debug for FamilyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyModel")
            .field("name", &self.inner.name)
            .field("quals", &self.inner.quals)
            .finish()
    }
}

/// Builder for [`FamilyModel`].
pub struct FamilyModelBuilder {
    name: Name,
    quals: Vec<QualModel>,
    deserializer: Option<Arc<dyn CellDeserializer>>,
}

impl FamilyModelBuilder {
    #[must_use]
    pub fn qual(mut self, qual: QualModel) -> Self {
        self.quals.push(qual);
        self
    }

    #[must_use]
    pub fn deserializer(mut self, deserializer: Arc<dyn CellDeserializer>) -> Self {
        self.deserializer = Some(deserializer);
        self
    }

    /// Finish the family, rejecting repeated qualifier names.
    pub fn build(self) -> Result<FamilyModel, ModelError> {
        for (idx, qual) in self.quals.iter().enumerate() {
            if self.quals[..idx].iter().any(|q| q.name() == qual.name()) {
                return Err(ModelError::DuplicateQualifier {
                    family: self.name,
                    qualifier: qual.name().clone(),
                });
            }
        }
        Ok(FamilyModel {
            inner: Arc::new(FamilyInner {
                name: self.name,
                quals: self.quals,
                deserializer: self.deserializer,
            }),
        })
    }
}

/// Logical table: name, ordered families and the salting flag.
///
/// Cheap to clone; every clone shares the same immutable definition.
#[derive(Clone)]
pub struct TableModel {
    inner: Arc<TableInner>,
}

struct TableInner {
    name: Name,
    families: Vec<FamilyModel>,
    salted: bool,
    deserializer: Option<Arc<dyn CellDeserializer>>,
}

impl TableModel {
    /// Start building a table model.
    pub fn with(name: impl Into<Name>) -> TableModelBuilder {
        TableModelBuilder {
            name: name.into(),
            families: Vec::new(),
            salted: false,
            deserializer: None,
        }
    }

    pub fn name(&self) -> &Name {
        &self.inner.name
    }

    /// Families in declaration order.
    pub fn families(&self) -> &[FamilyModel] {
        &self.inner.families
    }

    /// Look up a declared family by name.
    pub fn family(&self, name: &Name) -> Option<&FamilyModel> {
        self.inner.families.iter().find(|fam| fam.name() == name)
    }

    /// Whether row keys are salted before reaching the store.
    pub fn is_salted(&self) -> bool {
        self.inner.salted
    }

    pub fn deserializer(&self) -> Option<&Arc<dyn CellDeserializer>> {
        self.inner.deserializer.as_ref()
    }
}

impl fmt::Debug for TableModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableModel")
            .field("name", &self.inner.name)
            .field("families", &self.inner.families)
            .field("salted", &self.inner.salted)
            .finish()
    }
}

/// Builder for [`TableModel`].
pub struct TableModelBuilder {
    name: Name,
    families: Vec<FamilyModel>,
    salted: bool,
    deserializer: Option<Arc<dyn CellDeserializer>>,
}

impl TableModelBuilder {
    #[must_use]
    pub fn family(mut self, family: FamilyModel) -> Self {
        self.families.push(family);
        self
    }

    /// Prefix every row key with a hash-derived salt.
    #[must_use]
    pub fn salt_rows(mut self) -> Self {
        self.salted = true;
        self
    }

    #[must_use]
    pub fn deserializer(mut self, deserializer: Arc<dyn CellDeserializer>) -> Self {
        self.deserializer = Some(deserializer);
        self
    }

    /// Finish the table, rejecting repeated family names.
    pub fn build(self) -> Result<TableModel, ModelError> {
        for (idx, family) in self.families.iter().enumerate() {
            if self.families[..idx]
                .iter()
                .any(|f| f.name() == family.name())
            {
                return Err(ModelError::DuplicateFamily {
                    table: self.name,
                    family: family.name().clone(),
                });
            }
        }
        Ok(TableModel {
            inner: Arc::new(TableInner {
                name: self.name,
                families: self.families,
                salted: self.salted,
                deserializer: self.deserializer,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_family_is_rejected() {
        let err = TableModel::with("t")
            .family(FamilyModel::of("a"))
            .family(FamilyModel::of("a"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateFamily {
                table: Name::of("t"),
                family: Name::of("a"),
            }
        );
    }

    #[test]
    fn duplicate_qualifier_is_rejected() {
        let err = FamilyModel::with("a")
            .qual(QualModel::of("q"))
            .qual(
                QualModel::with("q")
                    .versioning(VersioningModel::QualifierLatest)
                    .build(),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateQualifier { .. }));
    }

    #[test]
    fn families_keep_declaration_order() {
        let table = TableModel::with("t")
            .family(FamilyModel::of("z"))
            .family(FamilyModel::of("a"))
            .salt_rows()
            .build()
            .unwrap();
        let names: Vec<_> = table.families().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert!(table.is_salted());
        assert!(table.family(&Name::of("a")).is_some());
        assert!(table.family(&Name::of("b")).is_none());
    }

    #[test]
    fn physical_qualifiers_resolve_to_declared_models() {
        let latest = QualModel::with("B")
            .versioning(VersioningModel::QualifierLatest)
            .build();
        let family = FamilyModel::with("A")
            .qual(latest)
            .qual(QualModel::of("plain"))
            .build()
            .unwrap();

        let stored =
            crate::codec::append_version_to_qual(b"B", 7, VersioningModel::QualifierLatest)
                .unwrap();
        assert_eq!(family.resolve_physical(&stored).unwrap().name().as_str(), "B");
        assert_eq!(family.resolve_physical(b"plain").unwrap().name().as_str(), "plain");
        assert!(family.resolve_physical(b"B").is_none());
        assert!(family.resolve_physical(b"other").is_none());
    }
}
