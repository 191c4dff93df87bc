use bytes::Bytes;

use super::{required, set_once, Handle, LongValueSpec, Reason, SpecError};
use crate::{
    codec,
    model::{FamilyModel, LongRange, Name, QualModel, RowKey, TableModel, Value},
};

/// Operation being frozen, used to attribute validation failures.
pub(crate) struct Scope<'a> {
    pub(crate) target: &'static str,
    pub(crate) table: &'a TableModel,
    pub(crate) row: &'a RowKey,
    pub(crate) columns: Vec<String>,
}

impl Scope<'_> {
    pub(crate) fn invalid(&self, reason: Reason) -> SpecError {
        SpecError::Invalid {
            target: self.target,
            table: self.table.name().clone(),
            row: self.row.clone(),
            columns: self.columns.clone(),
            reason,
        }
    }

    fn family(&self, name: Name) -> Result<FamilyModel, SpecError> {
        self.table
            .family(&name)
            .cloned()
            .ok_or_else(|| self.invalid(Reason::UnknownFamily(name)))
    }
}

/// Declared qualifier model, or an unversioned one for ad hoc qualifiers.
fn qual_model(family: &FamilyModel, name: Name) -> QualModel {
    family
        .quals()
        .iter()
        .find(|qual| qual.name() == &name)
        .cloned()
        .unwrap_or_else(|| QualModel::of(name))
}

fn describe(family: &Name, qual: Option<&Name>, version: Option<i64>, ts: Option<i64>) -> String {
    let mut out = family.to_string();
    if let Some(qual) = qual {
        out.push(':');
        out.push_str(qual.as_str());
    }
    if let Some(version) = version {
        out.push_str(&format!("@{version}"));
    }
    if let Some(ts) = ts {
        out.push_str(&format!("#{ts}"));
    }
    out
}

const READ_COLUMN: &str = "read column";
const WRITE_COLUMN: &str = "write column";
const CONDITION: &str = "condition";

/// Fluid read column.
///
/// Without a qualifier the whole family is read. Without a version
/// constraint every stored version is a candidate, newest first for
/// inverting policies.
#[derive(Clone, Debug, Default)]
pub struct ReadColumn {
    family: Option<Name>,
    qual: Option<Name>,
    version: Option<i64>,
    version_range: Option<LongRange>,
    optional: Option<()>,
}

impl ReadColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fam(mut self, family: impl Into<Name>) -> Result<Self, SpecError> {
        set_once(&mut self.family, family.into(), READ_COLUMN, "family")?;
        Ok(self)
    }

    pub fn qual(mut self, qual: impl Into<Name>) -> Result<Self, SpecError> {
        set_once(&mut self.qual, qual.into(), READ_COLUMN, "qualifier")?;
        Ok(self)
    }

    /// Read exactly this version.
    pub fn version(mut self, version: i64) -> Result<Self, SpecError> {
        set_once(&mut self.version, version, READ_COLUMN, "version")?;
        Ok(self)
    }

    /// Read only versions inside `range`.
    pub fn version_range(mut self, range: LongValueSpec) -> Result<Self, SpecError> {
        let range = range.freeze()?;
        set_once(
            &mut self.version_range,
            range,
            READ_COLUMN,
            "version filter",
        )?;
        Ok(self)
    }

    /// Allow the column to come back empty.
    pub fn optional(mut self) -> Result<Self, SpecError> {
        set_once(&mut self.optional, (), READ_COLUMN, "optional")?;
        Ok(self)
    }

    pub(crate) fn default_handle(&self) -> Result<Handle, SpecError> {
        let family = required(self.family.as_ref(), READ_COLUMN, "family")?;
        Ok(describe(family, self.qual.as_ref(), self.version, None).into())
    }

    pub(crate) fn freeze(
        self,
        handle: Handle,
        scope: &Scope<'_>,
    ) -> Result<ReadColumnSpec, SpecError> {
        let family = scope.family(required(self.family, READ_COLUMN, "family")?)?;
        let qual = self.qual.map(|name| qual_model(&family, name));

        let version = match (self.version, self.version_range) {
            (Some(_), Some(_)) => return Err(scope.invalid(Reason::VersionConflict)),
            (Some(version), None) => VersionConstraint::Exactly(version),
            (None, Some(range)) => VersionConstraint::Within(range),
            (None, None) => VersionConstraint::Any,
        };
        if !matches!(version, VersionConstraint::Any) {
            match &qual {
                None => return Err(scope.invalid(Reason::VersionWithoutQualifier)),
                Some(qual) if !qual.versioning().is_versioned() => {
                    return Err(scope.invalid(Reason::Unversioned(qual.name().clone())))
                }
                Some(_) => {}
            }
        }

        Ok(ReadColumnSpec {
            handle,
            family,
            qual,
            version,
            optional: self.optional.is_some(),
        })
    }
}

/// Version restriction on a frozen read column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionConstraint {
    Any,
    Exactly(i64),
    Within(LongRange),
}

/// Frozen read column, resolved against its table model.
#[derive(Clone, Debug)]
pub struct ReadColumnSpec {
    handle: Handle,
    family: FamilyModel,
    qual: Option<QualModel>,
    version: VersionConstraint,
    optional: bool,
}

impl ReadColumnSpec {
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn family(&self) -> &FamilyModel {
        &self.family
    }

    /// `None` for a whole-family read.
    pub fn qual(&self) -> Option<&QualModel> {
        self.qual.as_ref()
    }

    pub fn version(&self) -> VersionConstraint {
        self.version
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Fluid write column.
#[derive(Clone, Debug, Default)]
pub struct WriteColumn {
    family: Option<Name>,
    qual: Option<Name>,
    value: Option<Value>,
    timestamp: Option<i64>,
    version: Option<i64>,
}

impl WriteColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fam(mut self, family: impl Into<Name>) -> Result<Self, SpecError> {
        set_once(&mut self.family, family.into(), WRITE_COLUMN, "family")?;
        Ok(self)
    }

    pub fn qual(mut self, qual: impl Into<Name>) -> Result<Self, SpecError> {
        set_once(&mut self.qual, qual.into(), WRITE_COLUMN, "qualifier")?;
        Ok(self)
    }

    pub fn value(mut self, value: impl Into<Value>) -> Result<Self, SpecError> {
        set_once(&mut self.value, value.into(), WRITE_COLUMN, "value")?;
        Ok(self)
    }

    /// Explicit cell timestamp. Defaults to the store's clock.
    pub fn ts(mut self, timestamp: i64) -> Result<Self, SpecError> {
        set_once(&mut self.timestamp, timestamp, WRITE_COLUMN, "timestamp")?;
        Ok(self)
    }

    /// Explicit version. Defaults to the timestamp, then to the current
    /// time in milliseconds.
    pub fn version(mut self, version: i64) -> Result<Self, SpecError> {
        set_once(&mut self.version, version, WRITE_COLUMN, "version")?;
        Ok(self)
    }

    pub(crate) fn default_handle(&self) -> Result<Handle, SpecError> {
        let family = required(self.family.as_ref(), WRITE_COLUMN, "family")?;
        let qual = required(self.qual.as_ref(), WRITE_COLUMN, "qualifier")?;
        Ok(describe(family, Some(qual), self.version, self.timestamp).into())
    }

    pub(crate) fn freeze(
        self,
        handle: Handle,
        scope: &Scope<'_>,
    ) -> Result<WriteColumnSpec, SpecError> {
        let family = scope.family(required(self.family, WRITE_COLUMN, "family")?)?;
        let qual = qual_model(&family, required(self.qual, WRITE_COLUMN, "qualifier")?);
        let value = required(self.value, WRITE_COLUMN, "value")?;

        let versioning = qual.versioning();
        if self.version.is_some() && !versioning.is_versioned() {
            return Err(scope.invalid(Reason::Unversioned(qual.name().clone())));
        }
        if self.version.is_some() && self.timestamp.is_some() && versioning.is_timestamp_based() {
            return Err(scope.invalid(Reason::TimestampVersionConflict));
        }

        Ok(WriteColumnSpec {
            handle,
            family,
            qual,
            value,
            timestamp: self.timestamp,
            version: self.version,
        })
    }
}

/// Frozen write column, resolved against its table model.
#[derive(Clone, Debug)]
pub struct WriteColumnSpec {
    handle: Handle,
    family: FamilyModel,
    qual: QualModel,
    value: Value,
    timestamp: Option<i64>,
    version: Option<i64>,
}

impl WriteColumnSpec {
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn family(&self) -> &FamilyModel {
        &self.family
    }

    pub fn qual(&self) -> &QualModel {
        &self.qual
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn version(&self) -> Option<i64> {
        self.version
    }

    /// Version the cell is stored under: the explicit version, else the
    /// explicit timestamp. `None` leaves it to the clock at execution.
    pub(crate) fn effective_version(&self) -> Option<i64> {
        self.version.or(self.timestamp)
    }

    /// Physical family, qualifier and version this column lands on. Two
    /// columns of one write sharing a key would overwrite each other.
    pub(crate) fn cell_key(&self) -> (Name, Bytes, Option<i64>) {
        let versioning = self.qual.versioning();
        let base = self.qual.name().as_bytes();
        let (qualifier, version) = match self.effective_version() {
            Some(version) if versioning.is_qualifier_based() => (
                codec::append_version_to_qual(base, version, versioning)
                    .unwrap_or_else(|_| self.qual.name().to_bytes()),
                Some(version),
            ),
            version if versioning.is_versioned() => (self.qual.name().to_bytes(), version),
            _ => (self.qual.name().to_bytes(), self.timestamp),
        };
        (self.family.name().clone(), qualifier, version)
    }
}

/// Fluid write precondition.
///
/// Exactly one expectation must be given: [`empty`](Self::empty) or
/// [`value`](Self::value).
#[derive(Clone, Debug, Default)]
pub struct Condition {
    family: Option<Name>,
    qual: Option<Name>,
    version: Option<i64>,
    expected: Option<Option<Value>>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fam(mut self, family: impl Into<Name>) -> Result<Self, SpecError> {
        set_once(&mut self.family, family.into(), CONDITION, "family")?;
        Ok(self)
    }

    pub fn qual(mut self, qual: impl Into<Name>) -> Result<Self, SpecError> {
        set_once(&mut self.qual, qual.into(), CONDITION, "qualifier")?;
        Ok(self)
    }

    pub fn version(mut self, version: i64) -> Result<Self, SpecError> {
        set_once(&mut self.version, version, CONDITION, "version")?;
        Ok(self)
    }

    /// Expect no cell at the column.
    pub fn empty(mut self) -> Result<Self, SpecError> {
        set_once(&mut self.expected, None, CONDITION, "expectation")?;
        Ok(self)
    }

    /// Expect the column to hold exactly `value`.
    pub fn value(mut self, value: impl Into<Value>) -> Result<Self, SpecError> {
        set_once(
            &mut self.expected,
            Some(value.into()),
            CONDITION,
            "expectation",
        )?;
        Ok(self)
    }

    pub(crate) fn freeze(self, scope: &Scope<'_>) -> Result<ConditionSpec, SpecError> {
        let family = scope.family(required(self.family, CONDITION, "family")?)?;
        let qual = qual_model(&family, required(self.qual, CONDITION, "qualifier")?);
        let expected = required(self.expected, CONDITION, "expectation")?;
        let versioning = qual.versioning();
        if self.version.is_some() && !versioning.is_versioned() {
            return Err(scope.invalid(Reason::ConditionVersion));
        }
        if self.version.is_none() && versioning.is_qualifier_based() {
            return Err(scope.invalid(Reason::ConditionNeedsVersion));
        }
        Ok(ConditionSpec {
            family,
            qual,
            version: self.version,
            expected,
        })
    }
}

/// Frozen precondition.
#[derive(Clone, Debug)]
pub struct ConditionSpec {
    family: FamilyModel,
    qual: QualModel,
    version: Option<i64>,
    expected: Option<Value>,
}

impl ConditionSpec {
    pub fn family(&self) -> &FamilyModel {
        &self.family
    }

    pub fn qual(&self) -> &QualModel {
        &self.qual
    }

    pub fn version(&self) -> Option<i64> {
        self.version
    }

    /// `None` means the column must be empty.
    pub fn expected(&self) -> Option<&Value> {
        self.expected.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VersioningModel;

    fn table() -> TableModel {
        TableModel::with("t")
            .family(
                FamilyModel::with("A")
                    .qual(
                        QualModel::with("B")
                            .versioning(VersioningModel::QualifierLatest)
                            .build(),
                    )
                    .qual(
                        QualModel::with("T")
                            .versioning(VersioningModel::TimestampChrono)
                            .build(),
                    )
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn scope<'a>(table: &'a TableModel, row: &'a RowKey) -> Scope<'a> {
        Scope {
            target: "read",
            table,
            row,
            columns: Vec::new(),
        }
    }

    #[test]
    fn exactly_once_fields_reject_reassignment() {
        let err = ReadColumn::new().fam("A").unwrap().fam("A").unwrap_err();
        assert_eq!(
            err,
            SpecError::AlreadySet {
                target: READ_COLUMN,
                field: "family"
            }
        );
        assert!(WriteColumn::new().value("x").unwrap().value("y").is_err());
        assert!(Condition::new().empty().unwrap().value("v").is_err());
        assert!(ReadColumn::new().optional().unwrap().optional().is_err());
    }

    #[test]
    fn missing_family_fails_on_freeze() {
        let table = table();
        let row = RowKey::from("r");
        let err = WriteColumn::new()
            .qual("B")
            .unwrap()
            .value("v")
            .unwrap()
            .freeze("h".into(), &scope(&table, &row))
            .unwrap_err();
        assert_eq!(
            err,
            SpecError::Missing {
                target: WRITE_COLUMN,
                field: "family"
            }
        );
    }

    #[test]
    fn version_filter_and_version_are_exclusive() {
        let table = table();
        let row = RowKey::from("r");
        let err = ReadColumn::new()
            .fam("A")
            .unwrap()
            .qual("B")
            .unwrap()
            .version(1)
            .unwrap()
            .version_range(LongValueSpec::new().ge(0).unwrap())
            .unwrap()
            .freeze("h".into(), &scope(&table, &row))
            .unwrap_err();
        assert!(matches!(
            err,
            SpecError::Invalid {
                reason: Reason::VersionConflict,
                ..
            }
        ));
    }

    #[test]
    fn version_needs_versioned_qualifier() {
        let table = table();
        let row = RowKey::from("r");
        let scope = scope(&table, &row);

        let err = ReadColumn::new()
            .fam("A")
            .unwrap()
            .qual("plain")
            .unwrap()
            .version(1)
            .unwrap()
            .freeze("h".into(), &scope)
            .unwrap_err();
        assert!(matches!(
            err,
            SpecError::Invalid {
                reason: Reason::Unversioned(_),
                ..
            }
        ));

        let err = ReadColumn::new()
            .fam("A")
            .unwrap()
            .version(1)
            .unwrap()
            .freeze("h".into(), &scope)
            .unwrap_err();
        assert!(matches!(
            err,
            SpecError::Invalid {
                reason: Reason::VersionWithoutQualifier,
                ..
            }
        ));
    }

    #[test]
    fn timestamp_and_version_clash_only_for_timestamp_policies() {
        let table = table();
        let row = RowKey::from("r");
        let scope = scope(&table, &row);
        let column = |qual: &str| {
            WriteColumn::new()
                .fam("A")
                .and_then(|c| c.qual(qual))
                .and_then(|c| c.value("v"))
                .and_then(|c| c.ts(5))
                .and_then(|c| c.version(6))
                .unwrap()
        };

        assert!(column("B").freeze("h".into(), &scope).is_ok());
        assert!(matches!(
            column("T").freeze("h".into(), &scope),
            Err(SpecError::Invalid {
                reason: Reason::TimestampVersionConflict,
                ..
            })
        ));
    }

    #[test]
    fn unknown_family_is_reported() {
        let table = table();
        let row = RowKey::from("r");
        let err = Condition::new()
            .fam("Z")
            .unwrap()
            .qual("B")
            .unwrap()
            .empty()
            .unwrap()
            .freeze(&scope(&table, &row))
            .unwrap_err();
        assert!(matches!(
            err,
            SpecError::Invalid {
                reason: Reason::UnknownFamily(_),
                ..
            }
        ));
    }

    #[test]
    fn default_handles_describe_the_column() {
        let read = ReadColumn::new().fam("A").unwrap();
        assert_eq!(read.default_handle().unwrap().as_str(), "A");
        let write = WriteColumn::new()
            .fam("A")
            .and_then(|c| c.qual("B"))
            .and_then(|c| c.version(3))
            .unwrap();
        assert_eq!(write.default_handle().unwrap().as_str(), "A:B@3");
    }
}
