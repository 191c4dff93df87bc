use std::collections::HashSet;

use super::{
    column::Scope, required, set_once, Condition, ConditionSpec, Handle, LongValueSpec,
    ReadColumn, ReadColumnSpec, Reason, SpecError, WriteColumn, WriteColumnSpec,
};
use crate::model::{LongRange, RowKey, TableModel};

const READ: &str = "read";
const WRITE: &str = "write";

/// Resolve every column handle, rejecting repeats.
fn assign_handles<C>(
    columns: &[(Option<Handle>, C)],
    default: impl Fn(&C) -> Result<Handle, SpecError>,
) -> Result<(Vec<Handle>, Option<Handle>), SpecError> {
    let mut seen = HashSet::with_capacity(columns.len());
    let mut handles = Vec::with_capacity(columns.len());
    let mut duplicate = None;
    for (handle, column) in columns {
        let handle = match handle {
            Some(handle) => handle.clone(),
            None => default(column)?,
        };
        if !seen.insert(handle.clone()) && duplicate.is_none() {
            duplicate = Some(handle.clone());
        }
        handles.push(handle);
    }
    Ok((handles, duplicate))
}

fn scope<'a>(
    target: &'static str,
    table: &'a TableModel,
    row: &'a RowKey,
    handles: &[Handle],
) -> Scope<'a> {
    Scope {
        target,
        table,
        row,
        columns: handles.iter().map(Handle::to_string).collect(),
    }
}

/// Fluid read operation.
///
/// ```
/// use shachi::{
///     model::{FamilyModel, QualModel, TableModel, VersioningModel},
///     spec::{ReadColumn, ReadOpSpec},
/// };
///
/// let table = TableModel::with("users")
///     .family(
///         FamilyModel::with("A")
///             .qual(QualModel::with("B").versioning(VersioningModel::QualifierLatest).build())
///             .build()?,
///     )
///     .build()?;
///
/// let mut read = ReadOpSpec::new();
/// read.from(&table, "row-1")?
///     .with(ReadColumn::new().fam("A")?.qual("B")?)?
///     .at_most(1)?;
/// let op = read.freeze()?;
/// assert_eq!(op.columns().len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct ReadOpSpec {
    target: Option<(TableModel, RowKey)>,
    columns: Vec<(Option<Handle>, ReadColumn)>,
    time_range: Option<LongRange>,
    at_most: Option<usize>,
}

impl ReadOpSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row to read.
    pub fn from(
        &mut self,
        table: &TableModel,
        row: impl Into<RowKey>,
    ) -> Result<&mut Self, SpecError> {
        set_once(&mut self.target, (table.clone(), row.into()), READ, "row")?;
        Ok(self)
    }

    pub fn with(&mut self, column: ReadColumn) -> Result<&mut Self, SpecError> {
        self.columns.push((None, column));
        Ok(self)
    }

    /// Add a column whose results are reported under `handle`.
    pub fn with_handle(
        &mut self,
        handle: impl Into<Handle>,
        column: ReadColumn,
    ) -> Result<&mut Self, SpecError> {
        self.columns.push((Some(handle.into()), column));
        Ok(self)
    }

    /// Add one column per item, in order. If `column` fails for any item no
    /// column from this call is kept.
    pub fn with_all_of<I, F, E>(&mut self, items: I, column: F) -> Result<&mut Self, E>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Result<ReadColumn, E>,
    {
        let added = items.into_iter().map(column).collect::<Result<Vec<_>, E>>()?;
        self.columns.extend(added.into_iter().map(|c| (None, c)));
        Ok(self)
    }

    /// Like [`with_all_of`](Self::with_all_of), with `column` also naming
    /// the handle each column is reported under.
    pub fn with_all_of_handled<I, F, H, E>(
        &mut self,
        items: I,
        mut column: F,
    ) -> Result<&mut Self, E>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Result<(H, ReadColumn), E>,
        H: Into<Handle>,
    {
        let added = items
            .into_iter()
            .map(|item| column(item).map(|(handle, c)| (Some(handle.into()), c)))
            .collect::<Result<Vec<_>, E>>()?;
        self.columns.extend(added);
        Ok(self)
    }

    /// Restrict cells to timestamps inside `range`.
    pub fn at_time(&mut self, range: LongValueSpec) -> Result<&mut Self, SpecError> {
        let range = range.freeze()?;
        set_once(&mut self.time_range, range, READ, "time range")?;
        Ok(self)
    }

    /// Return at most `limit` cells per column.
    pub fn at_most(&mut self, limit: usize) -> Result<&mut Self, SpecError> {
        if limit == 0 {
            return Err(SpecError::ZeroLimit);
        }
        set_once(&mut self.at_most, limit, READ, "result limit")?;
        Ok(self)
    }

    /// Validate against the table model and seal.
    pub fn freeze(self) -> Result<ReadOp, SpecError> {
        let (table, row) = required(self.target, READ, "row")?;
        let (handles, duplicate) = assign_handles(&self.columns, ReadColumn::default_handle)?;
        let scope = scope(READ, &table, &row, &handles);

        if self.columns.is_empty() {
            return Err(scope.invalid(Reason::NoColumns));
        }
        if let Some(handle) = duplicate {
            return Err(scope.invalid(Reason::DuplicateColumnHandle(handle)));
        }

        let columns = self
            .columns
            .into_iter()
            .zip(handles)
            .map(|((_, column), handle)| column.freeze(handle, &scope))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ReadOp {
            table,
            row,
            columns,
            time_range: self.time_range.unwrap_or_default(),
            at_most: self.at_most,
        })
    }
}

/// Frozen read operation.
#[derive(Clone, Debug)]
pub struct ReadOp {
    table: TableModel,
    row: RowKey,
    columns: Vec<ReadColumnSpec>,
    time_range: LongRange,
    at_most: Option<usize>,
}

impl ReadOp {
    pub fn table(&self) -> &TableModel {
        &self.table
    }

    pub fn row(&self) -> &RowKey {
        &self.row
    }

    pub fn columns(&self) -> &[ReadColumnSpec] {
        &self.columns
    }

    pub fn time_range(&self) -> LongRange {
        self.time_range
    }

    pub fn at_most(&self) -> Option<usize> {
        self.at_most
    }
}

/// Fluid write operation.
#[derive(Clone, Debug, Default)]
pub struct WriteOpSpec {
    target: Option<(TableModel, RowKey)>,
    columns: Vec<(Option<Handle>, WriteColumn)>,
    condition: Option<Condition>,
    delete: Option<()>,
}

impl WriteOpSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row to write.
    pub fn on(
        &mut self,
        table: &TableModel,
        row: impl Into<RowKey>,
    ) -> Result<&mut Self, SpecError> {
        set_once(&mut self.target, (table.clone(), row.into()), WRITE, "row")?;
        Ok(self)
    }

    pub fn with(&mut self, column: WriteColumn) -> Result<&mut Self, SpecError> {
        self.columns.push((None, column));
        Ok(self)
    }

    pub fn with_handle(
        &mut self,
        handle: impl Into<Handle>,
        column: WriteColumn,
    ) -> Result<&mut Self, SpecError> {
        self.columns.push((Some(handle.into()), column));
        Ok(self)
    }

    /// Add one column per item, in order. If `column` fails for any item no
    /// column from this call is kept.
    pub fn with_all_of<I, F, E>(&mut self, items: I, column: F) -> Result<&mut Self, E>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Result<WriteColumn, E>,
    {
        let added = items.into_iter().map(column).collect::<Result<Vec<_>, E>>()?;
        self.columns.extend(added.into_iter().map(|c| (None, c)));
        Ok(self)
    }

    /// Like [`with_all_of`](Self::with_all_of), with `column` also naming
    /// the handle each column is reported under.
    pub fn with_all_of_handled<I, F, H, E>(
        &mut self,
        items: I,
        mut column: F,
    ) -> Result<&mut Self, E>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Result<(H, WriteColumn), E>,
        H: Into<Handle>,
    {
        let added = items
            .into_iter()
            .map(|item| column(item).map(|(handle, c)| (Some(handle.into()), c)))
            .collect::<Result<Vec<_>, E>>()?;
        self.columns.extend(added);
        Ok(self)
    }

    /// Apply the write only if `condition` holds at execution time.
    pub fn given(&mut self, condition: Condition) -> Result<&mut Self, SpecError> {
        set_once(&mut self.condition, condition, WRITE, "condition")?;
        Ok(self)
    }

    /// Delete the whole row instead of writing columns.
    pub fn delete(&mut self) -> Result<&mut Self, SpecError> {
        set_once(&mut self.delete, (), WRITE, "delete")?;
        Ok(self)
    }

    /// Validate against the table model and seal.
    pub fn freeze(self) -> Result<WriteOp, SpecError> {
        let (table, row) = required(self.target, WRITE, "row")?;
        let (handles, duplicate) = assign_handles(&self.columns, WriteColumn::default_handle)?;
        let scope = scope(WRITE, &table, &row, &handles);

        let delete = self.delete.is_some();
        if delete && !self.columns.is_empty() {
            return Err(scope.invalid(Reason::DeleteWithColumns));
        }
        if !delete && self.columns.is_empty() {
            return Err(scope.invalid(Reason::NoColumns));
        }
        if let Some(handle) = duplicate {
            return Err(scope.invalid(Reason::DuplicateColumnHandle(handle)));
        }

        let columns = self
            .columns
            .into_iter()
            .zip(handles)
            .map(|((_, column), handle)| column.freeze(handle, &scope))
            .collect::<Result<Vec<_>, _>>()?;

        let mut cells = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !cells.insert(column.cell_key()) {
                return Err(scope.invalid(Reason::DuplicateColumn(column.handle().to_string())));
            }
        }

        let condition = self
            .condition
            .map(|condition| condition.freeze(&scope))
            .transpose()?;

        Ok(WriteOp {
            table,
            row,
            columns,
            condition,
            delete,
        })
    }
}

/// Frozen write operation.
#[derive(Clone, Debug)]
pub struct WriteOp {
    table: TableModel,
    row: RowKey,
    columns: Vec<WriteColumnSpec>,
    condition: Option<ConditionSpec>,
    delete: bool,
}

impl WriteOp {
    pub fn table(&self) -> &TableModel {
        &self.table
    }

    pub fn row(&self) -> &RowKey {
        &self.row
    }

    /// Empty for a row delete.
    pub fn columns(&self) -> &[WriteColumnSpec] {
        &self.columns
    }

    pub fn condition(&self) -> Option<&ConditionSpec> {
        self.condition.as_ref()
    }

    pub fn is_delete(&self) -> bool {
        self.delete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FamilyModel, QualModel, VersioningModel};

    fn table() -> TableModel {
        TableModel::with("t")
            .family(
                FamilyModel::with("A")
                    .qual(
                        QualModel::with("B")
                            .versioning(VersioningModel::QualifierSequential)
                            .build(),
                    )
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn write(qual: &str, version: i64) -> Result<WriteColumn, SpecError> {
        WriteColumn::new()
            .fam("A")?
            .qual(qual)?
            .value(format!("v{version}"))?
            .version(version)
    }

    #[test]
    fn row_target_is_exactly_once() {
        let table = table();
        let mut read = ReadOpSpec::new();
        read.from(&table, "r").unwrap();
        assert_eq!(
            read.from(&table, "r").unwrap_err(),
            SpecError::AlreadySet {
                target: READ,
                field: "row"
            }
        );

        let mut read = ReadOpSpec::new();
        read.with(ReadColumn::new().fam("A").unwrap()).unwrap();
        assert_eq!(
            read.freeze().unwrap_err(),
            SpecError::Missing {
                target: READ,
                field: "row"
            }
        );
    }

    #[test]
    fn columns_are_at_least_once() {
        let table = table();
        let mut read = ReadOpSpec::new();
        read.from(&table, "r").unwrap();
        assert!(matches!(
            read.freeze(),
            Err(SpecError::Invalid {
                reason: Reason::NoColumns,
                ..
            })
        ));
    }

    #[test]
    fn bulk_declaration_keeps_order() {
        let table = table();
        let mut spec = WriteOpSpec::new();
        spec.on(&table, "r")
            .unwrap()
            .with_all_of(1..=5, |v| write("B", v))
            .unwrap();
        let op = spec.freeze().unwrap();
        let versions: Vec<_> = op.columns().iter().map(|c| c.version()).collect();
        assert_eq!(versions, (1..=5).map(Some).collect::<Vec<_>>());
        assert_eq!(op.columns()[0].handle().as_str(), "A:B@1");
    }

    #[test]
    fn failed_bulk_declaration_adds_nothing() {
        let table = table();
        let mut spec = WriteOpSpec::new();
        spec.on(&table, "r").unwrap();
        let err = spec
            .with_all_of(1..=5, |v| {
                let column = write("B", v)?;
                if v == 3 {
                    column.version(99)
                } else {
                    Ok(column)
                }
            })
            .unwrap_err();
        assert!(matches!(err, SpecError::AlreadySet { .. }));
        assert!(spec.columns.is_empty());

        spec.with(write("B", 1).unwrap()).unwrap();
        assert_eq!(spec.freeze().unwrap().columns().len(), 1);
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let table = table();
        let mut spec = WriteOpSpec::new();
        spec.on(&table, "r")
            .unwrap()
            .with_handle("first", write("B", 1).unwrap())
            .unwrap()
            .with_handle("second", write("B", 1).unwrap())
            .unwrap();
        match spec.freeze().unwrap_err() {
            SpecError::Invalid {
                reason: Reason::DuplicateColumn(column),
                columns,
                ..
            } => {
                assert_eq!(column, "second");
                assert_eq!(columns, vec!["first".to_string(), "second".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn handled_bulk_declaration_names_columns() {
        let table = table();
        let mut read = ReadOpSpec::new();
        read.from(&table, "r")
            .unwrap()
            .with_all_of_handled([1, 2], |v| -> Result<_, SpecError> {
                let filter = LongValueSpec::new().ge(v)?;
                Ok((
                    format!("from-{v}"),
                    ReadColumn::new().fam("A")?.qual("B")?.version_range(filter)?,
                ))
            })
            .unwrap();
        let err = read
            .with_all_of_handled(["ok", "bad"], |name| -> Result<_, SpecError> {
                let column = ReadColumn::new().fam("A")?;
                if name == "bad" {
                    return column.fam("A").map(|c| (name, c));
                }
                Ok((name, column))
            })
            .unwrap_err();
        assert!(matches!(err, SpecError::AlreadySet { .. }));

        let op = read.freeze().unwrap();
        let handles: Vec<_> = op.columns().iter().map(|c| c.handle().as_str()).collect();
        assert_eq!(handles, vec!["from-1", "from-2"]);

        let mut spec = WriteOpSpec::new();
        spec.on(&table, "r")
            .unwrap()
            .with_all_of_handled(1..=2, |v| write("B", v).map(|c| (format!("w{v}"), c)))
            .unwrap();
        let op = spec.freeze().unwrap();
        assert_eq!(op.columns()[1].handle().as_str(), "w2");
    }

    fn aliasing_table() -> TableModel {
        TableModel::with("t")
            .family(
                FamilyModel::with("A")
                    .qual(
                        QualModel::with("q")
                            .versioning(VersioningModel::QualifierLatest)
                            .build(),
                    )
                    .qual(
                        QualModel::with("ts")
                            .versioning(VersioningModel::TimestampChrono)
                            .build(),
                    )
                    .qual(QualModel::of("plain"))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn freeze_pair(
        first: impl FnOnce(WriteColumn) -> Result<WriteColumn, SpecError>,
        second: impl FnOnce(WriteColumn) -> Result<WriteColumn, SpecError>,
        qual: &str,
    ) -> Result<WriteOp, SpecError> {
        let table = aliasing_table();
        let column = || {
            WriteColumn::new()
                .fam("A")
                .and_then(|c| c.qual(qual))
                .and_then(|c| c.value("v"))
        };
        let mut spec = WriteOpSpec::new();
        spec.on(&table, "r")?
            .with(column().and_then(first)?)?
            .with(column().and_then(second)?)?;
        spec.freeze()
    }

    fn is_duplicate_column(result: Result<WriteOp, SpecError>) -> bool {
        matches!(
            result,
            Err(SpecError::Invalid {
                reason: Reason::DuplicateColumn(_),
                ..
            })
        )
    }

    #[test]
    fn version_and_timestamp_aliasing_one_cell_is_rejected() {
        assert!(is_duplicate_column(freeze_pair(
            |c| c.version(5),
            |c| c.ts(5),
            "q"
        )));
        assert!(is_duplicate_column(freeze_pair(
            |c| c.version(5),
            |c| c.ts(5),
            "ts"
        )));
    }

    #[test]
    fn timestamps_do_not_separate_qualifier_versions() {
        assert!(is_duplicate_column(freeze_pair(
            |c| c.version(5)?.ts(1),
            |c| c.version(5)?.ts(2),
            "q"
        )));
    }

    #[test]
    fn distinct_physical_cells_are_accepted() {
        freeze_pair(|c| c.version(5), |c| c.version(6), "q").unwrap();
        freeze_pair(|c| c.version(5), |c| c.ts(6), "ts").unwrap();
        freeze_pair(|c| c.ts(1), |c| c.ts(2), "plain").unwrap();
    }

    #[test]
    fn duplicate_column_handle_is_rejected() {
        let table = table();
        let mut read = ReadOpSpec::new();
        read.from(&table, "r")
            .unwrap()
            .with(ReadColumn::new().fam("A").unwrap())
            .unwrap()
            .with(ReadColumn::new().fam("A").unwrap())
            .unwrap();
        assert!(matches!(
            read.freeze(),
            Err(SpecError::Invalid {
                reason: Reason::DuplicateColumnHandle(_),
                ..
            })
        ));
    }

    #[test]
    fn delete_excludes_columns() {
        let table = table();
        let mut spec = WriteOpSpec::new();
        spec.on(&table, "r").unwrap().delete().unwrap();
        assert!(spec.delete().is_err());
        assert!(spec.clone().freeze().unwrap().is_delete());

        spec.with(write("B", 1).unwrap()).unwrap();
        assert!(matches!(
            spec.freeze(),
            Err(SpecError::Invalid {
                reason: Reason::DeleteWithColumns,
                ..
            })
        ));
    }

    #[test]
    fn limits_and_ranges_are_at_most_once() {
        let table = table();
        let mut read = ReadOpSpec::new();
        read.from(&table, "r").unwrap();
        assert_eq!(read.at_most(0).unwrap_err(), SpecError::ZeroLimit);
        read.at_most(2).unwrap();
        assert!(read.at_most(3).is_err());
        read.at_time(LongValueSpec::new().ge(10).unwrap()).unwrap();
        assert!(read.at_time(LongValueSpec::new()).is_err());
    }

    #[test]
    fn condition_is_frozen_with_the_write() {
        let table = table();
        let mut spec = WriteOpSpec::new();
        spec.on(&table, "r")
            .unwrap()
            .with(write("B", 1).unwrap())
            .unwrap()
            .given(Condition::new().fam("A").unwrap().qual("B").unwrap())
            .unwrap();
        assert!(matches!(
            spec.clone().freeze(),
            Err(SpecError::Missing {
                field: "expectation",
                ..
            })
        ));
        assert!(spec.given(Condition::new()).is_err());
    }
}
