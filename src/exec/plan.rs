//! Translation between frozen operations and store requests.

use std::sync::Arc;

use crate::{
    clock::now_millis,
    codec::{self, CodecError},
    model::{
        CellDeserializer, Datum, FamilyModel, FamilyQualifierPair, LongRange, QualModel,
        TableModel, TableRow, Value, VersioningModel,
    },
    spec::{ConditionSpec, ReadColumnSpec, ReadOp, VersionConstraint, WriteColumnSpec},
    store::{Cell, Check, Get, Put, QualifierSelector},
};

/// Store request for one read column, or `None` when the constraints can
/// match nothing.
pub(crate) fn read_request(
    op: &ReadOp,
    column: &ReadColumnSpec,
) -> Result<Option<Get>, CodecError> {
    let family = column.family();
    let mut get = Get::family(family.name().to_bytes());
    get.time_range = op.time_range();
    get.limit = op.at_most();

    let Some(qual) = column.qual() else {
        if !family.has_timestamp_versions() {
            get.max_versions = Some(1);
        }
        return Ok(Some(get));
    };

    let base = qual.name().as_bytes();
    let model = qual.versioning();
    match model {
        VersioningModel::None => {
            get.qualifiers = QualifierSelector::Exact(qual.name().to_bytes());
            get.max_versions = Some(1);
        }
        VersioningModel::QualifierSequential | VersioningModel::QualifierLatest => {
            get.max_versions = Some(1);
            get.qualifiers = match column.version() {
                VersionConstraint::Any => {
                    let (start, end) = codec::qualifier_span(base);
                    QualifierSelector::Range { start, end }
                }
                VersionConstraint::Exactly(version) => {
                    QualifierSelector::Exact(codec::append_version_to_qual(base, version, model)?)
                }
                VersionConstraint::Within(range) => {
                    let Some((lower, upper)) = range.inclusive(0) else {
                        return Ok(None);
                    };
                    let (start, end) = codec::qualifier_bounds(base, lower, upper, model)?;
                    QualifierSelector::Range { start, end }
                }
            };
        }
        VersioningModel::TimestampChrono | VersioningModel::TimestampLatest => {
            get.qualifiers = QualifierSelector::Exact(qual.name().to_bytes());
            let versions = match column.version() {
                VersionConstraint::Any => None,
                VersionConstraint::Exactly(version) => {
                    let ts = codec::version_indicator(version, model)?;
                    Some(LongRange::exactly(ts))
                }
                VersionConstraint::Within(range) => {
                    let floor = if model.is_inverting() { 0 } else { i64::MIN };
                    let Some((lower, upper)) = range.inclusive(floor) else {
                        return Ok(None);
                    };
                    let (lo, hi) = codec::timestamp_bounds(lower, upper, model)?;
                    Some(LongRange::between(lo, hi))
                }
            };
            if let Some(versions) = versions {
                get.time_range = get.time_range.intersect(&versions);
                if get.time_range.is_empty() {
                    return Ok(None);
                }
            }
        }
    }
    Ok(Some(get))
}

/// Most specific deserializer declared for a cell.
fn deserializer(
    table: &TableModel,
    family: &FamilyModel,
    qual: Option<&QualModel>,
) -> Option<Arc<dyn CellDeserializer>> {
    qual.and_then(QualModel::deserializer)
        .or_else(|| family.deserializer())
        .or_else(|| table.deserializer())
        .cloned()
}

/// Wrap the cells returned for `column` as data, dropping cells that do not
/// belong to it.
pub(crate) fn decode(
    op: &ReadOp,
    column: &ReadColumnSpec,
    cells: Vec<Cell>,
) -> Result<Vec<Datum>, CodecError> {
    let family = column.family();
    let row = TableRow::new(op.table().name().clone(), op.row().clone());
    let mut data = Vec::with_capacity(cells.len());

    for cell in cells {
        let qual = match column.qual() {
            Some(qual) => {
                if qual.versioning().is_qualifier_based()
                    && !codec::is_versioned_form_of(&cell.qualifier, qual.name().as_bytes())
                {
                    continue;
                }
                Some(qual)
            }
            None => family.resolve_physical(&cell.qualifier),
        };
        let model = qual.map(QualModel::versioning).unwrap_or_default();
        let parsed =
            codec::parse_qualifier_separate_version(&cell.qualifier, cell.timestamp, model)?;

        if let (VersionConstraint::Within(range), Some(version)) =
            (column.version(), parsed.version)
        {
            if !range.contains(version) {
                continue;
            }
        }

        data.push(Datum::new(
            Value::from(cell.value),
            cell.timestamp,
            parsed.version,
            row.clone(),
            FamilyQualifierPair::new(family.name().clone(), cell.qualifier),
            deserializer(op.table(), family, qual),
        ));
        if op.at_most().is_some_and(|limit| data.len() >= limit) {
            break;
        }
    }
    Ok(data)
}

/// Physical cell for one write column.
pub(crate) fn put(column: &WriteColumnSpec, now: i64) -> Result<Put, CodecError> {
    let qual = column.qual();
    let model = qual.versioning();
    let version = column.effective_version().unwrap_or(now);
    let base = qual.name().as_bytes();

    let (qualifier, timestamp) = if model.is_qualifier_based() {
        (
            codec::append_version_to_qual(base, version, model)?,
            column.timestamp(),
        )
    } else if model.is_timestamp_based() {
        (
            qual.name().to_bytes(),
            Some(codec::version_indicator(version, model)?),
        )
    } else {
        (qual.name().to_bytes(), column.timestamp())
    };

    Ok(Put {
        family: column.family().name().to_bytes(),
        qualifier,
        timestamp,
        value: column.value().to_bytes(),
    })
}

pub(crate) fn puts(columns: &[WriteColumnSpec]) -> Result<Vec<Put>, CodecError> {
    let now = now_millis();
    columns.iter().map(|column| put(column, now)).collect()
}

/// Store precondition for a write condition.
pub(crate) fn check(condition: &ConditionSpec) -> Result<Check, CodecError> {
    let qual = condition.qual();
    let model = qual.versioning();
    let base = qual.name().as_bytes();

    let (qualifier, timestamp) = match condition.version() {
        Some(version) if model.is_qualifier_based() => {
            (codec::append_version_to_qual(base, version, model)?, None)
        }
        Some(version) if model.is_timestamp_based() => (
            qual.name().to_bytes(),
            Some(codec::version_indicator(version, model)?),
        ),
        _ => (qual.name().to_bytes(), None),
    };

    Ok(Check {
        family: condition.family().name().to_bytes(),
        qualifier,
        timestamp,
        expected: condition.expected().map(Value::to_bytes),
    })
}
