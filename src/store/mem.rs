//! In-memory storage backend.
//!
//! Cells live in a lock-free skip list ordered by row, family and qualifier
//! ascending, then timestamp descending, so a forward scan from a qualifier
//! yields its newest cell first. Writers serialize on a per-table mutex so
//! that check-and-mutate is atomic; readers never block.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    ops::Bound,
    sync::{Arc, Mutex, RwLock},
};

use bytes::Bytes;
use crossbeam_skiplist::SkipMap;

use super::{Admin, Cell, Check, Get, Mutation, QualifierSelector, StoreError, Table};
use crate::{clock::now_millis, model::Name};

#[derive(Clone, Debug, PartialEq, Eq)]
struct CellKey {
    row: Bytes,
    family: Bytes,
    qualifier: Bytes,
    ts: i64,
}

impl CellKey {
    fn new(row: &[u8], family: &[u8], qualifier: &[u8], ts: i64) -> Self {
        Self {
            row: Bytes::copy_from_slice(row),
            family: Bytes::copy_from_slice(family),
            qualifier: Bytes::copy_from_slice(qualifier),
            ts,
        }
    }

    fn same_family(&self, row: &[u8], family: &[u8]) -> bool {
        self.row.as_ref() == row && self.family.as_ref() == family
    }
}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.family.cmp(&other.family))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
            .then_with(|| other.ts.cmp(&self.ts))
    }
}

/// A table held entirely in memory.
pub struct MemTable {
    name: Name,
    families: HashSet<Bytes>,
    data: SkipMap<CellKey, Bytes>,
    write: Mutex<()>,
}

impl MemTable {
    fn new(name: Name, families: &[Name]) -> Self {
        Self {
            name,
            families: families.iter().map(Name::to_bytes).collect(),
            data: SkipMap::new(),
            write: Mutex::new(()),
        }
    }

    /// Number of stored cells across all rows.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Distinct stored row keys, ascending.
    pub fn rows(&self) -> Vec<Bytes> {
        let mut rows: Vec<Bytes> = Vec::new();
        for entry in self.data.iter() {
            if rows.last() != Some(&entry.key().row) {
                rows.push(entry.key().row.clone());
            }
        }
        rows
    }

    fn check_family(&self, family: &Bytes) -> Result<(), StoreError> {
        if self.families.contains(family) {
            Ok(())
        } else {
            Err(StoreError::FamilyNotFound {
                table: self.name.clone(),
                family: family.clone(),
            })
        }
    }

    fn scan<'a>(
        &'a self,
        row: &'a [u8],
        family: &'a [u8],
        from: &[u8],
    ) -> impl Iterator<Item = Cell> + 'a {
        let lower = CellKey::new(row, family, from, i64::MAX);
        self.data
            .range((Bound::Included(lower), Bound::Unbounded))
            .take_while(move |entry| entry.key().same_family(row, family))
            .map(|entry| Cell {
                family: entry.key().family.clone(),
                qualifier: entry.key().qualifier.clone(),
                timestamp: entry.key().ts,
                value: entry.value().clone(),
            })
    }

    fn apply(&self, row: &[u8], mutation: &Mutation) -> Result<(), StoreError> {
        match mutation {
            Mutation::Put(puts) => {
                for put in puts {
                    self.check_family(&put.family)?;
                }
                let now = now_millis();
                for put in puts {
                    let key = CellKey::new(
                        row,
                        &put.family,
                        &put.qualifier,
                        put.timestamp.unwrap_or(now),
                    );
                    self.data.insert(key, put.value.clone());
                }
            }
            Mutation::DeleteRow => {
                let lower = CellKey::new(row, &[], &[], i64::MAX);
                let doomed: Vec<CellKey> = self
                    .data
                    .range((Bound::Included(lower), Bound::Unbounded))
                    .take_while(|entry| entry.key().row.as_ref() == row)
                    .map(|entry| entry.key().clone())
                    .collect();
                for key in doomed {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn holds(&self, row: &[u8], check: &Check) -> Result<bool, StoreError> {
        self.check_family(&check.family)?;
        let current = self
            .scan(row, &check.family, &check.qualifier)
            .take_while(|cell| cell.qualifier == check.qualifier)
            .find(|cell| check.timestamp.map_or(true, |ts| ts == cell.timestamp));
        Ok(match (&check.expected, current) {
            (None, None) => true,
            (Some(expected), Some(cell)) => *expected == cell.value,
            _ => false,
        })
    }
}

impl Table for MemTable {
    fn name(&self) -> &Name {
        &self.name
    }

    fn get(&self, row: &[u8], get: &Get) -> Result<Vec<Cell>, StoreError> {
        self.check_family(&get.family)?;
        let from = match &get.qualifiers {
            QualifierSelector::All => &[][..],
            QualifierSelector::Exact(qualifier) => &qualifier[..],
            QualifierSelector::Range { start, .. } => &start[..],
        };

        let mut cells = Vec::new();
        let mut current: Option<Bytes> = None;
        let mut versions = 0;
        for cell in self.scan(row, &get.family, from) {
            if !get.qualifiers.matches(&cell.qualifier) {
                if matches!(get.qualifiers, QualifierSelector::All) {
                    continue;
                }
                break;
            }
            if !get.time_range.contains(cell.timestamp) {
                continue;
            }
            if current.as_ref() != Some(&cell.qualifier) {
                current = Some(cell.qualifier.clone());
                versions = 0;
            }
            versions += 1;
            if get.max_versions.is_some_and(|max| versions > max) {
                continue;
            }
            cells.push(cell);
            if get.limit.is_some_and(|limit| cells.len() >= limit) {
                break;
            }
        }
        Ok(cells)
    }

    fn mutate(&self, row: &[u8], mutation: &Mutation) -> Result<(), StoreError> {
        let _guard = self
            .write
            .lock()
            .expect("memtable write mutex should not be poisoned");
        self.apply(row, mutation)
    }

    fn check_and_mutate(
        &self,
        row: &[u8],
        check: &Check,
        mutation: &Mutation,
    ) -> Result<bool, StoreError> {
        let _guard = self
            .write
            .lock()
            .expect("memtable write mutex should not be poisoned");
        if !self.holds(row, check)? {
            return Ok(false);
        }
        self.apply(row, mutation)?;
        Ok(true)
    }
}

/// In-memory [`Admin`] keeping every table in process.
#[derive(Default)]
pub struct MemStore {
    tables: RwLock<HashMap<Name, Arc<MemTable>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct access to a table, bypassing the admin interface.
    pub fn table(&self, name: &Name) -> Option<Arc<MemTable>> {
        self.tables
            .read()
            .expect("memstore table map should not be poisoned")
            .get(name)
            .cloned()
    }

    /// Names of every created table, sorted.
    pub fn table_names(&self) -> Vec<Name> {
        let mut names: Vec<Name> = self
            .tables
            .read()
            .expect("memstore table map should not be poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Admin for MemStore {
    fn table_exists(&self, table: &Name) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .read()
            .expect("memstore table map should not be poisoned")
            .contains_key(table))
    }

    fn create_table(&self, table: &Name, families: &[Name]) -> Result<(), StoreError> {
        let mut tables = self
            .tables
            .write()
            .expect("memstore table map should not be poisoned");
        if tables.contains_key(table) {
            return Err(StoreError::TableExists(table.clone()));
        }
        tables.insert(
            table.clone(),
            Arc::new(MemTable::new(table.clone(), families)),
        );
        Ok(())
    }

    fn open_table(&self, table: &Name) -> Result<Arc<dyn Table>, StoreError> {
        self.table(table)
            .map(|table| table as Arc<dyn Table>)
            .ok_or_else(|| StoreError::TableNotFound(table.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::LongRange, store::Put};

    fn store() -> (MemStore, Arc<dyn Table>) {
        let store = MemStore::new();
        let name = Name::of("t");
        store
            .create_table(&name, &[Name::of("A"), Name::of("Z")])
            .unwrap();
        let table = store.open_table(&name).unwrap();
        (store, table)
    }

    fn put(qualifier: &'static [u8], ts: i64, value: &'static [u8]) -> Put {
        Put {
            family: Bytes::from_static(b"A"),
            qualifier: Bytes::from_static(qualifier),
            timestamp: Some(ts),
            value: Bytes::from_static(value),
        }
    }

    fn values(cells: &[Cell]) -> Vec<&[u8]> {
        cells.iter().map(|cell| cell.value.as_ref()).collect()
    }

    #[test]
    fn create_twice_fails() {
        let (store, _) = store();
        assert!(matches!(
            store.create_table(&Name::of("t"), &[]),
            Err(StoreError::TableExists(_))
        ));
        assert!(matches!(
            store.open_table(&Name::of("missing")),
            Err(StoreError::TableNotFound(_))
        ));
        assert_eq!(store.table_names(), vec![Name::of("t")]);
    }

    #[test]
    fn get_orders_qualifiers_then_newest_first() {
        let (_, table) = store();
        table
            .mutate(
                b"r",
                &Mutation::Put(vec![
                    put(b"b", 1, b"b1"),
                    put(b"a", 1, b"a1"),
                    put(b"a", 3, b"a3"),
                    put(b"b", 2, b"b2"),
                ]),
            )
            .unwrap();
        table
            .mutate(b"other", &Mutation::Put(vec![put(b"a", 9, b"x")]))
            .unwrap();

        let cells = table.get(b"r", &Get::family("A")).unwrap();
        assert_eq!(values(&cells), vec![&b"a3"[..], b"a1", b"b2", b"b1"]);

        let mut get = Get::family("A");
        get.max_versions = Some(1);
        assert_eq!(values(&table.get(b"r", &get).unwrap()), vec![&b"a3"[..], b"b2"]);

        get.limit = Some(1);
        assert_eq!(values(&table.get(b"r", &get).unwrap()), vec![&b"a3"[..]]);
    }

    #[test]
    fn get_honors_selector_and_time_range() {
        let (_, table) = store();
        table
            .mutate(
                b"r",
                &Mutation::Put(vec![
                    put(b"a", 1, b"a1"),
                    put(b"b", 5, b"b5"),
                    put(b"b", 6, b"b6"),
                    put(b"c", 1, b"c1"),
                ]),
            )
            .unwrap();

        let mut get = Get::family("A");
        get.qualifiers = QualifierSelector::Exact(Bytes::from_static(b"b"));
        get.time_range = LongRange::exactly(5);
        assert_eq!(values(&table.get(b"r", &get).unwrap()), vec![&b"b5"[..]]);

        get.qualifiers = QualifierSelector::Range {
            start: Bytes::from_static(b"a"),
            end: Bytes::from_static(b"b"),
        };
        get.time_range = LongRange::all();
        assert_eq!(
            values(&table.get(b"r", &get).unwrap()),
            vec![&b"a1"[..], b"b6", b"b5"]
        );
    }

    #[test]
    fn undeclared_family_is_rejected() {
        let (_, table) = store();
        let mut bad = put(b"q", 1, b"v");
        bad.family = Bytes::from_static(b"nope");
        assert!(matches!(
            table.mutate(b"r", &Mutation::Put(vec![bad])),
            Err(StoreError::FamilyNotFound { .. })
        ));
        assert!(table.get(b"r", &Get::family("nope")).is_err());
    }

    #[test]
    fn delete_row_removes_every_family() {
        let (store, table) = store();
        let mut other = put(b"q", 1, b"z");
        other.family = Bytes::from_static(b"Z");
        table
            .mutate(b"r", &Mutation::Put(vec![put(b"a", 1, b"a1"), other]))
            .unwrap();
        table
            .mutate(b"s", &Mutation::Put(vec![put(b"a", 1, b"keep")]))
            .unwrap();
        table.mutate(b"r", &Mutation::DeleteRow).unwrap();

        let mem = store.table(&Name::of("t")).unwrap();
        assert_eq!(mem.len(), 1);
        assert_eq!(mem.rows(), vec![Bytes::from_static(b"s")]);
    }

    #[test]
    fn check_and_mutate_compares_newest_cell() {
        let (_, table) = store();
        let check = |expected: Option<&'static [u8]>| Check {
            family: Bytes::from_static(b"A"),
            qualifier: Bytes::from_static(b"a"),
            timestamp: None,
            expected: expected.map(Bytes::from_static),
        };
        let write = Mutation::Put(vec![put(b"a", 1, b"first")]);

        assert!(table.check_and_mutate(b"r", &check(None), &write).unwrap());
        assert!(!table.check_and_mutate(b"r", &check(None), &write).unwrap());

        let update = Mutation::Put(vec![put(b"a", 2, b"second")]);
        assert!(!table
            .check_and_mutate(b"r", &check(Some(b"other")), &update)
            .unwrap());
        assert!(table
            .check_and_mutate(b"r", &check(Some(b"first")), &update)
            .unwrap());
        let cells = table.get(b"r", &Get::family("A")).unwrap();
        assert_eq!(cells[0].value, Bytes::from_static(b"second"));
    }

    #[test]
    fn missing_timestamp_uses_wall_clock() {
        let (_, table) = store();
        let before = now_millis();
        let mut cell = put(b"a", 0, b"v");
        cell.timestamp = None;
        table.mutate(b"r", &Mutation::Put(vec![cell])).unwrap();
        let cells = table.get(b"r", &Get::family("A")).unwrap();
        assert!(cells[0].timestamp >= before);
    }
}
