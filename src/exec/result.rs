use std::collections::HashMap;

use crate::{model::Datum, spec::Handle};

/// Outcome of every operation in an executed batch, in declaration order.
#[derive(Debug, Default)]
pub struct OpResultSet {
    results: Vec<(Handle, OpResult)>,
    index: HashMap<Handle, usize>,
}

impl OpResultSet {
    pub(crate) fn new(results: Vec<(Handle, OpResult)>) -> Self {
        let index = results
            .iter()
            .enumerate()
            .map(|(idx, (handle, _))| (handle.clone(), idx))
            .collect();
        Self { results, index }
    }

    /// Results keyed by operation handle, in declaration order.
    pub fn results_by_handle(&self) -> impl Iterator<Item = (&Handle, &OpResult)> {
        self.results.iter().map(|(handle, result)| (handle, result))
    }

    pub fn get(&self, handle: &str) -> Option<&OpResult> {
        self.index.get(handle).map(|&idx| &self.results[idx].1)
    }

    /// Result of the read declared under `handle`.
    pub fn read_result(&self, handle: &str) -> Option<&ReadResult> {
        match self.get(handle)? {
            OpResult::Read(read) => Some(read),
            OpResult::Write(_) => None,
        }
    }

    /// Result of the write declared under `handle`.
    pub fn write_result(&self, handle: &str) -> Option<&WriteResult> {
        match self.get(handle)? {
            OpResult::Write(write) => Some(write),
            OpResult::Read(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Debug)]
pub enum OpResult {
    Read(ReadResult),
    Write(WriteResult),
}

/// Data returned by one read, grouped by column handle.
#[derive(Debug, Default)]
pub struct ReadResult {
    columns: Vec<(Handle, Vec<Datum>)>,
}

impl ReadResult {
    pub(crate) fn new(columns: Vec<(Handle, Vec<Datum>)>) -> Self {
        Self { columns }
    }

    /// Data of the column declared under `handle`, in store order.
    pub fn data(&self, handle: &str) -> Option<&[Datum]> {
        self.columns
            .iter()
            .find(|(column, _)| column.as_str() == handle)
            .map(|(_, data)| data.as_slice())
    }

    /// Every column with its data, in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = (&Handle, &[Datum])> {
        self.columns
            .iter()
            .map(|(handle, data)| (handle, data.as_slice()))
    }

    /// All data across columns.
    pub fn all(&self) -> impl Iterator<Item = &Datum> {
        self.columns.iter().flat_map(|(_, data)| data.iter())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// The write's condition did not hold; nothing was written.
    PreconditionFailed,
}

/// Outcome of one write, shared by all of its columns.
#[derive(Debug)]
pub struct WriteResult {
    outcome: WriteOutcome,
    columns: Vec<Handle>,
}

impl WriteResult {
    pub(crate) fn new(outcome: WriteOutcome, columns: Vec<Handle>) -> Self {
        Self { outcome, columns }
    }

    pub fn outcome(&self) -> WriteOutcome {
        self.outcome
    }

    pub fn is_applied(&self) -> bool {
        self.outcome == WriteOutcome::Applied
    }

    /// Outcome for the column declared under `handle`.
    pub fn column(&self, handle: &str) -> Option<WriteOutcome> {
        self.columns
            .iter()
            .any(|column| column.as_str() == handle)
            .then_some(self.outcome)
    }

    pub fn columns(&self) -> &[Handle] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_handle_respects_kind() {
        let set = OpResultSet::new(vec![
            (
                Handle::from("w"),
                OpResult::Write(WriteResult::new(
                    WriteOutcome::PreconditionFailed,
                    vec![Handle::from("A:B"), Handle::from("A:C")],
                )),
            ),
            (
                Handle::from("r"),
                OpResult::Read(ReadResult::new(vec![(Handle::from("A:B"), Vec::new())])),
            ),
        ]);

        let handles: Vec<_> = set.results_by_handle().map(|(h, _)| h.as_str()).collect();
        assert_eq!(handles, vec!["w", "r"]);
        assert!(set.read_result("w").is_none());
        assert_eq!(
            set.write_result("w").unwrap().column("A:C"),
            Some(WriteOutcome::PreconditionFailed)
        );
        assert_eq!(set.write_result("w").unwrap().column("A:Z"), None);
        assert_eq!(set.read_result("r").unwrap().data("A:B").map(<[_]>::len), Some(0));
        assert!(set.get("missing").is_none());
    }
}
