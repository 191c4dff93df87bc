use std::{collections::HashSet, sync::Arc};

use super::{execute, ExecFuture, Op, OpResultSet};
use crate::{
    context::Context,
    executor::Executor,
    spec::{Handle, ReadOpSpec, SpecError, WriteOpSpec},
    Error,
};

enum Slot {
    Read(usize),
    Write(usize),
}

/// Operations being declared for one round of execution.
///
/// Each operation is registered under a handle unique within the batch and
/// filled in through the returned builder. Executing consumes the batch.
pub struct OpBatch {
    context: Arc<Context>,
    handles: HashSet<Handle>,
    order: Vec<(Handle, Slot)>,
    reads: Vec<ReadOpSpec>,
    writes: Vec<WriteOpSpec>,
}

impl OpBatch {
    pub(crate) fn new(context: Arc<Context>) -> Self {
        Self {
            context,
            handles: HashSet::new(),
            order: Vec::new(),
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    fn claim(&mut self, handle: Handle) -> Result<Handle, SpecError> {
        if !self.handles.insert(handle.clone()) {
            return Err(SpecError::DuplicateHandle(handle));
        }
        Ok(handle)
    }

    /// Declare a read under `handle`.
    pub fn read(&mut self, handle: impl Into<Handle>) -> Result<&mut ReadOpSpec, SpecError> {
        let handle = self.claim(handle.into())?;
        let idx = self.reads.len();
        self.reads.push(ReadOpSpec::new());
        self.order.push((handle, Slot::Read(idx)));
        Ok(&mut self.reads[idx])
    }

    /// Declare a write under `handle`.
    pub fn write(&mut self, handle: impl Into<Handle>) -> Result<&mut WriteOpSpec, SpecError> {
        let handle = self.claim(handle.into())?;
        let idx = self.writes.len();
        self.writes.push(WriteOpSpec::new());
        self.order.push((handle, Slot::Write(idx)));
        Ok(&mut self.writes[idx])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Validate and seal every operation.
    pub fn freeze(mut self) -> Result<FrozenBatch, SpecError> {
        let mut ops = Vec::with_capacity(self.order.len());
        for (handle, slot) in self.order {
            let op = match slot {
                Slot::Read(idx) => Op::Read(std::mem::take(&mut self.reads[idx]).freeze()?),
                Slot::Write(idx) => Op::Write(std::mem::take(&mut self.writes[idx]).freeze()?),
            };
            ops.push((handle, op));
        }
        Ok(FrozenBatch {
            context: self.context,
            ops,
        })
    }

    /// Freeze and execute on the calling thread.
    pub fn exec(self) -> Result<OpResultSet, Error> {
        self.freeze()?.exec()
    }

    /// Freeze and execute on `executor`'s blocking pool.
    pub fn exec_async<E: Executor>(
        self,
        executor: &E,
    ) -> ExecFuture<E::JoinHandle<Result<OpResultSet, Error>>> {
        ExecFuture::new(executor.spawn_blocking(move || self.exec()))
    }
}

/// Validated operations ready to run.
pub struct FrozenBatch {
    context: Arc<Context>,
    ops: Vec<(Handle, Op)>,
}

impl FrozenBatch {
    pub fn exec(self) -> Result<OpResultSet, Error> {
        execute(&self.context, self.ops)
    }

    pub fn exec_async<E: Executor>(
        self,
        executor: &E,
    ) -> ExecFuture<E::JoinHandle<Result<OpResultSet, Error>>> {
        ExecFuture::new(executor.spawn_blocking(move || self.exec()))
    }
}
