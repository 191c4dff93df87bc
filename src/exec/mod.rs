//! Batch execution against the store.

mod batch;
mod future;
mod plan;
mod result;

use std::{collections::HashMap, sync::Arc};

pub use batch::{FrozenBatch, OpBatch};
pub use future::ExecFuture;
pub use result::{OpResult, OpResultSet, ReadResult, WriteOutcome, WriteResult};

use crate::{
    context::Context,
    model::{Name, RowKey, TableModel},
    observability::{log_debug, log_info, EXEC},
    spec::{Handle, ReadOp, WriteOp},
    store::{Mutation, StoreError, Table},
    Error,
};

/// A frozen operation.
#[derive(Clone, Debug)]
pub(crate) enum Op {
    Read(ReadOp),
    Write(WriteOp),
}

/// Row key as the store sees it.
fn physical_row(context: &Context, table: &TableModel, row: &RowKey) -> bytes::Bytes {
    if table.is_salted() {
        context.salter().salt(row)
    } else {
        row.to_bytes()
    }
}

fn store_error(table: &TableModel, row: &RowKey, columns: Vec<String>, source: StoreError) -> Error {
    Error::Store {
        table: table.name().clone(),
        row: row.clone(),
        columns,
        source,
    }
}

/// Table handles acquired during one batch, keyed by physical name.
struct Tables<'a> {
    context: &'a Context,
    open: HashMap<Name, Arc<dyn Table>>,
}

impl Tables<'_> {
    fn acquire(&mut self, model: &TableModel) -> Result<Arc<dyn Table>, Error> {
        let connector = self.context.connector();
        let name = connector.physical_name(model);
        if let Some(table) = self.open.get(&name) {
            return Ok(table.clone());
        }
        let table = connector.connect(model)?;
        self.open.insert(name, table.clone());
        Ok(table)
    }
}

pub(crate) fn execute(context: &Context, ops: Vec<(Handle, Op)>) -> Result<OpResultSet, Error> {
    log_debug!(
        EXEC, "batch_started",
        ops = ops.len(),
    );
    let mut tables = Tables {
        context,
        open: HashMap::new(),
    };
    let mut results = Vec::with_capacity(ops.len());

    for (handle, op) in ops {
        let result = match &op {
            Op::Read(read) => {
                let table = tables.acquire(read.table())?;
                OpResult::Read(execute_read(context, table.as_ref(), read)?)
            }
            Op::Write(write) => {
                let table = tables.acquire(write.table())?;
                OpResult::Write(execute_write(context, table.as_ref(), &handle, write)?)
            }
        };
        results.push((handle, result));
    }

    log_debug!(
        EXEC, "batch_finished",
        ops = results.len(),
        tables = tables.open.len(),
    );
    Ok(OpResultSet::new(results))
}

fn execute_read(context: &Context, table: &dyn Table, op: &ReadOp) -> Result<ReadResult, Error> {
    let row = physical_row(context, op.table(), op.row());
    let mut columns = Vec::with_capacity(op.columns().len());
    let mut missing = Vec::new();

    for column in op.columns() {
        let data = match plan::read_request(op, column)? {
            Some(get) => {
                let cells = table.get(&row, &get).map_err(|source| {
                    store_error(
                        op.table(),
                        op.row(),
                        vec![column.handle().to_string()],
                        source,
                    )
                })?;
                plan::decode(op, column, cells)?
            }
            None => Vec::new(),
        };
        if data.is_empty() && !column.is_optional() {
            missing.push(column.handle().to_string());
        }
        columns.push((column.handle().clone(), data));
    }

    if !missing.is_empty() {
        return Err(Error::MissingData {
            table: op.table().name().clone(),
            row: op.row().clone(),
            columns: missing,
        });
    }
    Ok(ReadResult::new(columns))
}

fn execute_write(
    context: &Context,
    table: &dyn Table,
    handle: &Handle,
    op: &WriteOp,
) -> Result<WriteResult, Error> {
    let row = physical_row(context, op.table(), op.row());
    let handles: Vec<Handle> = op.columns().iter().map(|c| c.handle().clone()).collect();
    let mutation = if op.is_delete() {
        Mutation::DeleteRow
    } else {
        Mutation::Put(plan::puts(op.columns())?)
    };
    let wrap = |source| {
        store_error(
            op.table(),
            op.row(),
            handles.iter().map(Handle::to_string).collect(),
            source,
        )
    };

    let applied = match op.condition() {
        Some(condition) => {
            let check = plan::check(condition)?;
            table
                .check_and_mutate(&row, &check, &mutation)
                .map_err(wrap)?
        }
        None => {
            table.mutate(&row, &mutation).map_err(wrap)?;
            true
        }
    };

    let outcome = if applied {
        WriteOutcome::Applied
    } else {
        log_info!(
            EXEC, "precondition_failed",
            op = %handle,
            table = %op.table().name(),
            row = %op.row(),
        );
        WriteOutcome::PreconditionFailed
    };
    Ok(WriteResult::new(outcome, handles))
}
