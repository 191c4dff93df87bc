use std::sync::Arc;

use crate::{
    connect::AcquisitionError, context::Context, exec::OpBatch, model::TableModel, store::Table,
};

/// Entry point for declaring and executing operations.
///
/// Cloning is cheap; clones share one [`Context`].
#[derive(Clone, Debug)]
pub struct Client {
    context: Arc<Context>,
}

impl Client {
    pub fn new(context: Context) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    /// Start an empty batch.
    pub fn begin(&self) -> OpBatch {
        OpBatch::new(self.context.clone())
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Acquire the physical table for `model`, creating it when missing.
    pub fn connect(&self, model: &TableModel) -> Result<Arc<dyn Table>, AcquisitionError> {
        self.context.connector().connect(model)
    }
}

impl From<Context> for Client {
    fn from(context: Context) -> Self {
        Self::new(context)
    }
}
