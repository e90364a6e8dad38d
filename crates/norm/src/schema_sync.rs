//! Executes schema reconciliation against a live connection.

use norm_core::reconcile::{self, LiveColumn};
use norm_core::{EntityDescriptor, SqlBuilder, SqlPayload};
use tracing::info;

use crate::connection::Connection;
use crate::error::Result;

/// Creates the collection if needed, then aligns its columns with the
/// descriptor. Returns the alterations executed, in order.
pub(crate) fn reconcile(
    connection: &Connection,
    descriptor: &EntityDescriptor,
) -> Result<Vec<SqlPayload>> {
    let builder = SqlBuilder::new(connection.dialect());
    let table = descriptor.table_name();

    connection.execute_non_query(&builder.create_collection(descriptor)?)?;

    let rows = connection.query(&builder.table_info(descriptor)?)?;
    let live = LiveColumn::from_rows(&rows);
    let plan = reconcile::plan(&builder, descriptor, &live)?;

    for statement in &plan {
        info!(table, sql = %statement, "Altering collection");
        connection.execute_non_query(statement)?;
    }

    info!(
        table,
        dialect = %connection.dialect(),
        alterations = plan.len(),
        "Collection reconciled"
    );
    Ok(plan)
}
