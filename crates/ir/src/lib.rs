//! # pod-query intermediate representation
//!
//! The value types shared by every other crate in this workspace: the
//! schema model (tables/columns), the condition algebra, aggregate
//! descriptors, the operation IR a builder assembles and a translator or
//! executor consumes, result rows, and the resource-URL conventions that
//! bind a table to a location on a Pod.
//!
//! Nothing in this crate talks to the network; it is pure value types plus
//! the validation that can be done without one (see [`error::IrError`] for
//! what counts as a programmer error here).

pub mod aggregate;
pub mod condition;
pub mod error;
pub mod operation;
pub mod resource;
pub mod row;
pub mod schema;

pub use aggregate::{Aggregate, AggregateFunc};
pub use condition::{
    and, eq, gt, gte, in_array, is_not_null, is_null, like, lt, lte, ne, not, not_in_array, or,
    BinaryOp, Condition, ColumnRef, Literal, LogicalOp, UnaryOp,
};
pub use error::{IrError, IrResult};
pub use operation::{JoinDescriptor, JoinType, Operation, OperationKind, OrderBy, RowValues, SelectField};
pub use resource::{container_url, id_from_subject, resource_url, subject_uri, synthesize_id, PodIdentity};
pub use row::{Row, Value};
pub use schema::{Column, ColumnType, Namespace, Table};
