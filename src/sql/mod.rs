//! Text-level SQL composition: identifiers from configuration, values as
//! parameters where the statement shape allows it.

mod bind;
pub mod composer;
pub mod page;
pub mod template;
pub mod where_clause;

pub use bind::BindValue;
pub use composer::{build_insert, build_update, quoted, QueryBuf};
pub use page::{Page, DEFAULT_PAGE_SIZE};
