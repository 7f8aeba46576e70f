pub mod collection;
pub mod request;
pub mod run;

pub use collection::{Collection, CollectionPatch, CollectionSummary, NewCollection};
pub use request::{NewRequest, RequestPatch, RequestScope, SavedRequest};
pub use run::{NewRun, Run};
