// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler receives the caller as `Extension<AuthUser>` from the JWT
// middleware and passes the user id into each store call, so rows owned by
// other users are never visible.

pub mod collection;
pub mod request;
pub mod run;

// Re-export handler functions for use in routing
pub use collection::create as collection_create;
pub use collection::delete as collection_delete;
pub use collection::get as collection_get;
pub use collection::list as collection_list;
pub use collection::requests as collection_requests;
pub use collection::update as collection_update;

pub use request::create as request_create;
pub use request::delete as request_delete;
pub use request::duplicate as request_duplicate;
pub use request::get as request_get;
pub use request::list as request_list;
pub use request::update as request_update;

pub use run::clear as run_clear;
pub use run::create as run_create;
pub use run::delete as run_delete;
pub use run::get as run_get;
pub use run::list as run_list;
pub use run::recent as run_recent;
