pub mod log_setup;
pub mod scoped_ref;
pub mod shared_fn;

pub use scoped_ref::ScopeRef;
pub use shared_fn::SharedFn;
