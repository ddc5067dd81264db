pub mod db;
pub mod engine;
pub mod query;

pub use db::StateDb;
pub use engine::WiringEngine;
pub use query::ModuleQuery;
