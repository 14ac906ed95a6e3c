pub mod color;
pub mod dataset;
pub mod geom;
pub mod layout;
pub mod merge;
pub mod model;
pub mod report;
pub mod sari;
pub mod store;
pub mod week;
