pub mod frame;
pub mod path;
pub mod topology;
