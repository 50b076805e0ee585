pub mod bounds;
pub mod interp;

pub use bounds::BoundsHelper;
pub use interp::InterpHelper;
