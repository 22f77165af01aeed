pub mod backend;
pub mod calendar;
pub mod draft;
pub mod pricing;
pub mod selection;
pub mod slots;
pub mod wizard;
