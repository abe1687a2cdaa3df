//! Context-sensitive elements: interned CS objects, pointers, call sites,
//! methods, and the points-to set representation.

mod element;
mod manager;
mod pts;

pub use element::{
    CSCallSite, CSCallSiteId, CSMethod, CSMethodId, CSObj, CSObjId, Pointer, PointerId,
};
pub use manager::CSManager;
pub use pts::PointsToSet;
