//! Hash-consed syntax elements: the content-addressed store (component E),
//! the push-down builder that fills it (component F), and the functional
//! tree editor that rewrites already-built trees (component G).

mod builder;
mod editor;
mod element;
mod kind;
mod rooted;

pub use builder::{Builder, Checkpoint};
pub use editor::{root, swap, swap_child};
pub use element::{Element, ElementCache};
pub use kind::SyntaxKind;
pub use rooted::RootedElement;
