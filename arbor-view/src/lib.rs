//! Interaction state for trees held by an [`arbor_tree::TreeStore`].
//!
//! This crate stays UI-agnostic and only tracks state a tree widget needs:
//! - [`ExpansionSet`] keeps which rows are expanded and computes visible rows;
//! - [`DragController`] turns pointer drag gestures into store moves;
//! - [`ChecklistSelection`] tracks checked rows with descendant propagation.
//!
//! # Quick Example
//!
//! ```
//! use std::time::Instant;
//!
//! use arbor_tree::{FlatTree, NodeId, NodeType, RawRecord, TreeStore};
//! use arbor_view::{DragController, ExpansionSet};
//!
//! let mut store = TreeStore::new(&[
//!     RawRecord::new("A", None, "inbox", NodeType::Folder),
//!     RawRecord::new("B", None, "task", NodeType::Function),
//! ]);
//! let flat = FlatTree::attach(&mut store);
//! let mut expansion = ExpansionSet::new();
//! let mut drag = DragController::default();
//!
//! let source = flat.borrow().by_node(&NodeId::from("B")).cloned().unwrap();
//! let target = flat.borrow().by_node(&NodeId::from("A")).cloned().unwrap();
//! drag.start(&source, &mut expansion);
//! drag.hover(&target, 10.0, 20.0, Instant::now(), &mut expansion);
//! drag.drop_on(&target, &mut store, &mut expansion)?;
//!
//! assert_eq!(flat.borrow().by_node(&source.id).map(|row| row.level), Some(1));
//! # Ok::<(), arbor_tree::TreeError>(())
//! ```

mod checklist;
mod drag;
mod expansion;

pub use checklist::ChecklistSelection;
pub use drag::{DragController, DragOptions, DropZone, MoveStrategy, RowHint};
pub use expansion::{ExpansionSet, ExpansionView, expand_descendants};
