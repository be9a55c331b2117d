//! Tree store and flattening helpers for hierarchical editors.
//!
//! This crate is split into two layers:
//! - the canonical nested tree ([`Tree`]) owned by a [`TreeStore`], which
//!   applies mutations and notifies subscribers after each one;
//! - the display projection ([`FlatTree`]), a pre-order list of
//!   [`FlatNode`] rows with levels and expandability.
//!
//! The recommended flow:
//! 1. build a store from parsed [`RawRecord`]s;
//! 2. attach a [`FlatTree`] so it is rebuilt on every notification;
//! 3. render the flat rows and call store mutations from user actions.
//!
//! See `examples/outline.rs` for a complete runnable example.
//!
//! # Quick Example
//!
//! ```
//! use arbor_tree::{FlatTree, NodeId, NodeType, RawRecord, TreeStore};
//!
//! let mut store = TreeStore::new(&[
//!     RawRecord::new("A", None, "root", NodeType::Folder),
//!     RawRecord::new("B", Some("A"), "child", NodeType::Concept),
//! ]);
//! let flat = FlatTree::attach(&mut store);
//!
//! let child = NodeId::from("B");
//! store.insert_item_below(&child, "sibling", NodeType::Concept)?;
//! store.delete_item(&child)?;
//!
//! let names: Vec<String> = flat
//!     .borrow()
//!     .nodes()
//!     .iter()
//!     .map(|row| row.name.clone())
//!     .collect();
//! assert_eq!(names, ["root", "sibling"]);
//! # Ok::<(), arbor_tree::TreeError>(())
//! ```

mod edit;
mod error;
mod flatten;
mod model;
mod notify;
mod options;
pub mod records;
mod store;
mod tree;

pub use edit::NodeDraft;
pub use error::{Result, TreeError};
pub use flatten::{FlatKey, FlatNode, FlatTree};
pub use model::{NodeId, NodeType, TreeNode};
pub use notify::{Snapshot, SubscriptionId};
pub use options::TreeOptions;
pub use records::RawRecord;
pub use store::TreeStore;
pub use tree::{NodeRef, Placement, Preorder, Tree};
