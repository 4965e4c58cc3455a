//! Hierarchical request parameters for vRealize Automation catalog requests.
//!
//! Provisioning requests carry their parameters as a tree: scalar leaves
//! (`{"type": "integer", "value": "2"}`) nested inside named groups of
//! arbitrary depth. [`ParameterTree`] builds that tree from a nested spec
//! document and serializes it two ways:
//!
//! - [`ParameterTree::to_h`]: a plain nested mapping, for inspection and
//!   local use;
//! - [`ParameterTree::to_vra`]: the wire shape the catalog API expects,
//!   where the tree root and every composite level below it are wrapped in
//!   a `"data"` envelope.
//!
//! ```
//! use vra_params::ParameterTree;
//! use serde_json::json;
//!
//! let tree = ParameterTree::from_json_str(
//!     r#"{"machine": {"cpu": {"type": "integer", "value": "2"}}}"#,
//! ).unwrap();
//!
//! assert_eq!(tree.to_h(), json!({"machine": {"cpu": 2}}));
//! assert_eq!(
//!     tree.to_vra(),
//!     json!({"data": {"machine": {"data": {"cpu": 2}}}}),
//! );
//! ```

pub mod errors;
pub mod spec;
pub mod tree;
pub mod tree_traits;
pub mod util;
pub mod value;

pub use errors::{ParameterError, ParameterResult};
pub use spec::ParamSpec;
pub use tree::{ParameterNode, ParameterTree};
pub use tree_traits::TreeNodeConvert;
pub use value::ParameterValue;
