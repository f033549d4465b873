//! Render a sequence similarity network as a sweep over alignment-score
//! thresholds, one image per threshold, with a node layout and annotation
//! colors that stay fixed across the whole sequence.

pub mod annotation;
pub mod emit;
pub mod error;
pub mod font;
pub mod graph;
pub mod layout;
pub mod palette;
pub mod render;
pub mod sweep;
pub mod xgmml;

pub use annotation::{AnnotationFormat, AnnotationMap, RawAnnotations, UNANNOTATED};
pub use emit::{emit_sequence, network_stem, FrameNaming};
pub use error::{Error, Result};
pub use graph::{Edge, Graph, GraphBuilder, Node};
pub use layout::{Layout, LayoutConfig};
pub use palette::{ColorRegistry, ColorScheme, UNANNOTATED_COLOR};
pub use render::{RenderOptions, Scene};
pub use sweep::{Frame, Sweep, ThresholdSchedule};
pub use xgmml::{load_xgmml, parse_xgmml};
