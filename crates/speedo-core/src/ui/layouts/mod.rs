//! Layout helpers that create and place children

pub mod button_group;

pub use button_group::{
    ButtonSpec, ChildSink, GroupLayout, layout_horizontal, layout_vertical, pack_lines,
};
