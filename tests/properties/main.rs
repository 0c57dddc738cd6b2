//! Property tests entry point.

mod detection_properties;
mod output_safety_properties;
