// Application layer - Timeline engine and its long-running service
pub mod axis;
pub mod demo_generator;
pub mod polarity_segmenter;
pub mod reading_source;
pub mod sample_buffer;
pub mod source_resolver;
pub mod timeline_service;
pub mod view_controller;
pub mod window_aggregator;
