pub mod infrastructure;
pub mod language_filter;
pub mod live_translate_use_case;
pub mod pipeline_logger;
pub mod pipeline_scheduler;
pub mod result_slot;
pub mod translate_worker;
pub mod translator;
