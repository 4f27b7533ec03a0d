pub mod attempt_runtime;
pub mod attempt_service;
pub mod authoring_service;
pub mod db_helpers;
pub mod notifier;
pub mod question_editor;
pub mod question_generator;
pub mod quiz_service;
pub mod results;
pub mod session_sweeper;
