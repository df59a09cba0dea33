pub mod question_source;
pub mod quiz_session;
pub mod quiz_session_service;
pub mod session_controller;
