//! Services that combine several repositories.

pub mod report_service;

pub use report_service::ReportService;
