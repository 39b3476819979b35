//! 工具模块

pub mod periodic;

pub use periodic::PeriodicTask;
