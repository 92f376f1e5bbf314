// ==========================================
// 集成测试共享辅助模块
// ==========================================

#![allow(dead_code)]

pub mod mock_config;
pub mod travel_builder;

pub use mock_config::MockConfig;
pub use travel_builder::TravelBuilder;
